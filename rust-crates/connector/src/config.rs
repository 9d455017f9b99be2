use crate::{
    error::{
        Error,
        Result,
    },
    modal::ModalConfig,
    network::NetworkIdentity,
};
use alloy_primitives::Address;
use std::{
    str::FromStr,
    sync::Arc,
    time::Duration,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct ConnectorConfig {
    pub contract_address: Address,
    pub modal: Arc<ModalConfig>,
    /// Interval for receipt polling while waiting on confirmations.
    pub poll_interval: Duration,
}

impl ConnectorConfig {
    pub fn new(contract_address: Address, modal: ModalConfig) -> Self {
        Self {
            contract_address,
            modal: Arc::new(modal),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn target(&self) -> &NetworkIdentity {
        self.modal.chain()
    }
}

/// Parses a configured contract address, rejecting the zero address that stands in for
/// "not deployed yet".
pub fn parse_contract_address(raw: &str) -> Result<Address> {
    let address = Address::from_str(raw.trim())
        .map_err(|e| Error::decode("contract address", format!("'{raw}': {e}")))?;
    if address.is_zero() {
        return Err(Error::decode(
            "contract address",
            "the zero address is not a deployed contract",
        ));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn parse_contract_address__checksummed_hex__parses() {
        let address =
            parse_contract_address(" 0x5FbDB2315678afecb367f032d93F642f64180aa3 ").unwrap();

        assert_eq!(
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            address.to_checksum(None)
        );
    }

    #[test]
    fn parse_contract_address__placeholder__errors() {
        assert!(parse_contract_address("your_deployed_contract_address").is_err());
        assert!(
            parse_contract_address("0x0000000000000000000000000000000000000000").is_err()
        );
    }
}
