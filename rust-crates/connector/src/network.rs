use crate::error::{
    Error,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    borrow::Cow,
    fmt,
    str::FromStr,
};

/// Placeholder substituted with the wallet-connect project id in RPC templates.
pub const PROJECT_ID_PLACEHOLDER: &str = "{project_id}";

/// EIP-155 chain id. Travels over JSON-RPC as a `0x`-prefixed hex quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(u64);

impl ChainId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|e| Error::decode("chain id", format!("'{raw}': {e}")))
    }
}

impl TryFrom<String> for ChainId {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> Self {
        chain_id.to_hex()
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: Cow<'static, str>,
    pub symbol: Cow<'static, str>,
    pub decimals: u8,
}

/// The chain every leaderboard operation has to run against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub chain_id: ChainId,
    pub name: Cow<'static, str>,
    pub native_currency: NativeCurrency,
    pub rpc_url_template: Cow<'static, str>,
    pub explorer_url: Option<Cow<'static, str>>,
}

impl NetworkIdentity {
    pub const SEPOLIA: NetworkIdentity = NetworkIdentity {
        chain_id: ChainId::new(11_155_111),
        name: Cow::Borrowed("Sepolia"),
        native_currency: NativeCurrency {
            name: Cow::Borrowed("Sepolia Ether"),
            symbol: Cow::Borrowed("ETH"),
            decimals: 18,
        },
        rpc_url_template: Cow::Borrowed(
            "https://rpc.walletconnect.com/v1/?chainId=eip155:11155111&projectId={project_id}",
        ),
        explorer_url: Some(Cow::Borrowed("https://sepolia.etherscan.io")),
    };

    /// A development chain such as anvil or hardhat, reachable at `rpc_url`.
    pub fn local(chain_id: ChainId, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: Cow::Owned(format!("Local {chain_id}")),
            native_currency: NativeCurrency {
                name: Cow::Borrowed("Ether"),
                symbol: Cow::Borrowed("ETH"),
                decimals: 18,
            },
            rpc_url_template: Cow::Owned(rpc_url.into()),
            explorer_url: None,
        }
    }

    /// Resolves a configured chain id: Sepolia keeps its canonical descriptor, anything
    /// else is treated as a local chain served by `rpc_url`.
    pub fn for_chain(chain_id: ChainId, rpc_url: impl Into<String>) -> Self {
        if Self::SEPOLIA.matches(chain_id) {
            Self::SEPOLIA
        } else {
            Self::local(chain_id, rpc_url)
        }
    }

    pub fn matches(&self, chain_id: ChainId) -> bool {
        self.chain_id == chain_id
    }

    pub fn rpc_url(&self, project_id: &str) -> String {
        self.rpc_url_template.replace(PROJECT_ID_PLACEHOLDER, project_id)
    }

    /// The `wallet_addEthereumChain` descriptor (EIP-3085) for this network.
    pub fn add_chain_parameters(&self, project_id: &str) -> AddChainParameters {
        AddChainParameters {
            chain_id: self.chain_id,
            chain_name: self.name.to_string(),
            native_currency: self.native_currency.clone(),
            rpc_urls: vec![self.rpc_url(project_id)],
            block_explorer_urls: self
                .explorer_url
                .iter()
                .map(|url| url.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameters {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainParameters {
    pub chain_id: ChainId,
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use serde_json::json;

    #[test]
    fn from_str__hex_and_decimal__parse_to_same_chain() {
        let hex: ChainId = "0xaa36a7".parse().unwrap();
        let decimal: ChainId = "11155111".parse().unwrap();

        assert_eq!(hex, decimal);
        assert_eq!(NetworkIdentity::SEPOLIA.chain_id, hex);
    }

    #[test]
    fn from_str__garbage__errors() {
        let result = "0xnope".parse::<ChainId>();

        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn serialize__chain_id__is_hex_string() {
        let value = serde_json::to_value(ChainId::new(31_337)).unwrap();

        assert_eq!(json!("0x7a69"), value);
    }

    #[test]
    fn add_chain_parameters__sepolia__matches_eip3085_shape() {
        // given
        let network = NetworkIdentity::SEPOLIA;

        // when
        let params = serde_json::to_value(network.add_chain_parameters("abc123")).unwrap();

        // then
        let expected = json!({
            "chainId": "0xaa36a7",
            "chainName": "Sepolia",
            "nativeCurrency": { "name": "Sepolia Ether", "symbol": "ETH", "decimals": 18 },
            "rpcUrls": ["https://rpc.walletconnect.com/v1/?chainId=eip155:11155111&projectId=abc123"],
            "blockExplorerUrls": ["https://sepolia.etherscan.io"],
        });
        assert_eq!(expected, params);
    }

    #[test]
    fn for_chain__non_sepolia__uses_local_descriptor() {
        let network = NetworkIdentity::for_chain(ChainId::new(31_337), "http://127.0.0.1:8545");

        assert_eq!("http://127.0.0.1:8545", network.rpc_url("ignored"));
        assert!(network.explorer_url.is_none());
        assert!(network.add_chain_parameters("x").block_explorer_urls.is_empty());
    }
}
