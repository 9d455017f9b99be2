use alloy_primitives::Address;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use deployments::{
    DeploymentEnv,
    DeploymentStore,
    LOCAL_CHAIN_ID,
    SEPOLIA_CHAIN_ID,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
    time::Duration,
};
use typing_stats_connector::{
    ChainId,
    ConnectorConfig,
    ModalConfig,
    NetworkIdentity,
    WalletDescriptor,
    config::parse_contract_address,
};

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_FRAME_URL: &str = "http://127.0.0.1:1248";
/// Stand-in wallet-connect project id. Only the Sepolia RPC template uses it, so local
/// chains work without a registered project.
pub const DEFAULT_PROJECT_ID: &str = "typing-stats-local";

/// Everything the connector needs, resolved from flags, environment and the deployment
/// store.
#[derive(Clone, Debug)]
pub struct Settings {
    pub contract_address: Address,
    pub project_id: String,
    pub network: NetworkIdentity,
    pub wallets: Vec<WalletDescriptor>,
    pub poll_interval: Duration,
}

impl Settings {
    pub fn connector_config(&self) -> Result<ConnectorConfig> {
        let modal = ModalConfig::new(
            self.project_id.clone(),
            self.network.clone(),
            self.wallets.clone(),
        )?;
        Ok(ConnectorConfig::new(self.contract_address, modal)
            .with_poll_interval(self.poll_interval))
    }
}

/// Environment whose deployment records hold the contract for `chain_id`.
pub fn deployment_env(chain_id: ChainId) -> DeploymentEnv {
    match chain_id.get() {
        SEPOLIA_CHAIN_ID => DeploymentEnv::Sepolia,
        _ => DeploymentEnv::Local,
    }
}

pub fn network_for(chain_id: ChainId, rpc_url: Option<&str>) -> NetworkIdentity {
    NetworkIdentity::for_chain(chain_id, rpc_url.unwrap_or(DEFAULT_LOCAL_RPC_URL))
}

pub fn default_chain_id() -> ChainId {
    ChainId::new(SEPOLIA_CHAIN_ID)
}

pub fn local_chain_id() -> ChainId {
    ChainId::new(LOCAL_CHAIN_ID)
}

/// Opens the deployment store for `chain_id`, laying out every environment's directory
/// first.
pub fn deployment_store(deployments_root: &Path, chain_id: ChainId) -> Result<DeploymentStore> {
    deployments::ensure_structure(deployments_root)
        .map_err(|e| eyre!(e))
        .wrap_err("Failed to prepare deployments directory")?;
    DeploymentStore::with_root(deployments_root, deployment_env(chain_id))
        .map_err(|e| eyre!(e))
        .wrap_err("Failed to open deployment store")
}

/// Uses the configured address when there is one, otherwise the recorded deployment for
/// the chain.
pub fn resolve_contract_address(
    configured: Option<&str>,
    deployments_root: &Path,
    chain_id: ChainId,
) -> Result<Address> {
    if let Some(raw) = configured {
        return Ok(parse_contract_address(raw)?);
    }
    let env = deployment_env(chain_id);
    let store = deployment_store(deployments_root, chain_id)?;
    let record = store
        .load()
        .map_err(|e| eyre!(e))?
        .ok_or_else(|| {
            eyre!(
                "No contract address configured and no {env} deployment recorded in {}",
                store.path().display()
            )
        })?;
    if !record.is_on_chain(chain_id.get()) {
        return Err(eyre!(
            "Recorded {env} deployment is on chain {}, not {chain_id}",
            record.chain_id
        ));
    }
    Ok(parse_contract_address(&record.contract_address)?)
}

/// Parses `name=url` or a bare `url` (named after its position).
pub fn parse_wallet(raw: &str, position: usize) -> Result<WalletDescriptor> {
    let raw = raw.trim();
    let (name, endpoint) = match raw.split_once('=') {
        Some((name, endpoint)) if !name.contains("://") => {
            (name.trim().to_string(), endpoint.trim())
        }
        _ => (format!("wallet-{}", position + 1), raw),
    };
    if name.is_empty() || endpoint.is_empty() {
        return Err(eyre!("Invalid wallet '{raw}', expected name=url"));
    }
    Ok(WalletDescriptor::new(name, endpoint))
}

pub fn parse_wallets(raw: &[String]) -> Result<Vec<WalletDescriptor>> {
    if raw.is_empty() {
        return Ok(vec![
            WalletDescriptor::new("frame", DEFAULT_FRAME_URL),
            WalletDescriptor::new("local", DEFAULT_LOCAL_RPC_URL),
        ]);
    }
    raw.iter()
        .enumerate()
        .map(|(position, wallet)| parse_wallet(wallet, position))
        .collect()
}

pub fn parse_chain_id(raw: &str) -> Result<ChainId> {
    ChainId::from_str(raw).map_err(|e| eyre!("Invalid chain id '{raw}': {e}"))
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use deployments::DeploymentRecord;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    #[test]
    fn resolve_contract_address__configured__skips_store() {
        let root = tempfile::tempdir().unwrap();

        let address =
            resolve_contract_address(Some(CONTRACT), root.path(), local_chain_id())
                .unwrap();

        assert_eq!(CONTRACT, address.to_checksum(None));
        assert!(!root.path().join("local").exists());
    }

    #[test]
    fn resolve_contract_address__recorded_deployment__uses_record() {
        // given
        let root = tempfile::tempdir().unwrap();
        let store = DeploymentStore::with_root(root.path(), DeploymentEnv::Local).unwrap();
        store
            .save(&DeploymentRecord::new(CONTRACT, LOCAL_CHAIN_ID, DEFAULT_LOCAL_RPC_URL))
            .unwrap();

        // when
        let address =
            resolve_contract_address(None, root.path(), local_chain_id()).unwrap();

        // then
        assert_eq!(CONTRACT, address.to_checksum(None));
    }

    #[test]
    fn resolve_contract_address__nothing_recorded__errors() {
        let root = tempfile::tempdir().unwrap();

        let result = resolve_contract_address(None, root.path(), default_chain_id());

        assert!(result.is_err());
    }

    #[test]
    fn deployment_store__fresh_root__lays_out_every_environment() {
        let root = tempfile::tempdir().unwrap();

        let store = deployment_store(root.path(), local_chain_id()).unwrap();

        assert!(store.path().ends_with("local/deployments.json"));
        assert!(root.path().join("sepolia/deployments.json").exists());
    }

    #[test]
    fn connector_config__default_project_and_wallets__is_accepted() {
        // given
        let settings = Settings {
            contract_address: parse_contract_address(CONTRACT).unwrap(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            network: network_for(local_chain_id(), None),
            wallets: parse_wallets(&[]).unwrap(),
            poll_interval: Duration::from_millis(500),
        };

        // when
        let config = settings.connector_config().unwrap();

        // then
        assert_eq!(DEFAULT_PROJECT_ID, config.modal.project_id());
        assert_eq!(2, config.modal.wallets().len());
    }

    #[test]
    fn parse_wallets__named_and_bare__keeps_order() {
        let wallets = parse_wallets(&[
            "frame=http://127.0.0.1:1248".to_string(),
            "http://127.0.0.1:8545".to_string(),
        ])
        .unwrap();

        assert_eq!(
            vec![
                WalletDescriptor::new("frame", "http://127.0.0.1:1248"),
                WalletDescriptor::new("wallet-2", "http://127.0.0.1:8545"),
            ],
            wallets
        );
    }

    #[test]
    fn parse_wallet__missing_endpoint__errors() {
        assert!(parse_wallet("frame=", 0).is_err());
    }

    #[test]
    fn network_for__sepolia__keeps_canonical_descriptor() {
        assert_eq!(NetworkIdentity::SEPOLIA, network_for(default_chain_id(), None));
        assert_eq!(
            DEFAULT_LOCAL_RPC_URL,
            network_for(local_chain_id(), None).rpc_url("ignored")
        );
    }
}
