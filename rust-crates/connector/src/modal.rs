use crate::{
    bridge::WalletBridge,
    error::{
        Error,
        Result,
    },
    network::NetworkIdentity,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

/// A wallet the user can pick in the connection modal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDescriptor {
    pub name: String,
    pub endpoint: String,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Configuration of the wallet-connection modal. Built once at startup and shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalConfig {
    project_id: String,
    chain: NetworkIdentity,
    wallets: Vec<WalletDescriptor>,
}

impl ModalConfig {
    pub fn new(
        project_id: impl Into<String>,
        chain: NetworkIdentity,
        wallets: Vec<WalletDescriptor>,
    ) -> Result<Self> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(Error::Initialization(
                "wallet-connect project id must not be empty".to_string(),
            ));
        }
        if wallets.is_empty() {
            return Err(Error::Initialization(
                "at least one wallet must be configured".to_string(),
            ));
        }
        Ok(Self {
            project_id,
            chain,
            wallets,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn chain(&self) -> &NetworkIdentity {
        &self.chain
    }

    pub fn wallets(&self) -> &[WalletDescriptor] {
        &self.wallets
    }

    pub fn find_wallet(&self, name: &str) -> Option<&WalletDescriptor> {
        self.wallets.iter().find(|wallet| wallet.name == name)
    }
}

/// The wallet-selection surface the connection manager drives.
pub trait WalletModal: Send + Sync + 'static {
    type Bridge: WalletBridge;

    /// One-time setup from the modal configuration.
    fn configure(&self, config: &ModalConfig) -> impl Future<Output = Result<()>> + Send;

    /// Shows the wallet picker and resolves once the user has picked a wallet or
    /// dismissed the picker.
    fn open(&self, config: &ModalConfig) -> impl Future<Output = Result<()>> + Send;

    /// The wallet bridge, if one is present.
    fn bridge(&self) -> Option<Arc<Self::Bridge>>;
}
