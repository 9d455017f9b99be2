use crate::{
    error::Result,
    network::ChainId,
};
use alloy_primitives::Address;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod json_rpc;

/// The wallet's EIP-1193 surface: account access, signing and network requests all go
/// through [`WalletBridge::request`].
pub trait WalletBridge: Send + Sync + 'static {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Notifications the wallet raises on its own, e.g. when the user switches account.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    ChainChanged(ChainId),
    AccountsChanged(Vec<Address>),
}

/// Error object returned by the wallet for a rejected request.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("wallet request failed with code {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }
}
