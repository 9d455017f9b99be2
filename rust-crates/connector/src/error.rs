use crate::{
    bridge::RpcError,
    network::ChainId,
};
use alloy_primitives::B256;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a connector operation can fail.
///
/// The public leaderboard operations collapse these into `false` or an empty list; the
/// `try_*` variants on [`crate::ConnectionManager`] hand them out unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("wallet modal initialization failed: {0}")]
    Initialization(String),
    #[error("no wallet bridge is available")]
    NoWalletBridge,
    #[error("no wallet session is established")]
    NotConnected,
    #[error("wallet did not expose any account")]
    NoAccounts,
    #[error("wallet is on chain {actual} but chain {expected} is required: {reason}")]
    NetworkMismatch {
        expected: ChainId,
        actual: ChainId,
        reason: RpcError,
    },
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("wallet transport failed: {0}")]
    Transport(String),
    #[error("failed to decode {context}: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },
    #[error("transaction {0} reverted")]
    TransactionReverted(B256),
    #[error("invalid score: {0}")]
    InvalidScore(String),
}

impl Error {
    pub fn decode(context: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Decode {
            context,
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
