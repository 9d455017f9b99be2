//! Wallet connection and leaderboard access for the `TypingStats` contract.
//!
//! [`ConnectionManager`] owns the wallet session: it configures the wallet modal once,
//! opens wallet sessions on demand, keeps the wallet on the required chain and exposes
//! the two leaderboard operations, reading high scores and submitting a score.

pub mod bridge;
pub mod config;
pub mod contract;
pub mod error;
pub mod manager;
pub mod modal;
pub mod network;
pub mod provider;
pub mod scores;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use bridge::{
    RpcError,
    WalletBridge,
    WalletEvent,
    json_rpc::JsonRpcBridge,
};
pub use config::ConnectorConfig;
pub use error::{
    Error,
    Result,
};
pub use manager::{
    ConnectionManager,
    EventSubscription,
    NetworkStatus,
};
pub use modal::{
    ModalConfig,
    WalletDescriptor,
    WalletModal,
};
pub use network::{
    ChainId,
    NetworkIdentity,
};
pub use scores::{
    ScoreRecord,
    ScoreSubmission,
};
pub use session::Session;
