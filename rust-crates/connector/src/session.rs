use crate::{
    contract::ScoreContract,
    provider::{
        Provider,
        Signer,
    },
};
use std::sync::Arc;

/// Handles bound to an authenticated wallet connection. All three exist together.
pub struct LiveSession<B> {
    provider: Provider<B>,
    signer: Signer<B>,
    contract: ScoreContract<B>,
}

impl<B> LiveSession<B> {
    pub fn new(provider: Provider<B>, signer: Signer<B>, contract: ScoreContract<B>) -> Self {
        Self {
            provider,
            signer,
            contract,
        }
    }

    pub fn provider(&self) -> &Provider<B> {
        &self.provider
    }

    pub fn signer(&self) -> &Signer<B> {
        &self.signer
    }

    pub fn contract(&self) -> &ScoreContract<B> {
        &self.contract
    }
}

/// Current wallet session. Either empty or fully live; never partially populated,
/// so a contract handle implies a signer which implies a provider.
pub struct Session<B> {
    live: Option<Arc<LiveSession<B>>>,
}

impl<B> Session<B> {
    pub fn empty() -> Self {
        Self { live: None }
    }

    pub fn live(session: LiveSession<B>) -> Self {
        Self {
            live: Some(Arc::new(session)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn handles(&self) -> Option<Arc<LiveSession<B>>> {
        self.live.clone()
    }

    pub fn provider(&self) -> Option<&Provider<B>> {
        self.live.as_deref().map(LiveSession::provider)
    }

    pub fn signer(&self) -> Option<&Signer<B>> {
        self.live.as_deref().map(LiveSession::signer)
    }

    pub fn contract(&self) -> Option<&ScoreContract<B>> {
        self.live.as_deref().map(LiveSession::contract)
    }
}

impl<B> Clone for Session<B> {
    fn clone(&self) -> Self {
        Self {
            live: self.live.clone(),
        }
    }
}

impl<B> Default for Session<B> {
    fn default() -> Self {
        Self::empty()
    }
}
