use crate::{
    bridge::WalletBridge,
    error::{
        Error,
        Result,
    },
    provider::{
        Provider,
        Signer,
        TransactionReceipt,
    },
    scores::ScoreSubmission,
};
use alloy_primitives::{
    Address,
    B256,
};
use alloy_sol_types::{
    SolCall,
    SolEvent,
};
use generated_abi::{
    add_score_call,
    player_scores_call,
    typing_stats_types::{
        NewScore,
        Score,
        getHighScoresCall,
        getPlayerScoresCall,
    },
};
use tracing::debug;

/// `TypingStats` contract handle bound to a signer.
pub struct ScoreContract<B> {
    address: Address,
    signer: Signer<B>,
}

impl<B> Clone for ScoreContract<B> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            signer: self.signer.clone(),
        }
    }
}

impl<B> ScoreContract<B> {
    pub fn new(address: Address, signer: Signer<B>) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &Signer<B> {
        &self.signer
    }

    /// `NewScore` events this contract emitted in the given receipt.
    pub fn new_score_events(&self, receipt: &TransactionReceipt) -> Vec<NewScore> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter(|log| log.topics.first() == Some(&NewScore::SIGNATURE_HASH))
            .filter_map(|log| {
                NewScore::decode_raw_log(log.topics.iter().copied(), &log.data, true)
                    .inspect_err(|error| debug!(%error, "skipping undecodable log"))
                    .ok()
            })
            .collect()
    }
}

impl<B: WalletBridge> ScoreContract<B> {
    pub async fn add_score(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<PendingTransaction<B>> {
        let call = add_score_call(
            submission.wpm,
            submission.accuracy,
            submission.category.clone(),
        );
        let hash = self
            .signer
            .send_transaction(self.address, call.abi_encode().into())
            .await?;
        Ok(PendingTransaction {
            hash,
            provider: self.signer.provider().clone(),
        })
    }

    pub async fn get_high_scores(&self) -> Result<Vec<Score>> {
        let data = self
            .signer
            .provider()
            .call(self.address, getHighScoresCall {}.abi_encode().into())
            .await?;
        let decoded = getHighScoresCall::abi_decode_returns(&data, true)
            .map_err(|e| Error::decode("getHighScores result", e))?;
        Ok(decoded._0)
    }

    pub async fn get_player_scores(&self, player: Address) -> Result<Vec<Score>> {
        let data = self
            .signer
            .provider()
            .call(self.address, player_scores_call(player).abi_encode().into())
            .await?;
        let decoded = getPlayerScoresCall::abi_decode_returns(&data, true)
            .map_err(|e| Error::decode("getPlayerScores result", e))?;
        Ok(decoded._0)
    }
}

/// A submitted transaction that has not been confirmed yet.
pub struct PendingTransaction<B> {
    hash: B256,
    provider: Provider<B>,
}

impl<B> PendingTransaction<B> {
    pub fn hash(&self) -> B256 {
        self.hash
    }
}

impl<B: WalletBridge> PendingTransaction<B> {
    /// Waits for inclusion and fails if the transaction reverted.
    pub async fn wait(self) -> Result<TransactionReceipt> {
        let receipt = self.provider.wait_for_receipt(self.hash).await?;
        if !receipt.succeeded() {
            return Err(Error::TransactionReverted(self.hash));
        }
        Ok(receipt)
    }
}
