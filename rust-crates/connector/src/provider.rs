use crate::{
    bridge::WalletBridge,
    error::{
        Error,
        Result,
    },
    network::{
        AddChainParameters,
        ChainId,
        SwitchChainParameters,
    },
};
use alloy_primitives::{
    Address,
    B256,
    Bytes,
    U64,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use serde_json::{
    Value,
    json,
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::time;
use tracing::trace;

/// Read access to the chain through the wallet bridge.
pub struct Provider<B> {
    bridge: Arc<B>,
    poll_interval: Duration,
}

impl<B> Clone for Provider<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
            poll_interval: self.poll_interval,
        }
    }
}

impl<B> Provider<B> {
    pub fn new(bridge: Arc<B>, poll_interval: Duration) -> Self {
        Self {
            bridge,
            poll_interval,
        }
    }

    pub fn bridge(&self) -> &Arc<B> {
        &self.bridge
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl<B: WalletBridge> Provider<B> {
    async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T> {
        let value = self.bridge.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| Error::decode(method, e))
    }

    pub async fn chain_id(&self) -> Result<ChainId> {
        self.request("eth_chainId", json!([])).await
    }

    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    /// Asks the wallet for account access; wallets may prompt the user here.
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_requestAccounts", json!([])).await
    }

    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        let params = SwitchChainParameters { chain_id };
        self.bridge
            .request("wallet_switchEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    pub async fn add_chain(&self, params: &AddChainParameters) -> Result<()> {
        self.bridge
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let call = TransactionRequest {
            from: None,
            to,
            data,
        };
        self.request("eth_call", json!([call, "latest"])).await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    /// Polls until the transaction is included. There is no upper bound on the wait.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            trace!(%hash, "transaction not yet included");
            time::sleep(self.poll_interval).await;
        }
    }

    /// Signer for the first account the wallet grants.
    pub async fn get_signer(&self) -> Result<Signer<B>> {
        let accounts = self.request_accounts().await?;
        let address = accounts.first().copied().ok_or(Error::NoAccounts)?;
        Ok(Signer {
            provider: self.clone(),
            address,
        })
    }
}

/// An account the wallet will sign transactions for.
pub struct Signer<B> {
    provider: Provider<B>,
    address: Address,
}

impl<B> Clone for Signer<B> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            address: self.address,
        }
    }
}

impl<B> Signer<B> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &Provider<B> {
        &self.provider
    }
}

impl<B: WalletBridge> Signer<B> {
    pub async fn send_transaction(&self, to: Address, data: Bytes) -> Result<B256> {
        let tx = TransactionRequest {
            from: Some(self.address),
            to,
            data,
        };
        self.provider.send_transaction(&tx).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Post-Byzantium status flag; a missing flag counts as failure.
    pub fn succeeded(&self) -> bool {
        self.status == Some(U64::from(1u64))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}
