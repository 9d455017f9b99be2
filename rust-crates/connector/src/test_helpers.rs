//! In-memory wallet doubles for exercising the connection manager without a wallet.

use crate::{
    bridge::{
        RpcError,
        WalletBridge,
        WalletEvent,
    },
    config::ConnectorConfig,
    error::{
        Error,
        Result,
    },
    modal::{
        ModalConfig,
        WalletDescriptor,
        WalletModal,
    },
    network::{
        ChainId,
        NetworkIdentity,
    },
};
use alloy_primitives::{
    Address,
    B256,
    Bytes,
};
use alloy_sol_types::SolCall;
use generated_abi::{
    test_helpers::{
        encode_high_scores,
        encode_player_scores,
        new_score_log,
    },
    typing_stats_types::{
        NewScore,
        Score,
        addScoreCall,
        getHighScoresCall,
        getPlayerScoresCall,
    },
};
use serde_json::{
    Value,
    json,
};
use std::sync::{
    Arc,
    Mutex,
    atomic::{
        AtomicUsize,
        Ordering,
    },
};
use tokio::sync::broadcast;

pub fn contract_address() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn account() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn test_config(chain: NetworkIdentity) -> ConnectorConfig {
    let modal = ModalConfig::new(
        "test-project",
        chain,
        vec![WalletDescriptor::new("spy", "memory://spy")],
    )
    .expect("valid modal config");
    ConnectorConfig::new(contract_address(), modal)
        .with_poll_interval(std::time::Duration::from_millis(1))
}

struct SpyState {
    chain_id: ChainId,
    accounts: Vec<Address>,
    switch_error: Option<RpcError>,
    add_error: Option<RpcError>,
    call_error: Option<RpcError>,
    send_error: Option<RpcError>,
    scores: Vec<Score>,
    pending_receipt_polls: usize,
    receipt_status: u64,
    requests: Vec<(String, Value)>,
}

/// Scriptable wallet bridge that records every request it receives.
pub struct SpyBridge {
    state: Mutex<SpyState>,
    events: broadcast::Sender<WalletEvent>,
    subscriptions: AtomicUsize,
}

impl SpyBridge {
    pub fn on_chain(chain_id: ChainId) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(SpyState {
                chain_id,
                accounts: vec![account()],
                switch_error: None,
                add_error: None,
                call_error: None,
                send_error: None,
                scores: Vec::new(),
                pending_receipt_polls: 0,
                receipt_status: 1,
                requests: Vec::new(),
            }),
            events,
            subscriptions: AtomicUsize::new(0),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SpyState> {
        self.state.lock().unwrap()
    }

    pub fn set_chain(&self, chain_id: ChainId) {
        self.state().chain_id = chain_id;
    }

    pub fn chain(&self) -> ChainId {
        self.state().chain_id
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state().accounts = accounts;
    }

    pub fn reject_switch(&self, error: RpcError) {
        self.state().switch_error = Some(error);
    }

    pub fn reject_add(&self, error: RpcError) {
        self.state().add_error = Some(error);
    }

    pub fn reject_calls(&self, error: RpcError) {
        self.state().call_error = Some(error);
    }

    pub fn reject_transactions(&self, error: RpcError) {
        self.state().send_error = Some(error);
    }

    pub fn set_scores(&self, scores: Vec<Score>) {
        self.state().scores = scores;
    }

    /// Receipts come back empty this many times before the transaction is included.
    pub fn delay_receipts(&self, polls: usize) {
        self.state().pending_receipt_polls = polls;
    }

    pub fn revert_transactions(&self) {
        self.state().receipt_status = 0;
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state().requests.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value> {
        let mut state = self.state();
        state.requests.push((method.to_string(), params.clone()));
        match method {
            "eth_chainId" => Ok(json!(state.chain_id)),
            "eth_accounts" | "eth_requestAccounts" => Ok(json!(state.accounts)),
            "wallet_switchEthereumChain" => {
                if let Some(error) = state.switch_error.clone() {
                    return Err(error.into());
                }
                state.chain_id = serde_json::from_value(params[0]["chainId"].clone())
                    .map_err(|e| Error::decode("switch params", e))?;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => match state.add_error.clone() {
                Some(error) => Err(error.into()),
                None => Ok(Value::Null),
            },
            "eth_call" => {
                if let Some(error) = state.call_error.clone() {
                    return Err(error.into());
                }
                let data: Bytes = serde_json::from_value(params[0]["data"].clone())
                    .map_err(|e| Error::decode("call data", e))?;
                if data.starts_with(&getHighScoresCall::SELECTOR) {
                    return Ok(json!(Bytes::from(encode_high_scores(&state.scores))));
                }
                let call = getPlayerScoresCall::abi_decode(&data, true)
                    .map_err(|e| Error::decode("call data", e))?;
                let scores: Vec<Score> = state
                    .scores
                    .iter()
                    .filter(|score| score.player == call._player)
                    .cloned()
                    .collect();
                Ok(json!(Bytes::from(encode_player_scores(&scores))))
            }
            "eth_sendTransaction" => {
                if let Some(error) = state.send_error.clone() {
                    return Err(error.into());
                }
                let data: Bytes = serde_json::from_value(params[0]["data"].clone())
                    .map_err(|e| Error::decode("transaction data", e))?;
                let call = addScoreCall::abi_decode(&data, true)
                    .map_err(|e| Error::decode("transaction data", e))?;
                let player = state.accounts.first().copied().unwrap_or_default();
                if state.receipt_status == 1 {
                    state.scores.push(Score {
                        player,
                        wpm: call._wpm,
                        accuracy: call._accuracy,
                        timestamp: alloy_primitives::U256::from(1_700_000_000u64),
                        category: call._category.clone(),
                    });
                }
                Ok(json!(tx_hash()))
            }
            "eth_getTransactionReceipt" => {
                if state.pending_receipt_polls > 0 {
                    state.pending_receipt_polls -= 1;
                    return Ok(Value::Null);
                }
                let logs = match state.scores.last() {
                    Some(score) if state.receipt_status == 1 => {
                        let (topics, data) = new_score_log(&NewScore {
                            player: score.player,
                            wpm: score.wpm,
                            accuracy: score.accuracy,
                            category: score.category.clone(),
                        });
                        vec![json!({
                            "address": contract_address(),
                            "topics": topics,
                            "data": Bytes::from(data),
                        })]
                    }
                    _ => Vec::new(),
                };
                Ok(json!({
                    "transactionHash": tx_hash(),
                    "blockNumber": "0x10",
                    "status": format!("{:#x}", state.receipt_status),
                    "logs": logs,
                }))
            }
            other => Err(RpcError::new(-32601, format!("method {other} not found")).into()),
        }
    }
}

pub fn tx_hash() -> B256 {
    B256::repeat_byte(0x7e)
}

impl WalletBridge for SpyBridge {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.answer(method, &params)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.events.subscribe()
    }
}

/// Modal double. The bridge it exposes can be present from the start or appear only
/// once the modal has been opened.
pub struct FakeModal {
    bridge: Mutex<Option<Arc<SpyBridge>>>,
    bridge_on_open: Mutex<Option<Arc<SpyBridge>>>,
    configure_failures: AtomicUsize,
    configure_calls: AtomicUsize,
    open_calls: AtomicUsize,
}

impl FakeModal {
    pub fn with_bridge(bridge: Arc<SpyBridge>) -> Self {
        Self::new(Some(bridge), None)
    }

    pub fn bridge_after_open(bridge: Arc<SpyBridge>) -> Self {
        Self::new(None, Some(bridge))
    }

    pub fn without_bridge() -> Self {
        Self::new(None, None)
    }

    fn new(bridge: Option<Arc<SpyBridge>>, bridge_on_open: Option<Arc<SpyBridge>>) -> Self {
        Self {
            bridge: Mutex::new(bridge),
            bridge_on_open: Mutex::new(bridge_on_open),
            configure_failures: AtomicUsize::new(0),
            configure_calls: AtomicUsize::new(0),
            open_calls: AtomicUsize::new(0),
        }
    }

    /// The next `n` configure calls fail.
    pub fn fail_configure(&self, n: usize) {
        self.configure_failures.store(n, Ordering::SeqCst);
    }

    pub fn configure_calls(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }
}

impl WalletModal for FakeModal {
    type Bridge = SpyBridge;

    async fn configure(&self, _config: &ModalConfig) -> Result<()> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        let failures = self.configure_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.configure_failures.store(failures - 1, Ordering::SeqCst);
            return Err(Error::Initialization("modal refused to configure".to_string()));
        }
        Ok(())
    }

    async fn open(&self, _config: &ModalConfig) -> Result<()> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(bridge) = self.bridge_on_open.lock().unwrap().take() {
            *self.bridge.lock().unwrap() = Some(bridge);
        }
        Ok(())
    }

    fn bridge(&self) -> Option<Arc<SpyBridge>> {
        self.bridge.lock().unwrap().clone()
    }
}
