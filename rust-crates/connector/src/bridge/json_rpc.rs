use crate::{
    bridge::{
        RpcError,
        WalletBridge,
        WalletEvent,
    },
    error::{
        Error,
        Result,
    },
    network::ChainId,
    provider::Provider,
};
use alloy_primitives::Address;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use std::{
    sync::{
        Arc,
        Mutex,
        PoisonError,
        Weak,
        atomic::{
            AtomicU64,
            Ordering,
        },
    },
    time::Duration,
};
use tokio::{
    sync::broadcast,
    time,
};
use tracing::{
    debug,
    trace,
};

const EVENT_CAPACITY: usize = 16;

/// Wallet bridge speaking EIP-1193 JSON-RPC over HTTP, e.g. to a desktop wallet such as
/// Frame or to a development node with unlocked accounts.
///
/// HTTP has no push channel, so wallet events are derived by polling `eth_chainId` and
/// `eth_accounts` while anyone is subscribed.
pub struct JsonRpcBridge {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    events: broadcast::Sender<WalletEvent>,
    /// Accounts from the last `eth_requestAccounts` the watcher has not seen yet.
    granted: Mutex<Option<Vec<Address>>>,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

impl JsonRpcBridge {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            endpoint: endpoint.into(),
            http,
            next_id: AtomicU64::new(1),
            events,
            granted: Mutex::new(None),
        })
    }

    /// Creates the bridge and starts watching the wallet for chain and account changes.
    /// The watcher stops on its own once the bridge is dropped.
    pub fn spawn(endpoint: impl Into<String>, poll_interval: Duration) -> Result<Arc<Self>> {
        let bridge = Arc::new(Self::new(endpoint)?);
        tokio::spawn(watch_wallet(Arc::downgrade(&bridge), poll_interval));
        Ok(bridge)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn note_response(&self, method: &str, result: &Value) {
        if method != "eth_requestAccounts" {
            return;
        }
        if let Ok(accounts) = serde_json::from_value::<Vec<Address>>(result.clone()) {
            *self.granted.lock().unwrap_or_else(PoisonError::into_inner) = Some(accounts);
        }
    }

    fn take_granted(&self) -> Option<Vec<Address>> {
        self.granted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl WalletBridge for JsonRpcBridge {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(method, id, "wallet request");
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let res = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable body>".to_string());
            return Err(Error::Transport(format!(
                "wallet responded with {status} to {method}: {body}"
            )));
        }
        let response: RpcResponse = res
            .json()
            .await
            .map_err(|e| Error::decode("wallet response", e))?;
        match response.error {
            Some(error) => Err(error.into()),
            None => {
                self.note_response(method, &response.result);
                Ok(response.result)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

async fn watch_wallet(bridge: Weak<JsonRpcBridge>, poll_interval: Duration) {
    let mut ticker = time::interval(poll_interval);
    let mut observed = ObservedWallet::default();
    loop {
        ticker.tick().await;
        let Some(bridge) = bridge.upgrade() else {
            break;
        };
        if bridge.events.receiver_count() == 0 {
            continue;
        }
        let provider = Provider::new(Arc::clone(&bridge), poll_interval);
        let state = match provider.chain_id().await {
            Ok(chain_id) => provider
                .accounts()
                .await
                .map(|accounts| (chain_id, accounts)),
            Err(e) => Err(e),
        };
        match state {
            Ok((chain_id, accounts)) => {
                if let Some(granted) = bridge.take_granted() {
                    observed.rebase_accounts(granted);
                    continue;
                }
                for event in observed.update(chain_id, accounts) {
                    debug!(?event, endpoint = bridge.endpoint(), "wallet event");
                    let _ = bridge.events.send(event);
                }
            }
            Err(error) => debug!(%error, "failed to poll wallet state"),
        }
    }
}

/// Last wallet state seen by the watcher. The first observation only sets the baseline.
#[derive(Debug, Default)]
struct ObservedWallet {
    chain_id: Option<ChainId>,
    accounts: Option<Vec<Address>>,
}

impl ObservedWallet {
    fn update(&mut self, chain_id: ChainId, accounts: Vec<Address>) -> Vec<WalletEvent> {
        let mut events = Vec::new();
        if let Some(previous) = self.chain_id
            && previous != chain_id
        {
            events.push(WalletEvent::ChainChanged(chain_id));
        }
        self.chain_id = Some(chain_id);
        if let Some(previous) = &self.accounts
            && *previous != accounts
        {
            events.push(WalletEvent::AccountsChanged(accounts.clone()));
        }
        self.accounts = Some(accounts);
        events
    }

    /// Accounts the wallet has just granted become the baseline without an event, so a
    /// wallet that hid its accounts until approval does not invalidate the new session.
    fn rebase_accounts(&mut self, granted: Vec<Address>) {
        self.accounts = Some(granted);
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use serde_json::json;

    #[test]
    fn update__first_observation__emits_nothing() {
        let mut observed = ObservedWallet::default();

        let events = observed.update(ChainId::new(1), vec![Address::repeat_byte(1)]);

        assert!(events.is_empty());
    }

    #[test]
    fn update__chain_and_accounts_change__emits_both_events() {
        // given
        let mut observed = ObservedWallet::default();
        observed.update(ChainId::new(1), vec![Address::repeat_byte(1)]);

        // when
        let events = observed.update(ChainId::new(5), Vec::new());

        // then
        assert_eq!(
            vec![
                WalletEvent::ChainChanged(ChainId::new(5)),
                WalletEvent::AccountsChanged(Vec::new()),
            ],
            events
        );
    }

    #[test]
    fn update__unchanged_state__emits_nothing() {
        let mut observed = ObservedWallet::default();
        observed.update(ChainId::new(1), vec![Address::repeat_byte(1)]);

        let events = observed.update(ChainId::new(1), vec![Address::repeat_byte(1)]);

        assert!(events.is_empty());
    }

    #[test]
    fn update__accounts_granted_after_empty_baseline__emits_nothing() {
        // given
        let mut observed = ObservedWallet::default();
        observed.update(ChainId::new(1), Vec::new());

        // when
        observed.rebase_accounts(vec![Address::repeat_byte(1)]);
        let events = observed.update(ChainId::new(1), vec![Address::repeat_byte(1)]);

        // then
        assert!(events.is_empty());
    }

    #[test]
    fn note_response__request_accounts__is_taken_once() {
        // given
        let bridge = JsonRpcBridge::new("http://127.0.0.1:1248").unwrap();
        let granted = vec![Address::repeat_byte(7)];

        // when
        bridge.note_response("eth_chainId", &json!("0x1"));
        bridge.note_response("eth_requestAccounts", &json!(granted));

        // then
        assert_eq!(Some(granted), bridge.take_granted());
        assert_eq!(None, bridge.take_granted());
    }

    #[test]
    fn rpc_response__error_object__deserializes_code() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": { "code": 4902, "message": "Unrecognized chain ID", "data": {} },
        }))
        .unwrap();

        let error = response.error.unwrap();
        assert!(error.is_unrecognized_chain());
        assert_eq!(Value::Null, response.result);
    }
}
