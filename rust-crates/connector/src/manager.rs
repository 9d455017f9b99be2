use crate::{
    bridge::{
        WalletBridge,
        WalletEvent,
    },
    config::ConnectorConfig,
    contract::ScoreContract,
    error::{
        Error,
        Result,
    },
    modal::WalletModal,
    network::ChainId,
    provider::{
        Provider,
        TransactionReceipt,
    },
    scores::{
        ScoreRecord,
        ScoreSubmission,
    },
    session::{
        LiveSession,
        Session,
    },
};
use alloy_primitives::Address;
use futures::{
    FutureExt,
    future::{
        BoxFuture,
        Shared,
        WeakShared,
    },
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    RwLock,
    Weak,
};
use tokio::{
    sync::{
        OnceCell,
        broadcast::{
            self,
            error::RecvError,
        },
    },
    task::JoinHandle,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};


type ConnectAttempt = Shared<BoxFuture<'static, Result<()>>>;

/// Outcome of a successful network check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStatus {
    /// The wallet was already on the required chain.
    Matched,
    /// The wallet accepted a switch to the required chain.
    Switched,
    /// The wallet did not know the chain and was asked to add it. Counted as success
    /// whether or not the wallet accepted.
    AddRequested { accepted: bool },
}

/// Listener for wallet-originated events. Dropping it stops the listener.
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The bridge an [`EventSubscription`] is listening to.
struct WatchedBridge<B> {
    bridge: Weak<B>,
    subscription: EventSubscription,
}

/// The in-flight connect attempt. Only its waiters own it; once every waiter is gone the
/// attempt is dropped along with the manager handle it captured.
#[derive(Default)]
struct ConnectSlot {
    generation: u64,
    attempt: Option<WeakShared<BoxFuture<'static, Result<()>>>>,
}

/// Owns the wallet session and runs every leaderboard operation through it.
///
/// Cloning is cheap; clones share the same session.
pub struct ConnectionManager<M: WalletModal> {
    inner: Arc<Inner<M>>,
}

struct Inner<M: WalletModal> {
    config: ConnectorConfig,
    modal: M,
    initialized: OnceCell<()>,
    session: RwLock<Session<M::Bridge>>,
    connecting: Mutex<ConnectSlot>,
    watched: Mutex<Option<WatchedBridge<M::Bridge>>>,
}

impl<M: WalletModal> Clone for ConnectionManager<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<M: WalletModal> ConnectionManager<M> {
    pub fn new(config: ConnectorConfig, modal: M) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                modal,
                initialized: OnceCell::new(),
                session: RwLock::new(Session::empty()),
                connecting: Mutex::new(ConnectSlot::default()),
                watched: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    pub fn modal(&self) -> &M {
        &self.inner.modal
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session<M::Bridge> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether wallet events are currently being listened to.
    pub fn is_subscribed(&self) -> bool {
        lock(&self.inner.watched)
            .as_ref()
            .is_some_and(|watched| watched.subscription.is_active())
    }

    fn store_session(&self, session: Session<M::Bridge>) {
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn clear_session(&self, reason: &'static str) {
        self.store_session(Session::empty());
        info!(reason, "wallet session cleared");
    }

    /// Configures the wallet modal. Only the first successful call does any work; a
    /// failed attempt is reported to its caller and retried by the next call.
    pub async fn initialize(&self) -> Result<()> {
        self.inner
            .initialized
            .get_or_try_init(|| async {
                self.inner.modal.configure(&self.inner.config.modal).await?;
                if let Some(bridge) = self.inner.modal.bridge() {
                    self.watch(&bridge);
                }
                info!(
                    chain = %self.inner.config.target().chain_id,
                    "wallet modal initialized"
                );
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    /// Starts listening to `bridge` unless it is already being listened to.
    fn watch(&self, bridge: &Arc<M::Bridge>) {
        let mut watched = lock(&self.inner.watched);
        if let Some(current) = watched.as_ref()
            && current.bridge.as_ptr() == Arc::as_ptr(bridge)
        {
            return;
        }
        let events = bridge.subscribe();
        let task = tokio::spawn(listen(Arc::downgrade(&self.inner), events));
        *watched = Some(WatchedBridge {
            bridge: Arc::downgrade(bridge),
            subscription: EventSubscription { task },
        });
        debug!("registered wallet event handlers");
    }

    /// Stops listening to wallet events and drops the session.
    pub fn close(&self) {
        lock(&self.inner.watched).take();
        self.clear_session("connection closed");
    }

    /// Opens the wallet modal and, if a wallet bridge is present afterwards, builds a
    /// fresh session on the required chain. Concurrent callers share one attempt.
    pub async fn connect(&self) -> Result<()> {
        let (generation, attempt) = {
            let mut slot = lock(&self.inner.connecting);
            match slot.attempt.as_ref().and_then(WeakShared::upgrade) {
                Some(attempt) => (slot.generation, attempt),
                None => {
                    slot.generation += 1;
                    let manager = self.clone();
                    let attempt: ConnectAttempt = async move { manager.establish().await }
                        .boxed()
                        .shared();
                    slot.attempt = attempt.downgrade();
                    (slot.generation, attempt)
                }
            }
        };
        let outcome = attempt.await;
        let mut slot = lock(&self.inner.connecting);
        if slot.generation == generation {
            slot.attempt = None;
        }
        outcome
    }

    async fn establish(&self) -> Result<()> {
        self.initialize().await?;
        self.inner.modal.open(&self.inner.config.modal).await?;
        let Some(bridge) = self.inner.modal.bridge() else {
            debug!("no wallet bridge after the modal closed; session stays empty");
            return Ok(());
        };
        self.watch(&bridge);

        let provider = Provider::new(bridge, self.inner.config.poll_interval);
        let status = self.assure_network_on(&provider).await?;
        debug!(?status, "network confirmed for new session");

        let signer = provider.get_signer().await?;
        let contract = ScoreContract::new(self.inner.config.contract_address, signer.clone());
        let account = signer.address();
        self.store_session(Session::live(LiveSession::new(provider, signer, contract)));
        info!(%account, "wallet session established");
        Ok(())
    }

    /// Makes sure the wallet is on the required chain, returning `false` on any failure.
    pub async fn ensure_network(&self) -> bool {
        match self.assure_network().await {
            Ok(status) => {
                debug!(?status, "network ensured");
                true
            }
            Err(error) => {
                error!(%error, "failed to ensure network");
                false
            }
        }
    }

    pub async fn assure_network(&self) -> Result<NetworkStatus> {
        let bridge = self.inner.modal.bridge().ok_or(Error::NoWalletBridge)?;
        let provider = Provider::new(bridge, self.inner.config.poll_interval);
        self.assure_network_on(&provider).await
    }

    async fn assure_network_on(
        &self,
        provider: &Provider<M::Bridge>,
    ) -> Result<NetworkStatus> {
        let current = provider.chain_id().await?;
        if self.inner.config.target().matches(current) {
            return Ok(NetworkStatus::Matched);
        }
        self.switch_network(provider, current).await
    }

    async fn switch_network(
        &self,
        provider: &Provider<M::Bridge>,
        current: ChainId,
    ) -> Result<NetworkStatus> {
        let target = self.inner.config.target();
        info!(from = %current, to = %target.chain_id, "requesting chain switch");
        match provider.switch_chain(target.chain_id).await {
            Ok(()) => Ok(NetworkStatus::Switched),
            Err(Error::Rpc(err)) if err.is_unrecognized_chain() => {
                let params = target.add_chain_parameters(self.inner.config.modal.project_id());
                let accepted = match provider.add_chain(&params).await {
                    Ok(()) => true,
                    Err(error) => {
                        warn!(
                            %error,
                            chain = %target.chain_id,
                            "wallet did not add the chain; continuing as requested"
                        );
                        false
                    }
                };
                Ok(NetworkStatus::AddRequested { accepted })
            }
            Err(Error::Rpc(reason)) => Err(Error::NetworkMismatch {
                expected: target.chain_id,
                actual: current,
                reason,
            }),
            Err(other) => Err(other),
        }
    }

    async fn live_session(&self) -> Result<Arc<LiveSession<M::Bridge>>> {
        if let Some(live) = self.session().handles() {
            return Ok(live);
        }
        self.connect().await?;
        match self.session().handles() {
            Some(live) => Ok(live),
            None if self.inner.modal.bridge().is_none() => Err(Error::NoWalletBridge),
            None => Err(Error::NotConnected),
        }
    }

    /// Current leaderboard, or an empty list if anything along the way failed.
    pub async fn get_high_scores(&self) -> Vec<ScoreRecord> {
        self.try_get_high_scores().await.unwrap_or_else(|error| {
            error!(%error, "error getting high scores");
            Vec::new()
        })
    }

    pub async fn try_get_high_scores(&self) -> Result<Vec<ScoreRecord>> {
        let live = self.live_session().await?;
        self.assure_network_on(live.provider()).await?;
        let raw = live.contract().get_high_scores().await?;
        raw.iter().map(ScoreRecord::from_raw).collect()
    }

    /// Scores recorded for one player, or an empty list on failure.
    pub async fn get_player_scores(&self, player: Address) -> Vec<ScoreRecord> {
        self.try_get_player_scores(player)
            .await
            .unwrap_or_else(|error| {
                error!(%error, %player, "error getting player scores");
                Vec::new()
            })
    }

    pub async fn try_get_player_scores(&self, player: Address) -> Result<Vec<ScoreRecord>> {
        let live = self.live_session().await?;
        self.assure_network_on(live.provider()).await?;
        let raw = live.contract().get_player_scores(player).await?;
        raw.iter().map(ScoreRecord::from_raw).collect()
    }

    /// Submits a score and waits for its confirmation. `true` only once confirmed.
    pub async fn save_score(
        &self,
        wpm: u64,
        accuracy: u64,
        category: impl Into<String>,
    ) -> bool {
        match self.try_save_score(wpm, accuracy, category).await {
            Ok(_) => true,
            Err(error) => {
                error!(%error, "error saving score");
                false
            }
        }
    }

    pub async fn try_save_score(
        &self,
        wpm: u64,
        accuracy: u64,
        category: impl Into<String>,
    ) -> Result<TransactionReceipt> {
        let submission = ScoreSubmission::new(wpm, accuracy, category)?;
        let live = self.live_session().await?;
        self.assure_network_on(live.provider()).await?;
        let pending = live.contract().add_score(&submission).await?;
        info!(tx = %pending.hash(), "score submitted, waiting for confirmation");
        let receipt = pending.wait().await?;
        for event in live.contract().new_score_events(&receipt) {
            info!(
                player = %event.player,
                wpm = %event.wpm,
                accuracy = %event.accuracy,
                category = %event.category,
                "score recorded"
            );
        }
        Ok(receipt)
    }

    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::ChainChanged(chain_id) => self.handle_chain_changed(chain_id).await,
            WalletEvent::AccountsChanged(accounts) => self.handle_accounts_changed(&accounts),
        }
    }

    /// Steers the wallet back to the required chain when it moves elsewhere. The session
    /// is dropped either way so the next operation starts from scratch.
    pub async fn handle_chain_changed(&self, chain_id: ChainId) {
        let target = self.inner.config.target();
        if target.matches(chain_id) {
            debug!(chain = %chain_id, "wallet moved to the required chain");
            return;
        }
        warn!(chain = %chain_id, expected = %target.chain_id, "wallet left the required chain");
        if let Some(bridge) = self.inner.modal.bridge() {
            let provider = Provider::new(bridge, self.inner.config.poll_interval);
            match self.switch_network(&provider, chain_id).await {
                Ok(status) => info!(?status, "requested switch back to the required chain"),
                Err(error) => error!(%error, "failed to switch back to the required chain"),
            }
        }
        self.clear_session("chain changed");
    }

    pub fn handle_accounts_changed(&self, accounts: &[Address]) {
        debug!(accounts = accounts.len(), "wallet accounts changed");
        self.clear_session("accounts changed");
    }
}

/// Forwards wallet events to the manager, one task per event so a slow handler never
/// holds up the next notification.
async fn listen<M: WalletModal>(
    inner: Weak<Inner<M>>,
    mut events: broadcast::Receiver<WalletEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let manager = ConnectionManager { inner };
                tokio::spawn(async move { manager.handle_wallet_event(event).await });
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "wallet event listener fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
