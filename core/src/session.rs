//! Wallet session: connection state machine, target-network policy, balance
//! refresh and the reaction to wallet-originated events.
//!
//! All session mutation goes through [`SessionManager`]. Every connect or reset
//! takes a new generation number; writes from an older generation are dropped,
//! so when two connects interleave (for example a `chainChanged` re-verification
//! racing the continuation of a network switch) the most recently started one
//! decides the final state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{Address, U256};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::address::parse_address_unchecked;
use crate::chain::SessionConfig;
use crate::display::wei_to_ether;
use crate::error::SessionError;
use crate::network::{NetworkClient, NetworkInfo};
use crate::provider::{Eip1193Provider, WalletEvent};
use crate::signer::{AccountSigner, Signer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    VerifyingNetwork,
    SwitchingNetwork,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::VerifyingNetwork => write!(f, "verifying network"),
            Self::SwitchingNetwork => write!(f, "switching network"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Current wallet-connection context. Empty at startup and after any reset.
#[derive(Clone, Default)]
pub struct Session {
    pub state: ConnectionState,
    pub account: Option<Address>,
    /// Balance in wei.
    pub balance: Option<U256>,
    pub network: Option<NetworkInfo>,
    /// Last failure reason, kept after a reset so the UI can show it.
    pub error: Option<String>,
    client: Option<NetworkClient>,
    signer: Option<Arc<dyn Signer>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("account", &self.account)
            .field("balance", &self.balance)
            .field("network", &self.network)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn cleared(error: Option<String>) -> Self {
        Self {
            error,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Provider handle, present once account access was granted.
    pub fn client(&self) -> Option<&NetworkClient> {
        self.client.as_ref()
    }

    /// Signer bound to `account`, present only while connected.
    pub fn signer(&self) -> Option<&Arc<dyn Signer>> {
        self.signer.as_ref()
    }

    /// Balance as a decimal ether string.
    pub fn balance_ether(&self) -> Option<String> {
        self.balance.map(wei_to_ether)
    }
}

pub struct SessionManager {
    provider: Option<Arc<dyn Eip1193Provider>>,
    config: SessionConfig,
    state: watch::Sender<Session>,
    generation: AtomicU64,
    poll: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionManager {
    /// `provider` is `None` when no wallet is injected; `connect` then fails with `NoProvider`.
    pub fn new(provider: Option<Arc<dyn Eip1193Provider>>, config: SessionConfig) -> Arc<Self> {
        let (state, _) = watch::channel(Session::default());
        Arc::new(Self {
            provider,
            config,
            state,
            generation: AtomicU64::new(0),
            poll: Mutex::new(None),
            listener: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Whether the background balance poll is running.
    pub fn is_polling(&self) -> bool {
        lock(&self.poll).as_ref().is_some_and(|h| !h.is_finished())
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn ensure_current(&self, generation: u64) -> Result<(), SessionError> {
        if self.is_current(generation) {
            Ok(())
        } else {
            Err(SessionError::Superseded)
        }
    }

    /// Apply `f` to the session if `generation` is still the latest one.
    fn commit(
        &self,
        generation: u64,
        f: impl FnOnce(&mut Session),
    ) -> Result<(), SessionError> {
        let mut applied = false;
        self.state.send_if_modified(|session| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            f(session);
            applied = true;
            true
        });
        if applied {
            Ok(())
        } else {
            Err(SessionError::Superseded)
        }
    }

    /// Request account access, verify (or switch to) the target network and
    /// mark the session connected.
    pub async fn connect(self: &Arc<Self>) -> Result<(), SessionError> {
        let generation = self.begin();

        let Some(provider) = self.provider.clone() else {
            tracing::error!("no wallet provider detected");
            return Err(self.fail(generation, SessionError::NoProvider));
        };

        self.commit(generation, |s| {
            s.state = ConnectionState::Connecting;
            s.error = None;
        })?;

        match self.establish(generation, NetworkClient::new(provider)).await {
            Ok(()) => Ok(()),
            Err(SessionError::Superseded) => {
                tracing::debug!(generation, "connect superseded by a newer attempt");
                Err(SessionError::Superseded)
            }
            Err(err) => Err(self.fail(generation, err)),
        }
    }

    async fn establish(
        self: &Arc<Self>,
        generation: u64,
        client: NetworkClient,
    ) -> Result<(), SessionError> {
        let target = self.config.target;
        let target_name = target.display_name();

        let accounts = client
            .request_accounts()
            .await
            .map_err(|e| SessionError::from_connect(&e))?;
        let Some(first) = accounts.first() else {
            return Err(SessionError::NetworkVerification(
                "No authorized account found.".into(),
            ));
        };
        let account = parse_address_unchecked(first)
            .map_err(|e| SessionError::Connection(format!("Connection error: {e}")))?;

        self.commit(generation, |s| {
            s.state = ConnectionState::VerifyingNetwork;
            s.client = Some(client.clone());
        })?;

        let mut network = client
            .network()
            .await
            .map_err(|e| SessionError::from_connect(&e))?;

        if network.chain_id != target.chain_id() {
            tracing::info!(
                current = network.chain_id,
                target = target.chain_id(),
                "wrong network, requesting switch"
            );
            self.commit(generation, |s| {
                s.state = ConnectionState::SwitchingNetwork;
                s.error = Some(format!("Please switch to the {target_name} network."));
            })?;

            client
                .switch_chain(target)
                .await
                .map_err(|e| SessionError::from_switch(&e, target_name))?;

            // A `chainChanged` re-verification may have started meanwhile; if so it owns the session.
            self.ensure_current(generation)?;

            network = client
                .network()
                .await
                .map_err(|e| SessionError::from_connect(&e))?;
            if network.chain_id != target.chain_id() {
                return Err(SessionError::NetworkVerification(format!(
                    "Failed to verify network switch. Please connect to {target_name}."
                )));
            }
        }

        let signer: Arc<dyn Signer> = Arc::new(AccountSigner::new(client.clone(), account));
        let info = network.clone();
        self.commit(generation, move |s| {
            if s.account != Some(account) {
                s.balance = None;
            }
            s.state = ConnectionState::Connected;
            s.account = Some(account);
            s.network = Some(info);
            s.client = Some(client);
            s.signer = Some(signer);
            s.error = None;
        })?;

        tracing::info!(%account, network = %network.name, "wallet connected");
        self.start_poll(generation);
        self.refresh_balance().await;
        Ok(())
    }

    /// Reset to disconnected with `err` as the reason, unless a newer attempt owns the session.
    fn fail(&self, generation: u64, err: SessionError) -> SessionError {
        let reason = err.to_string();
        match self.commit(generation, |s| *s = Session::cleared(Some(reason))) {
            Ok(()) => {
                self.stop_poll();
                tracing::warn!(error = %err, "wallet session reset");
                err
            }
            Err(superseded) => superseded,
        }
    }

    fn reset(&self, reason: Option<String>) {
        let generation = self.begin();
        self.stop_poll();
        let _ = self.commit(generation, |s| *s = Session::cleared(reason));
    }

    /// User-initiated disconnect. Clears the session without recording an error.
    pub fn disconnect(&self) {
        tracing::info!("wallet disconnected by user");
        self.reset(None);
    }

    /// Fetch the balance for the current account. Failures are logged and
    /// swallowed; the session is never cleared over a failed read.
    pub async fn refresh_balance(&self) -> Option<U256> {
        let snapshot = self.snapshot();
        let (Some(client), Some(account)) = (snapshot.client, snapshot.account) else {
            return None;
        };

        match client.balance(&account).await {
            Ok(wei) => {
                // Ignore the result if the session moved to another account meanwhile.
                self.state.send_if_modified(|s| {
                    if s.account == Some(account) {
                        s.balance = Some(wei);
                        true
                    } else {
                        false
                    }
                });
                Some(wei)
            }
            Err(e) => {
                tracing::warn!(%account, error = %e, "error fetching balance");
                None
            }
        }
    }

    fn start_poll(self: &Arc<Self>, generation: u64) {
        let mut slot = lock(&self.poll);
        if !self.is_current(generation) {
            return;
        }
        let period = self.config.balance_poll_interval;
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else {
                    break;
                };
                manager.refresh_balance().await;
            }
        });
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn stop_poll(&self) {
        if let Some(handle) = lock(&self.poll).take() {
            handle.abort();
        }
    }

    /// React to a wallet-originated event.
    pub async fn handle_event(self: &Arc<Self>, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                tracing::info!(?accounts, "accounts changed");
                let Some(first) = accounts.first() else {
                    self.reset(Some(SessionError::WalletLocked.to_string()));
                    return;
                };
                let current = self.snapshot().account;
                let changed = match (parse_address_unchecked(first), current) {
                    (Ok(new), Some(current)) => new != current,
                    _ => true,
                };
                if changed {
                    self.reconnect().await;
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                tracing::info!(%chain_id, "network changed");
                self.reconnect().await;
            }
            WalletEvent::Disconnect(err) => {
                tracing::warn!(error = ?err, "wallet disconnected event");
                self.reset(Some(SessionError::WalletDisconnected.to_string()));
            }
        }
    }

    async fn reconnect(self: &Arc<Self>) {
        if let Err(e) = self.connect().await {
            tracing::debug!(error = %e, "listener-driven connect did not complete");
        }
    }

    /// Start dispatching provider events. Each event is handled on its own task
    /// so a newer event can supersede one still in flight.
    pub fn listen(self: &Arc<Self>) {
        let Some(provider) = &self.provider else {
            return;
        };
        let mut events = provider.subscribe();
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(manager) = weak.upgrade() else {
                            break;
                        };
                        tokio::spawn(async move { manager.handle_event(event).await });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "wallet events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        if let Some(old) = lock(&self.listener).replace(handle) {
            old.abort();
        }
    }

    /// Stop the event listener and the balance poll.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.listener).take() {
            handle.abort();
        }
        self.stop_poll();
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
