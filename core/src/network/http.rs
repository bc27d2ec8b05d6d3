//! EIP-1193 emulation over a plain JSON-RPC node.
//!
//! Accounts come from the node (`eth_accounts`), so this only works against
//! nodes that manage unlocked accounts, such as local development nodes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::types::parse_quantity;
use crate::provider::{
    Eip1193Provider, ProviderError, WalletEvent, DISCONNECTED, INTERNAL_ERROR, UNRECOGNIZED_CHAIN,
};

const EVENT_CAPACITY: usize = 32;

pub struct HttpProvider {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    events: broadcast::Sender<WalletEvent>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

/// Reject non-HTTPS node URLs unless `allow_insecure` is set.
fn validate_node_url(url: &str, allow_insecure: bool) -> Result<()> {
    if url.starts_with("https://") {
        return Ok(());
    }
    if url.starts_with("http://") {
        if allow_insecure {
            return Ok(());
        }
        bail!("Refusing to connect over plain HTTP: {url}\nUse --insecure to allow unencrypted connections.");
    }
    bail!("Invalid node URL scheme: {url}\nExpected an https:// URL.");
}

impl HttpProvider {
    pub fn new(url: &str, allow_insecure: bool) -> Result<Self> {
        validate_node_url(url, allow_insecure)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            url: url.to_string(),
            http,
            next_id: AtomicU64::new(1),
            events,
            watcher: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw JSON-RPC 2.0 call against the node.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(DISCONNECTED, format!("Node unreachable, disconnected: {e}")))?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::internal(format!("Invalid JSON-RPC response: {e}")))?;

        if let Some(err) = payload.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(INTERNAL_ERROR);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown JSON-RPC error")
                .to_string();
            return Err(ProviderError::new(code, message));
        }
        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
        let value = self.call("eth_accounts", json!([])).await?;
        Ok(value
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }

    /// A node cannot change chains, so a switch succeeds only if it is already there.
    async fn switch_chain(&self, params: &Value) -> Result<Value, ProviderError> {
        let requested = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .ok_or_else(|| ProviderError::new(-32602, "Missing chainId parameter"))?;
        let requested = parse_quantity(requested)?;
        let current = parse_quantity(&self.call("eth_chainId", json!([])).await?)?;
        if requested == current {
            Ok(Value::Null)
        } else {
            Err(ProviderError::new(
                UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID {requested:#x}. The node serves {current:#x}."),
            ))
        }
    }

    /// Poll the node for chain/account changes and reachability, emitting wallet events.
    /// Replaces any previously running watcher.
    pub fn watch(self: &Arc<Self>, interval: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(watch_loop(weak, interval));
        let mut slot = self.watcher.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    pub fn stop_watching(&self) {
        let mut slot = self.watcher.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for HttpProvider {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

/// What the watcher has seen of the node so far.
#[derive(Debug)]
struct WatchState {
    last_chain: Option<u64>,
    last_accounts: Option<Vec<String>>,
    reachable: bool,
}

impl Default for WatchState {
    fn default() -> Self {
        Self {
            last_chain: None,
            last_accounts: None,
            reachable: true,
        }
    }
}

impl WatchState {
    /// Record an `eth_chainId` poll. Losing the node emits `Disconnect`; getting
    /// it back, or seeing a different chain, emits `ChainChanged`.
    fn observe_chain(&mut self, result: Result<u64, ProviderError>) -> Option<WalletEvent> {
        match result {
            Ok(chain_id) => {
                let previous = self.last_chain.replace(chain_id);
                let recovered = !self.reachable;
                self.reachable = true;
                if recovered || previous.is_some_and(|c| c != chain_id) {
                    Some(WalletEvent::ChainChanged(format!("{chain_id:#x}")))
                } else {
                    None
                }
            }
            Err(e) if e.code == DISCONNECTED => {
                if self.reachable {
                    self.reachable = false;
                    Some(WalletEvent::Disconnect(Some(e)))
                } else {
                    None
                }
            }
            Err(_) => None,
        }
    }

    /// Record an `eth_accounts` poll. The first sample only sets the baseline.
    fn observe_accounts(&mut self, accounts: Vec<String>) -> Option<WalletEvent> {
        let changed = self.last_accounts.as_ref().is_some_and(|a| *a != accounts);
        self.last_accounts = Some(accounts.clone());
        changed.then(|| WalletEvent::AccountsChanged(accounts))
    }
}

async fn watch_loop(provider: Weak<HttpProvider>, interval: Duration) {
    let mut state = WatchState::default();

    loop {
        let Some(p) = provider.upgrade() else {
            break;
        };

        let chain = p.call("eth_chainId", json!([])).await.and_then(|v| parse_quantity(&v));
        match &chain {
            Err(e) if e.code != DISCONNECTED => tracing::debug!(error = %e, "chain id poll failed"),
            _ => {}
        }
        let was_reachable = state.reachable;
        let event = state.observe_chain(chain);
        if was_reachable != state.reachable {
            if state.reachable {
                tracing::info!(url = %p.url, "node reachable again");
            } else {
                tracing::warn!(url = %p.url, "node unreachable");
            }
        }
        if let Some(event) = event {
            let _ = p.events.send(event);
        }

        if state.reachable {
            match p.accounts().await {
                Ok(accounts) => {
                    if let Some(event) = state.observe_accounts(accounts) {
                        let _ = p.events.send(event);
                    }
                }
                Err(e) => tracing::debug!(error = %e, "accounts poll failed"),
            }
        }

        drop(p);
        tokio::time::sleep(interval).await;
    }
}

#[async_trait]
impl Eip1193Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "eth_requestAccounts" => {
                let accounts = self.accounts().await?;
                Ok(json!(accounts))
            }
            "wallet_switchEthereumChain" => self.switch_chain(&params).await,
            _ => self.call(method, params).await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
