//! Scripted EIP-1193 wallet for driving the session and payment flows.
#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use payhub_core::provider::{DISCONNECTED, INTERNAL_ERROR, UNRECOGNIZED_CHAIN};
use payhub_core::{
    Eip1193Provider, PaymentSubmitter, ProviderError, SessionConfig, SessionManager, Toast,
    WalletEvent, U256,
};
use payhub_core::notify::Notifier;
use serde_json::{json, Value};
use tokio::sync::{broadcast, Notify};

pub const ACCOUNT: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";
pub const ACCOUNT_CHECKSUMMED: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
pub const OTHER_ACCOUNT: &str = "0x2222222222222222222222222222222222222222";
pub const RECIPIENT: &str = "0x1111111111111111111111111111111111111111";
pub const TX_HASH: &str = "0xabababababababababababababababababababababababababababababababab";

pub const MAINNET: u64 = 1;
pub const SEPOLIA: u64 = 11_155_111;
pub const HOLESKY: u64 = 17_000;

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchBehavior {
    /// Switch if the chain is known, otherwise 4902.
    Apply,
    /// User declines (4001).
    Reject,
    /// Report success without changing the chain.
    Ignore,
    /// Fail with a generic provider error.
    Fail(String),
}

#[derive(Debug)]
pub struct MockState {
    pub accounts: Vec<String>,
    pub chain_id: u64,
    pub known_chains: Vec<u64>,
    pub switch: SwitchBehavior,
    /// Emit `chainChanged` after a successful switch, like a real wallet.
    pub emit_chain_changed: bool,
    pub request_accounts_error: Option<ProviderError>,
    /// When set, account requests wait for this to be notified.
    pub hold_request_accounts: Option<Arc<Notify>>,
    pub balance: U256,
    pub fail_balance: bool,
    pub send_error: Option<ProviderError>,
    pub receipt_success: bool,
    /// When set, receipt lookups wait for this to be notified.
    pub hold_receipt: Option<Arc<Notify>>,
    pub last_transaction: Option<Value>,
    pub calls: Vec<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            accounts: vec![ACCOUNT.to_string()],
            chain_id: SEPOLIA,
            known_chains: vec![MAINNET, SEPOLIA],
            switch: SwitchBehavior::Apply,
            emit_chain_changed: false,
            request_accounts_error: None,
            hold_request_accounts: None,
            balance: U256::from(2_000_000_000_000_000_000u64),
            fail_balance: false,
            send_error: None,
            receipt_success: true,
            hold_receipt: None,
            last_transaction: None,
            calls: Vec::new(),
        }
    }
}

pub struct MockWallet {
    state: Mutex<MockState>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Self::with(|_| {})
    }

    pub fn with(f: impl FnOnce(&mut MockState)) -> Arc<Self> {
        let mut state = MockState::default();
        f(&mut state);
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(state),
            events,
        })
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    /// Number of requests made for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|m| *m == method).count()
    }
}

fn hex(n: u64) -> String {
    format!("{n:#x}")
}

#[async_trait]
impl Eip1193Provider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if method == "eth_requestAccounts" {
            let hold = self.state().hold_request_accounts.clone();
            if let Some(notify) = hold {
                notify.notified().await;
            }
        }

        let hold = {
            let mut state = self.state();
            state.calls.push(method.to_string());
            match method {
                "eth_requestAccounts" => {
                    if let Some(err) = state.request_accounts_error.clone() {
                        return Err(err);
                    }
                    return Ok(json!(state.accounts));
                }
                "eth_accounts" => return Ok(json!(state.accounts)),
                "eth_chainId" => return Ok(json!(hex(state.chain_id))),
                "wallet_switchEthereumChain" => {
                    let requested = params[0]["chainId"]
                        .as_str()
                        .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                        .ok_or_else(|| ProviderError::internal("bad chainId"))?;
                    match state.switch.clone() {
                        SwitchBehavior::Reject => return Err(ProviderError::user_rejected()),
                        SwitchBehavior::Fail(msg) => {
                            return Err(ProviderError::new(INTERNAL_ERROR, msg))
                        }
                        SwitchBehavior::Ignore => return Ok(Value::Null),
                        SwitchBehavior::Apply => {
                            if !state.known_chains.contains(&requested) {
                                return Err(ProviderError::new(
                                    UNRECOGNIZED_CHAIN,
                                    "Unrecognized chain ID",
                                ));
                            }
                            state.chain_id = requested;
                            if state.emit_chain_changed {
                                let _ = self.events.send(WalletEvent::ChainChanged(hex(requested)));
                            }
                            return Ok(Value::Null);
                        }
                    }
                }
                "eth_getBalance" => {
                    if state.fail_balance {
                        return Err(ProviderError::new(DISCONNECTED, "balance unavailable"));
                    }
                    return Ok(json!(format!("0x{:x}", state.balance)));
                }
                "eth_sendTransaction" => {
                    state.last_transaction = Some(params[0].clone());
                    if let Some(err) = state.send_error.clone() {
                        return Err(err);
                    }
                    return Ok(json!(TX_HASH));
                }
                "eth_blockNumber" => return Ok(json!("0x10")),
                "eth_getTransactionReceipt" => state.hold_receipt.clone(),
                other => {
                    return Err(ProviderError::new(-32601, format!("method {other} not found")))
                }
            }
        };

        if let Some(notify) = hold {
            notify.notified().await;
        }
        let success = self.state().receipt_success;
        Ok(json!({
            "transactionHash": TX_HASH,
            "blockNumber": "0x10",
            "status": if success { "0x1" } else { "0x0" },
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// Notifier that records every toast.
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

pub fn config() -> SessionConfig {
    SessionConfig {
        receipt_poll_interval: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

pub fn manager(wallet: &Arc<MockWallet>) -> Arc<SessionManager> {
    let provider: Arc<dyn Eip1193Provider> = wallet.clone();
    SessionManager::new(Some(provider), config())
}

pub async fn connected(
    wallet: &Arc<MockWallet>,
) -> (Arc<SessionManager>, PaymentSubmitter, Arc<RecordingNotifier>) {
    let session = manager(wallet);
    session.connect().await.expect("connect should succeed");
    let notifier = Arc::new(RecordingNotifier::default());
    let payments = PaymentSubmitter::new(session.clone(), notifier.clone());
    (session, payments, notifier)
}

/// Let spawned listener tasks run until the session settles.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
