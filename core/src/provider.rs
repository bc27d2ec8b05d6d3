/// EIP-1193 provider abstraction: the injected wallet the session talks to.
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// User rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// The requested method or account has not been authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// The provider is disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;
/// `wallet_switchEthereumChain` target is not registered in the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC internal error.
pub const INTERNAL_ERROR: i64 = -32603;

/// Error returned by a provider `request`, carrying the EIP-1193 / JSON-RPC code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED, "User rejected the request.")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN
    }

    /// Nodes and wallets report this as -32000/-32603 with a message, not a dedicated code.
    pub fn is_insufficient_funds(&self) -> bool {
        self.message.to_lowercase().contains("insufficient funds")
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ProviderError {}

/// Wallet-originated notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    /// Hex chain id, e.g. `0xaa36a7`.
    ChainChanged(String),
    Disconnect(Option<ProviderError>),
}

#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Forward a JSON-RPC style request to the wallet.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to wallet events. Every call returns an independent receiver.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
