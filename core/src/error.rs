//! Domain error types for session and payment operations.

use thiserror::Error;

use crate::provider::ProviderError;

/// Session-level failures. Each of these (except `Superseded`) resets the
/// session to disconnected with the rendered message recorded as the reason.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// No injected wallet is available.
    #[error("No wallet provider detected. Install a browser wallet such as MetaMask.")]
    NoProvider,

    #[error("{0}")]
    UserRejected(String),

    /// The wallet does not know the target chain (4902). No auto-add is attempted.
    #[error("Network {0} not found in the wallet. Please add it manually.")]
    ChainNotRegistered(String),

    /// The wallet reports no account, or the active network could not be verified.
    #[error("{0}")]
    NetworkVerification(String),

    #[error("Wallet disconnected or locked.")]
    WalletLocked,

    #[error("Wallet disconnected.")]
    WalletDisconnected,

    /// Any other provider failure during connect or switch.
    #[error("{0}")]
    Connection(String),

    /// A newer connect/reset started while this one was in flight; its result was discarded.
    #[error("Superseded by a newer connection attempt.")]
    Superseded,
}

impl SessionError {
    /// Classify a provider failure raised while requesting accounts or querying the network.
    pub fn from_connect(err: &ProviderError) -> Self {
        if err.is_user_rejected() {
            SessionError::UserRejected("Connection request rejected.".into())
        } else if err.message.to_lowercase().contains("disconnected") {
            SessionError::Connection("Wallet disconnected during connection.".into())
        } else {
            SessionError::Connection(format!("Connection error: {}", err.message))
        }
    }

    /// Classify a `wallet_switchEthereumChain` failure.
    pub fn from_switch(err: &ProviderError, network_name: &str) -> Self {
        if err.is_unrecognized_chain() {
            SessionError::ChainNotRegistered(network_name.to_string())
        } else if err.is_user_rejected() {
            SessionError::UserRejected("Network switch request rejected by user.".into())
        } else {
            SessionError::Connection(format!("Failed to switch network: {}", err.message))
        }
    }
}

/// Payment-level failures. Validation variants never touch the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    #[error("Connect your wallet before sending a payment.")]
    NotConnected,

    #[error("{0}")]
    InvalidAddress(String),

    #[error("Cannot send funds to your own address.")]
    SelfTransfer,

    #[error("{0}")]
    InvalidAmount(String),

    /// The user declined the transaction in the wallet (4001).
    #[error("You cancelled the transaction in your wallet.")]
    UserRejected,

    #[error("Not enough ETH in your wallet for this transaction + gas.")]
    InsufficientFunds,

    /// Confirmed with a non-success status.
    #[error("The transaction was reverted on the blockchain.")]
    OnChainRevert,

    /// Any other submission or confirmation failure; keeps the raw message.
    #[error("{0}")]
    Submission(String),

    /// A previous attempt has not reached a terminal state yet.
    #[error("A payment is already in progress.")]
    AttemptInFlight,
}

impl PaymentError {
    pub fn from_provider(err: &ProviderError) -> Self {
        if err.is_user_rejected() {
            PaymentError::UserRejected
        } else if err.is_insufficient_funds() {
            PaymentError::InsufficientFunds
        } else {
            PaymentError::Submission(err.message.clone())
        }
    }

    /// Notification title for this failure.
    pub fn title(&self) -> &'static str {
        match self {
            PaymentError::NotConnected => "Missing Information",
            PaymentError::InvalidAddress(_) => "Invalid Address",
            PaymentError::SelfTransfer => "Self-Transaction",
            PaymentError::InvalidAmount(_) => "Invalid Amount",
            PaymentError::UserRejected => "Transaction Rejected",
            PaymentError::InsufficientFunds => "Insufficient Funds",
            PaymentError::OnChainRevert => "Transaction Failed",
            PaymentError::Submission(_) => "Payment Failed",
            PaymentError::AttemptInFlight => "Payment In Progress",
        }
    }

    /// Validation failures are raised before anything is sent to the wallet.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PaymentError::NotConnected
                | PaymentError::InvalidAddress(_)
                | PaymentError::SelfTransfer
                | PaymentError::InvalidAmount(_)
        )
    }
}
