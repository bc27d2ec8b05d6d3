pub mod address;
pub mod chain;
pub mod commands;
pub mod display;
pub mod error;
pub mod network;
pub mod notify;
pub mod payment;
pub mod provider;
pub mod session;
pub mod signer;

pub use chain::{Chain, SessionConfig};
pub use commands::Command;
pub use error::{PaymentError, SessionError};
pub use network::{HttpProvider, NetworkClient, NetworkInfo};
pub use notify::{LogNotifier, Notifier, Toast, ToastKind};
pub use payment::{AttemptStatus, PaymentForm, PaymentSubmitter, TransactionAttempt};
pub use provider::{Eip1193Provider, ProviderError, WalletEvent};
pub use session::{ConnectionState, Session, SessionManager};
pub use signer::{AccountSigner, Signer};

pub use alloy_primitives::{Address, TxHash, U256};
