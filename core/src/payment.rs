//! Payment submission: validate a recipient/amount pair, submit the transfer
//! through the session signer and track it to confirmation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, TxHash, U256};
use tokio::sync::watch;

use crate::address::{parse_address, parse_address_unchecked};
use crate::chain::explorer_tx_url;
use crate::display::parse_ether_amount;
use crate::error::PaymentError;
use crate::network::{NetworkClient, TransactionRequest};
use crate::notify::{Notifier, Toast};
use crate::session::{Session, SessionManager};
use crate::signer::Signer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Validating,
    Submitted,
    Confirming,
    Succeeded,
    Failed,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Succeeded | AttemptStatus::Failed)
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validating => write!(f, "validating"),
            Self::Submitted => write!(f, "submitted"),
            Self::Confirming => write!(f, "confirming"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One submit action. Rejected validation leaves it at `Validating` with `error` set.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionAttempt {
    pub id: String,
    pub recipient: String,
    pub amount: String,
    /// Amount in wei, known once validation passed.
    pub value: Option<U256>,
    pub status: AttemptStatus,
    /// Every status the attempt went through, in order.
    pub history: Vec<AttemptStatus>,
    pub hash: Option<TxHash>,
    pub error: Option<PaymentError>,
}

impl TransactionAttempt {
    fn new(id: String, recipient: &str, amount: &str) -> Self {
        Self {
            id,
            recipient: recipient.to_string(),
            amount: amount.to_string(),
            value: None,
            status: AttemptStatus::Validating,
            history: vec![AttemptStatus::Validating],
            hash: None,
            error: None,
        }
    }

    fn advance(&mut self, status: AttemptStatus) {
        self.status = status;
        self.history.push(status);
    }
}

/// The recipient/amount input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentForm {
    pub recipient: String,
    pub amount: String,
}

impl PaymentForm {
    pub fn is_empty(&self) -> bool {
        self.recipient.is_empty() && self.amount.is_empty()
    }
}

struct Validated {
    signer: Arc<dyn Signer>,
    client: NetworkClient,
    chain_id: u64,
    to: Address,
    value: U256,
}

/// Releases the in-flight flag when the attempt finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PaymentSubmitter {
    session: Arc<SessionManager>,
    notifier: Arc<dyn Notifier>,
    form: Mutex<PaymentForm>,
    attempt: watch::Sender<Option<TransactionAttempt>>,
    in_flight: AtomicBool,
    next_id: AtomicU64,
}

impl PaymentSubmitter {
    pub fn new(session: Arc<SessionManager>, notifier: Arc<dyn Notifier>) -> Self {
        let (attempt, _) = watch::channel(None);
        Self {
            session,
            notifier,
            form: Mutex::new(PaymentForm::default()),
            attempt,
            in_flight: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn form(&self) -> PaymentForm {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_recipient(&self, recipient: &str) {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).recipient = recipient.to_string();
    }

    pub fn set_amount(&self, amount: &str) {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).amount = amount.to_string();
    }

    fn clear_form(&self) {
        *self.form.lock().unwrap_or_else(|e| e.into_inner()) = PaymentForm::default();
    }

    /// True while an attempt is between submission and a terminal status.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn current_attempt(&self) -> Option<TransactionAttempt> {
        self.attempt.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TransactionAttempt>> {
        self.attempt.subscribe()
    }

    fn publish(&self, attempt: &TransactionAttempt) {
        self.attempt.send_replace(Some(attempt.clone()));
    }

    /// Submit whatever is currently in the form fields.
    pub async fn submit_form(&self) -> Result<TxHash, PaymentError> {
        let form = self.form();
        self.submit(&form.recipient, &form.amount).await
    }

    /// Validate and send `amount` ETH to `recipient`, then wait for one confirmation.
    /// Rejected while a previous attempt is still in flight.
    pub async fn submit(&self, recipient: &str, amount: &str) -> Result<TxHash, PaymentError> {
        let id = format!("send-tx-{}", self.next_id.fetch_add(1, Ordering::Relaxed));

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let err = PaymentError::AttemptInFlight;
            self.notifier.notify(Toast::error(&id, err.title(), err.to_string()));
            return Err(err);
        }
        let _guard = InFlight(&self.in_flight);

        {
            let mut form = self.form.lock().unwrap_or_else(|e| e.into_inner());
            form.recipient = recipient.to_string();
            form.amount = amount.to_string();
        }

        let recipient = recipient.trim();
        let amount = amount.trim();
        let mut attempt = TransactionAttempt::new(id.clone(), recipient, amount);
        self.publish(&attempt);

        let valid = match validate(&self.session.snapshot(), recipient, amount) {
            Ok(v) => v,
            Err(err) => {
                tracing::debug!(%id, error = %err, "payment rejected by validation");
                attempt.error = Some(err.clone());
                self.publish(&attempt);
                self.notifier.notify(Toast::error(&id, err.title(), err.to_string()));
                return Err(err);
            }
        };
        attempt.value = Some(valid.value);
        self.publish(&attempt);

        let short: String = recipient.chars().take(6).collect();
        self.notifier.notify(Toast::pending(
            &id,
            "Processing Transaction",
            format!("Sending {amount} ETH to {short}..."),
        ));

        let tx = TransactionRequest {
            to: valid.to,
            value: valid.value,
        };
        let hash = match valid.signer.send_transaction(&tx).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(%id, error = %e, "payment submission failed");
                return Err(self.fail(&mut attempt, PaymentError::from_provider(&e), None));
            }
        };

        let link = explorer_tx_url(valid.chain_id, &hash.to_string());
        attempt.hash = Some(hash);
        attempt.advance(AttemptStatus::Submitted);
        self.publish(&attempt);
        tracing::info!(%id, %hash, "payment submitted");
        self.notifier.notify(
            Toast::pending(&id, "Transaction Initiated", "Waiting for confirmation...")
                .with_link(Some(link.clone())),
        );

        attempt.advance(AttemptStatus::Confirming);
        self.publish(&attempt);
        let config = self.session.config();
        let wait = valid
            .client
            .wait_for_receipt(&hash, config.confirmations, config.receipt_poll_interval);
        let waited = match config.receipt_timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| limit),
            None => Ok(wait.await),
        };
        let receipt = match waited {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                tracing::warn!(%id, %hash, error = %e, "waiting for confirmation failed");
                return Err(self.fail(&mut attempt, PaymentError::from_provider(&e), Some(link)));
            }
            Err(limit) => {
                tracing::warn!(%id, %hash, ?limit, "payment not confirmed in time");
                let err =
                    PaymentError::Submission(format!("Transaction not confirmed within {limit:?}."));
                return Err(self.fail(&mut attempt, err, Some(link)));
            }
        };

        if !receipt.success {
            tracing::warn!(%id, %hash, "payment reverted on-chain");
            return Err(self.fail(&mut attempt, PaymentError::OnChainRevert, Some(link)));
        }

        attempt.advance(AttemptStatus::Succeeded);
        self.publish(&attempt);
        tracing::info!(%id, %hash, "payment confirmed");
        self.notifier.notify(
            Toast::success(&id, "Payment Successful!", format!("Successfully sent {amount} ETH."))
                .with_link(Some(link)),
        );

        self.clear_form();
        self.session.refresh_balance().await;
        Ok(hash)
    }

    fn fail(
        &self,
        attempt: &mut TransactionAttempt,
        err: PaymentError,
        link: Option<String>,
    ) -> PaymentError {
        attempt.error = Some(err.clone());
        attempt.advance(AttemptStatus::Failed);
        self.publish(attempt);
        self.notifier
            .notify(Toast::error(&attempt.id, err.title(), err.to_string()).with_link(link));
        err
    }
}

/// Fail-fast precondition checks, in order: connection, address shape,
/// self-transfer, address checksum, amount.
fn validate(session: &Session, recipient: &str, amount: &str) -> Result<Validated, PaymentError> {
    let (Some(signer), Some(client), Some(sender), true) = (
        session.signer(),
        session.client(),
        session.account,
        session.is_connected(),
    ) else {
        return Err(PaymentError::NotConnected);
    };

    let to = parse_address_unchecked(recipient).map_err(PaymentError::InvalidAddress)?;
    if to == sender {
        return Err(PaymentError::SelfTransfer);
    }
    parse_address(recipient).map_err(PaymentError::InvalidAddress)?;

    let value = parse_ether_amount(amount).map_err(PaymentError::InvalidAmount)?;
    if value.is_zero() {
        return Err(PaymentError::InvalidAmount(
            "Amount must be greater than 0".into(),
        ));
    }

    Ok(Validated {
        signer: signer.clone(),
        client: client.clone(),
        chain_id: session.network.as_ref().map(|n| n.chain_id).unwrap_or_default(),
        to,
        value,
    })
}
