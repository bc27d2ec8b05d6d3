mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use payhub_core::{
    AttemptStatus, Eip1193Provider, PaymentError, PaymentForm, PaymentSubmitter, ProviderError,
    SessionConfig, SessionManager, ToastKind, U256,
};
use tokio::sync::Notify;

#[tokio::test]
async fn successful_payment() {
    let wallet = MockWallet::new();
    let (session, payments, notifier) = connected(&wallet).await;
    assert_eq!(wallet.count("eth_getBalance"), 1);

    let hash = payments.submit(RECIPIENT, "0.01").await.unwrap();
    assert_eq!(hash.to_string(), TX_HASH);

    let attempt = payments.current_attempt().unwrap();
    assert_eq!(attempt.id, "send-tx-1");
    assert_eq!(attempt.status, AttemptStatus::Succeeded);
    assert_eq!(
        attempt.history,
        vec![
            AttemptStatus::Validating,
            AttemptStatus::Submitted,
            AttemptStatus::Confirming,
            AttemptStatus::Succeeded,
        ]
    );
    assert_eq!(attempt.value, Some(U256::from(10_000_000_000_000_000u64)));
    assert!(attempt.error.is_none());

    let tx = wallet.state().last_transaction.clone().unwrap();
    assert_eq!(tx["to"], RECIPIENT);
    assert_eq!(tx["value"], "0x2386f26fc10000");
    assert_eq!(
        tx["from"].as_str().unwrap().to_lowercase(),
        ACCOUNT.to_lowercase()
    );

    // Balance refreshed exactly once after confirmation; form cleared.
    assert_eq!(wallet.count("eth_getBalance"), 2);
    assert_eq!(payments.form(), PaymentForm::default());
    assert!(!payments.is_busy());
    assert!(session.snapshot().is_connected());

    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 3);
    assert!(toasts.iter().all(|t| t.id == "send-tx-1"));
    assert_eq!(toasts[0].kind, ToastKind::Pending);
    assert_eq!(toasts[0].description, "Sending 0.01 ETH to 0x1111...");
    assert_eq!(toasts[0].duration, None);
    assert_eq!(toasts[1].title, "Transaction Initiated");
    assert_eq!(toasts[1].duration, None);
    assert!(toasts[1].link.as_deref().unwrap().starts_with("https://sepolia.etherscan.io/tx/"));
    assert_eq!(toasts[2].kind, ToastKind::Success);
    assert_eq!(toasts[2].title, "Payment Successful!");
    assert_eq!(toasts[2].description, "Successfully sent 0.01 ETH.");
    assert_eq!(toasts[2].duration, Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let wallet = MockWallet::new();
    let (_session, payments, notifier) = connected(&wallet).await;

    let err = payments.submit(RECIPIENT, "0").await.unwrap_err();
    assert_eq!(
        err,
        PaymentError::InvalidAmount("Amount must be greater than 0".into())
    );

    let attempt = payments.current_attempt().unwrap();
    assert_eq!(attempt.status, AttemptStatus::Validating);
    assert_eq!(attempt.history, vec![AttemptStatus::Validating]);
    assert_eq!(attempt.error, Some(err));
    assert_eq!(wallet.count("eth_sendTransaction"), 0);

    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert_eq!(toasts[0].title, "Invalid Amount");
    assert_eq!(toasts[0].duration, Some(Duration::from_secs(8)));

    // The form keeps what was entered.
    assert_eq!(payments.form().amount, "0");
}

#[tokio::test]
async fn malformed_amounts_are_rejected() {
    let wallet = MockWallet::new();
    let (_session, payments, _notifier) = connected(&wallet).await;

    for amount in ["", "abc", "-1", "1.2.3", "0.0000000000000000001"] {
        let err = payments.submit(RECIPIENT, amount).await.unwrap_err();
        assert!(
            matches!(err, PaymentError::InvalidAmount(_)),
            "{amount:?} gave {err:?}"
        );
    }
    assert_eq!(wallet.count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn malformed_recipients_are_rejected() {
    let wallet = MockWallet::new();
    let (_session, payments, notifier) = connected(&wallet).await;

    for recipient in [
        "",
        "0x123",
        "hello",
        "1111111111111111111111111111111111111111",
        "0x111111111111111111111111111111111111111g",
        "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA9604X",
    ] {
        let err = payments.submit(recipient, "0.01").await.unwrap_err();
        assert!(
            matches!(err, PaymentError::InvalidAddress(_)),
            "{recipient:?} gave {err:?}"
        );
    }
    assert_eq!(wallet.count("eth_sendTransaction"), 0);
    assert!(notifier.toasts().iter().all(|t| t.title == "Invalid Address"));
}

#[tokio::test]
async fn bad_checksum_is_rejected() {
    let wallet = MockWallet::new();
    let (_session, payments, _notifier) = connected(&wallet).await;

    let bad = "0xFb6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    let err = payments.submit(bad, "0.01").await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidAddress(_)));
}

#[tokio::test]
async fn self_transfer_in_any_letter_case() {
    let wallet = MockWallet::new();
    let (_session, payments, notifier) = connected(&wallet).await;

    let upper = format!("0x{}", ACCOUNT[2..].to_uppercase());
    let mixed_bad = ACCOUNT_CHECKSUMMED.replacen("dA", "Da", 1);
    for recipient in [ACCOUNT, ACCOUNT_CHECKSUMMED, upper.as_str(), mixed_bad.as_str()] {
        let err = payments.submit(recipient, "0.01").await.unwrap_err();
        assert_eq!(err, PaymentError::SelfTransfer, "{recipient}");
    }
    assert_eq!(wallet.count("eth_sendTransaction"), 0);
    assert_eq!(notifier.toasts()[0].title, "Self-Transaction");
}

#[tokio::test]
async fn not_connected() {
    let wallet = MockWallet::new();
    let session = manager(&wallet);
    let notifier = Arc::new(RecordingNotifier::default());
    let payments = PaymentSubmitter::new(session, notifier.clone());

    let err = payments.submit(RECIPIENT, "0.01").await.unwrap_err();
    assert_eq!(err, PaymentError::NotConnected);
    assert_eq!(wallet.count("eth_sendTransaction"), 0);
    assert_eq!(notifier.toasts().len(), 1);
}

#[tokio::test]
async fn reverted_payment() {
    let wallet = MockWallet::with(|s| s.receipt_success = false);
    let (_session, payments, notifier) = connected(&wallet).await;

    let err = payments.submit(RECIPIENT, "0.5").await.unwrap_err();
    assert_eq!(err, PaymentError::OnChainRevert);

    let attempt = payments.current_attempt().unwrap();
    assert_eq!(attempt.status, AttemptStatus::Failed);
    assert_eq!(
        attempt.history,
        vec![
            AttemptStatus::Validating,
            AttemptStatus::Submitted,
            AttemptStatus::Confirming,
            AttemptStatus::Failed,
        ]
    );
    assert!(attempt.hash.is_some());

    // No balance refresh and the form is kept.
    assert_eq!(wallet.count("eth_getBalance"), 1);
    assert_eq!(
        payments.form(),
        PaymentForm {
            recipient: RECIPIENT.into(),
            amount: "0.5".into(),
        }
    );

    let last = notifier.toasts().pop().unwrap();
    assert_eq!(last.kind, ToastKind::Error);
    assert_eq!(last.title, "Transaction Failed");
    assert_eq!(last.duration, Some(Duration::from_secs(8)));
    assert!(last.link.is_some());
}

#[tokio::test]
async fn user_rejects_transaction() {
    let wallet = MockWallet::with(|s| s.send_error = Some(ProviderError::user_rejected()));
    let (session, payments, notifier) = connected(&wallet).await;

    let err = payments.submit(RECIPIENT, "0.01").await.unwrap_err();
    assert_eq!(err, PaymentError::UserRejected);

    let attempt = payments.current_attempt().unwrap();
    assert_eq!(
        attempt.history,
        vec![AttemptStatus::Validating, AttemptStatus::Failed]
    );
    assert!(attempt.hash.is_none());
    assert!(session.snapshot().is_connected());
    assert_eq!(notifier.toasts().pop().unwrap().title, "Transaction Rejected");
}

#[tokio::test]
async fn insufficient_funds() {
    let wallet = MockWallet::with(|s| {
        s.send_error = Some(ProviderError::new(
            -32000,
            "insufficient funds for gas * price + value",
        ));
    });
    let (_session, payments, notifier) = connected(&wallet).await;

    let err = payments.submit(RECIPIENT, "100").await.unwrap_err();
    assert_eq!(err, PaymentError::InsufficientFunds);
    assert_eq!(notifier.toasts().pop().unwrap().title, "Insufficient Funds");
}

#[tokio::test]
async fn other_submission_errors_keep_message() {
    let wallet = MockWallet::with(|s| {
        s.send_error = Some(ProviderError::new(-32000, "nonce too low"));
    });
    let (_session, payments, notifier) = connected(&wallet).await;

    let err = payments.submit(RECIPIENT, "0.01").await.unwrap_err();
    assert_eq!(err, PaymentError::Submission("nonce too low".into()));

    let last = notifier.toasts().pop().unwrap();
    assert_eq!(last.title, "Payment Failed");
    assert_eq!(last.description, "nonce too low");
}

#[tokio::test]
async fn submit_form_uses_entered_fields() {
    let wallet = MockWallet::new();
    let (_session, payments, _notifier) = connected(&wallet).await;

    payments.set_recipient(RECIPIENT);
    payments.set_amount("0.25");
    payments.submit_form().await.unwrap();

    assert!(payments.form().is_empty());
    let tx = wallet.state().last_transaction.clone().unwrap();
    assert_eq!(tx["value"], "0x3782dace9d90000");
}

#[tokio::test]
async fn attempt_ids_increase() {
    let wallet = MockWallet::new();
    let (_session, payments, _notifier) = connected(&wallet).await;

    payments.submit(RECIPIENT, "0.01").await.unwrap();
    payments.submit(RECIPIENT, "0.02").await.unwrap();
    assert_eq!(payments.current_attempt().unwrap().id, "send-tx-2");
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let release = Arc::new(Notify::new());
    let hold = release.clone();
    let wallet = MockWallet::with(move |s| s.hold_receipt = Some(hold));
    let (_session, payments, notifier) = connected(&wallet).await;
    let payments = Arc::new(payments);

    let mut attempts = payments.subscribe();
    let first = tokio::spawn({
        let payments = payments.clone();
        async move { payments.submit(RECIPIENT, "0.01").await }
    });

    attempts
        .wait_for(|a| a.as_ref().is_some_and(|a| a.status == AttemptStatus::Confirming))
        .await
        .unwrap();
    assert!(payments.is_busy());

    let err = payments.submit(RECIPIENT, "0.02").await.unwrap_err();
    assert_eq!(err, PaymentError::AttemptInFlight);
    assert_eq!(wallet.count("eth_sendTransaction"), 1);
    assert!(notifier
        .toasts()
        .iter()
        .any(|t| t.title == "Payment In Progress"));

    release.notify_one();
    first.await.unwrap().unwrap();
    assert!(!payments.is_busy());

    wallet.state().hold_receipt = None;
    payments.submit(RECIPIENT, "0.02").await.unwrap_or_else(|e| {
        panic!("submit after completion failed: {e}");
    });
}

#[tokio::test]
async fn unconfirmed_payment_times_out() {
    let wallet = MockWallet::with(|s| s.hold_receipt = Some(Arc::new(Notify::new())));
    let provider: Arc<dyn Eip1193Provider> = wallet.clone();
    let session = SessionManager::new(
        Some(provider),
        SessionConfig {
            receipt_timeout: Some(Duration::from_millis(50)),
            ..config()
        },
    );
    session.connect().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let payments = PaymentSubmitter::new(session, notifier.clone());

    let err = payments.submit(RECIPIENT, "0.01").await.unwrap_err();
    assert_eq!(
        err,
        PaymentError::Submission("Transaction not confirmed within 50ms.".into())
    );

    let attempt = payments.current_attempt().unwrap();
    assert_eq!(attempt.status, AttemptStatus::Failed);
    assert!(attempt.hash.is_some());
    assert!(!payments.is_busy());

    let last = notifier.toasts().pop().unwrap();
    assert_eq!(last.title, "Payment Failed");
    assert!(last.link.is_some());
}
