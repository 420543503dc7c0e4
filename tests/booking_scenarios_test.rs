use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use venue_booking::core::payment::format_native_amount;
use venue_booking::core::WalletSession;
use venue_booking::domain::model::{BookingState, CommitmentLevel, PaymentFailure, WalletAddress};
use venue_booking::{
    BookingError, BookingWorkflow, LogSink, PaymentSubmitter, SimulatedBehavior, SimulatedWallet,
    StaticCatalog,
};

const DESTINATION: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
const PAYER: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

fn setup(
    behavior: SimulatedBehavior,
    timeout: Duration,
) -> (
    BookingWorkflow<StaticCatalog, SimulatedWallet, LogSink>,
    Arc<SimulatedWallet>,
) {
    let wallet = Arc::new(SimulatedWallet::new(WalletAddress(PAYER.to_string()), behavior));
    let submitter = PaymentSubmitter::new(wallet.clone(), CommitmentLevel::Processed, timeout);
    let workflow = BookingWorkflow::new(
        StaticCatalog::bundled(),
        submitter,
        LogSink::quiet(),
        WalletAddress(DESTINATION.to_string()),
    );
    (workflow, wallet)
}

#[tokio::test]
async fn test_scenario_a_pays_twenty_ringgit() {
    let (workflow, wallet) = setup(SimulatedBehavior::Approve, Duration::from_secs(5));
    assert_ok!(wallet.connect().await);

    assert_ok!(workflow.open_booking(1).await);
    assert_ok!(workflow.toggle_item("Nasi Lemak").await);
    assert_ok!(workflow.toggle_item("Chicken Rendang").await);

    let quote = workflow.current_quote().await.unwrap();
    assert_eq!(quote.quote_total, dec!(20));
    assert_eq!(format_native_amount(quote.lamports), "0.2000");

    let receipt = workflow.submit_payment().await.unwrap();
    assert_eq!(receipt.quote.lamports, 200_000_000);

    let sent = wallet.sent_transfers();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from.as_str(), PAYER);
    assert_eq!(sent[0].to.as_str(), DESTINATION);

    assert_ok!(workflow.set_schedule("2099-01-01", "19:00").await);
    let record = workflow.commit().await.unwrap();
    assert_eq!(record.signature, receipt.signature);
    assert_eq!(workflow.state().await, BookingState::Idle);
}

#[tokio::test]
async fn test_scenario_b_toggle_after_payment_blocks_commit() {
    let (workflow, wallet) = setup(SimulatedBehavior::Approve, Duration::from_secs(5));
    assert_ok!(wallet.connect().await);

    assert_ok!(workflow.open_booking(1).await);
    assert_ok!(workflow.toggle_item("Nasi Lemak").await);
    assert_ok!(workflow.toggle_item("Chicken Rendang").await);
    assert_ok!(workflow.set_schedule("2099-01-01", "19:00").await);
    assert_ok!(workflow.submit_payment().await);

    assert_ok!(workflow.toggle_item("Nasi Lemak").await);
    assert_eq!(workflow.state().await, BookingState::SelectingMenu);

    let err = assert_err!(workflow.commit().await);
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
    assert_eq!(workflow.state().await, BookingState::SelectingMenu);
}

#[tokio::test]
async fn test_scenario_c_empty_selection_rejected() {
    let (workflow, wallet) = setup(SimulatedBehavior::Approve, Duration::from_secs(5));
    assert_ok!(wallet.connect().await);
    assert_ok!(workflow.open_booking(2).await);

    let err = assert_err!(workflow.submit_payment().await);
    assert!(matches!(err, BookingError::EmptySelection));
    assert!(wallet.sent_transfers().is_empty());
}

#[tokio::test]
async fn test_disconnected_wallet_rejected() {
    let (workflow, wallet) = setup(SimulatedBehavior::Approve, Duration::from_secs(5));
    assert_ok!(workflow.open_booking(2).await);
    assert_ok!(workflow.toggle_item("Laksa").await);

    let err = assert_err!(workflow.submit_payment().await);
    assert!(matches!(err, BookingError::WalletNotConnected));

    // connecting later unblocks payment
    assert_ok!(wallet.connect().await);
    assert_ok!(workflow.submit_payment().await);

    // a disconnect after confirmation does not undo the payment
    wallet.disconnect().await;
    assert_eq!(workflow.state().await, BookingState::PaymentConfirmed);
}

#[tokio::test]
async fn test_user_rejects_signing() {
    let (workflow, wallet) = setup(SimulatedBehavior::RejectSigning, Duration::from_secs(5));
    assert_ok!(wallet.connect().await);
    assert_ok!(workflow.open_booking(3).await);
    assert_ok!(workflow.toggle_item("Curry Mee").await);

    let err = assert_err!(workflow.submit_payment().await);
    assert!(matches!(
        err,
        BookingError::PaymentFailed {
            reason: PaymentFailure::UserRejected
        }
    ));
    assert_eq!(workflow.state().await, BookingState::SelectingMenu);
    assert_eq!(workflow.current_attempt().await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_confirmation_timeout_surfaces_payment_failure() {
    let (workflow, wallet) = setup(SimulatedBehavior::NeverConfirm, Duration::from_millis(50));
    assert_ok!(wallet.connect().await);
    assert_ok!(workflow.open_booking(4).await);
    assert_ok!(workflow.toggle_item("Croissant").await);

    let err = assert_err!(workflow.submit_payment().await);
    assert!(matches!(
        err,
        BookingError::PaymentFailed {
            reason: PaymentFailure::Timeout
        }
    ));
    assert_eq!(workflow.state().await, BookingState::SelectingMenu);
    // the transfer was sent once and not retried
    assert_eq!(wallet.sent_transfers().len(), 1);
}

#[tokio::test]
async fn test_second_payment_while_awaiting_confirmation() {
    let wallet = Arc::new(
        SimulatedWallet::new(WalletAddress(PAYER.to_string()), SimulatedBehavior::Approve)
            .with_confirmation_delay(Duration::from_millis(100)),
    );
    let submitter =
        PaymentSubmitter::new(wallet.clone(), CommitmentLevel::Processed, Duration::from_secs(5));
    let workflow = Arc::new(BookingWorkflow::new(
        StaticCatalog::bundled(),
        submitter,
        LogSink::quiet(),
        WalletAddress(DESTINATION.to_string()),
    ));
    assert_ok!(wallet.connect().await);
    assert_ok!(workflow.open_booking(1).await);
    assert_ok!(workflow.toggle_item("Ayam Kecap").await);

    let first = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit_payment().await }
    });

    while workflow.state().await != BookingState::AwaitingPayment {
        tokio::task::yield_now().await;
    }
    let err = assert_err!(workflow.submit_payment().await);
    assert!(matches!(err, BookingError::OperationInProgress));

    assert_ok!(first.await.unwrap());
    assert_eq!(wallet.sent_transfers().len(), 1);
    assert_eq!(workflow.state().await, BookingState::PaymentConfirmed);
}
