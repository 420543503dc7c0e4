use chrono::{NaiveDate, NaiveTime};
use httpmock::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use venue_booking::core::ReservationSink;
use venue_booking::core::WalletSession;
use venue_booking::domain::model::{
    AttemptId, BookingRecord, BookingState, CommitmentLevel, MenuItem, WalletAddress,
};
use venue_booking::{
    BookingError, BookingWorkflow, HttpSink, PaymentSubmitter, SimulatedBehavior, SimulatedWallet,
    StaticCatalog,
};

const DESTINATION: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

fn record() -> BookingRecord {
    BookingRecord {
        attempt: AttemptId(1),
        venue_id: 2,
        venue_name: "Kedai Makan Suki".to_string(),
        date: NaiveDate::from_ymd_opt(2099, 3, 1).unwrap(),
        time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        items: vec![MenuItem::new("Laksa", dec!(9))],
        total: dec!(9),
        lamports: 90_000_000,
        signature: "sim000000000001".to_string(),
    }
}

#[tokio::test]
async fn test_http_sink_posts_booking_json() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/bookings")
                .json_body_partial(r#"{"venue_name": "Kedai Makan Suki", "lamports": 90000000}"#);
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"reference": "RSV-42"}));
        })
        .await;

    let sink = HttpSink::new(server.url("/bookings"), Duration::from_secs(5)).unwrap();
    let ack = sink.commit(&record()).await.unwrap();

    api_mock.assert_async().await;
    assert_eq!(ack.reference.as_deref(), Some("RSV-42"));
}

#[tokio::test]
async fn test_http_sink_empty_body_is_ack() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/bookings");
            then.status(204);
        })
        .await;

    let sink = HttpSink::new(server.url("/bookings"), Duration::from_secs(5)).unwrap();
    let ack = sink.commit(&record()).await.unwrap();

    api_mock.assert_async().await;
    assert!(ack.reference.is_none());
}

#[tokio::test]
async fn test_http_sink_server_error() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/bookings");
            then.status(503).body("maintenance");
        })
        .await;

    let sink = HttpSink::new(server.url("/bookings"), Duration::from_secs(5)).unwrap();
    let result = sink.commit(&record()).await;

    api_mock.assert_async().await;
    match result {
        Err(BookingError::ReservationCommitFailed { message }) => {
            assert!(message.contains("503"));
            assert!(message.contains("maintenance"));
        }
        other => panic!("expected commit failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_commit_retry_after_sink_outage_does_not_repay() {
    let server = MockServer::start_async().await;
    let mut outage = server
        .mock_async(|when, then| {
            when.method(POST).path("/bookings");
            then.status(500);
        })
        .await;

    let wallet = Arc::new(SimulatedWallet::new(
        WalletAddress("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T".to_string()),
        SimulatedBehavior::Approve,
    ));
    let submitter =
        PaymentSubmitter::new(wallet.clone(), CommitmentLevel::Processed, Duration::from_secs(5));
    let sink = HttpSink::new(server.url("/bookings"), Duration::from_secs(5)).unwrap();
    let workflow = BookingWorkflow::new(
        StaticCatalog::bundled(),
        submitter,
        sink,
        WalletAddress(DESTINATION.to_string()),
    );

    wallet.connect().await.unwrap();
    workflow.open_booking(2).await.unwrap();
    workflow.toggle_item("Laksa").await.unwrap();
    workflow.toggle_item("Bakso").await.unwrap();
    workflow.submit_payment().await.unwrap();
    workflow.set_schedule("2099-03-01", "20:00").await.unwrap();

    let err = workflow.commit().await.unwrap_err();
    assert!(matches!(err, BookingError::ReservationCommitFailed { .. }));
    assert_eq!(workflow.state().await, BookingState::PaymentConfirmed);
    outage.assert_async().await;
    outage.delete_async().await;

    let recovered = server
        .mock_async(|when, then| {
            when.method(POST).path("/bookings");
            then.status(200).json_body(serde_json::json!({"reference": "RSV-7"}));
        })
        .await;

    let record = workflow.commit().await.unwrap();
    recovered.assert_async().await;
    assert_eq!(record.total, dec!(17));
    assert_eq!(wallet.sent_transfers().len(), 1);
    assert_eq!(workflow.state().await, BookingState::Idle);
}
