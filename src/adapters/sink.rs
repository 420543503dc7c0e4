use crate::core::payment::{format_quote_amount, QUOTE_CURRENCY};
use crate::domain::model::{BookingRecord, SinkAck};
use crate::domain::ports::ReservationSink;
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Human readable confirmation, one line for the booking and one for the menu.
pub fn booking_summary(record: &BookingRecord) -> String {
    let menu = record
        .items
        .iter()
        .map(|item| format!("{} ({}{})", item.name, QUOTE_CURRENCY, item.price.normalize()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Booked at {} on {} at {}\nMenu: {}\nTotal: {} {}",
        record.venue_name,
        record.date,
        record.time.format("%H:%M"),
        menu,
        QUOTE_CURRENCY,
        format_quote_amount(record.total)
    )
}

/// 本地通知：寫入日誌並印到標準輸出
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    quiet: bool,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs only, nothing on stdout.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ReservationSink for LogSink {
    async fn commit(&self, record: &BookingRecord) -> Result<SinkAck> {
        let summary = booking_summary(record);
        tracing::info!(
            attempt = %record.attempt,
            venue = %record.venue_name,
            signature = %record.signature,
            "📅 Reservation committed"
        );
        if !self.quiet {
            println!("{}", summary);
        }
        Ok(SinkAck { reference: None })
    }
}

/// Posts the booking as JSON to a reservation service.
#[derive(Debug, Clone)]
pub struct HttpSink {
    endpoint: String,
    client: Client,
}

impl HttpSink {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReservationSink for HttpSink {
    async fn commit(&self, record: &BookingRecord) -> Result<SinkAck> {
        tracing::debug!("Posting reservation {} to: {}", record.attempt, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| BookingError::ReservationCommitFailed {
                message: e.to_string(),
            })?;

        let status = response.status();
        tracing::debug!("Reservation service response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BookingError::ReservationCommitFailed {
                message: format!("{} {}", status, body.trim()),
            });
        }

        // 服務可回傳 {"reference": "..."}，空回應也視為成功
        let body = response.text().await.unwrap_or_default();
        let reference = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| json.get("reference").and_then(|r| r.as_str()).map(String::from));

        Ok(SinkAck { reference })
    }
}
