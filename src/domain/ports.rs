use crate::domain::model::{
    BookingRecord, CommitmentLevel, ConfirmationStatus, SinkAck, TransactionHandle, TransferSpec,
    Venue, WalletAddress,
};
use crate::utils::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Source of bookable venues. Implementations backed by files or the network
/// report failures as `BookingError::CatalogUnavailable`.
pub trait CatalogProvider: Send + Sync {
    fn list_venues(&self) -> Result<Vec<Venue>>;
}

#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn connect(&self) -> std::result::Result<WalletAddress, WalletError>;
    async fn disconnect(&self);
    fn is_connected(&self) -> bool;
    fn address(&self) -> Option<WalletAddress>;
    async fn sign_and_send(
        &self,
        transfer: &TransferSpec,
    ) -> std::result::Result<TransactionHandle, WalletError>;
    async fn await_confirmation(
        &self,
        handle: &TransactionHandle,
        commitment: CommitmentLevel,
    ) -> std::result::Result<ConfirmationStatus, WalletError>;
}

#[async_trait]
pub trait ReservationSink: Send + Sync {
    async fn commit(&self, record: &BookingRecord) -> Result<SinkAck>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
