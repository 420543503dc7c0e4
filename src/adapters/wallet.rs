use crate::domain::model::{
    CommitmentLevel, ConfirmationStatus, TransactionHandle, TransferSpec, WalletAddress,
};
use crate::domain::ports::WalletSession;
use crate::utils::error::WalletError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SimulatedBehavior {
    #[default]
    Approve,
    RejectSigning,
    FailConfirmation,
    NeverConfirm,
}

/// 行程內的模擬錢包，供 CLI 與測試使用
#[derive(Debug)]
pub struct SimulatedWallet {
    address: WalletAddress,
    behavior: SimulatedBehavior,
    confirmation_delay: Duration,
    connected: AtomicBool,
    next_signature: AtomicU64,
    sent: Mutex<Vec<TransferSpec>>,
}

impl SimulatedWallet {
    pub fn new(address: WalletAddress, behavior: SimulatedBehavior) -> Self {
        Self {
            address,
            behavior,
            confirmation_delay: Duration::ZERO,
            connected: AtomicBool::new(false),
            next_signature: AtomicU64::new(1),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Transfers that were signed and sent, in order.
    pub fn sent_transfers(&self) -> Vec<TransferSpec> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WalletSession for SimulatedWallet {
    async fn connect(&self) -> Result<WalletAddress, WalletError> {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!("🔗 Wallet connected: {}", self.address.short());
        Ok(self.address.clone())
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            tracing::info!("Wallet disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn address(&self) -> Option<WalletAddress> {
        self.is_connected().then(|| self.address.clone())
    }

    async fn sign_and_send(&self, transfer: &TransferSpec) -> Result<TransactionHandle, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        if self.behavior == SimulatedBehavior::RejectSigning {
            return Err(WalletError::UserRejected);
        }

        let n = self.next_signature.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(transfer.clone());

        Ok(TransactionHandle {
            signature: format!("sim{:0>12}", n),
        })
    }

    async fn await_confirmation(
        &self,
        handle: &TransactionHandle,
        commitment: CommitmentLevel,
    ) -> Result<ConfirmationStatus, WalletError> {
        tracing::debug!("Simulating {} confirmation for {}", commitment, handle.signature);
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }

        match self.behavior {
            SimulatedBehavior::Approve => Ok(ConfirmationStatus::Confirmed),
            SimulatedBehavior::FailConfirmation => Ok(ConfirmationStatus::Failed(
                "insufficient funds for transfer".to_string(),
            )),
            SimulatedBehavior::NeverConfirm => {
                std::future::pending::<Result<ConfirmationStatus, WalletError>>().await
            }
            SimulatedBehavior::RejectSigning => Err(WalletError::Network(format!(
                "unknown transaction {}",
                handle.signature
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(behavior: SimulatedBehavior) -> SimulatedWallet {
        SimulatedWallet::new(
            WalletAddress("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T".to_string()),
            behavior,
        )
    }

    fn transfer() -> TransferSpec {
        TransferSpec {
            from: WalletAddress("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T".to_string()),
            to: WalletAddress("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string()),
            lamports: 80_000_000,
        }
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let wallet = wallet(SimulatedBehavior::Approve);
        assert!(!wallet.is_connected());
        assert!(wallet.address().is_none());

        let address = wallet.connect().await.unwrap();
        assert!(wallet.is_connected());
        assert_eq!(wallet.address(), Some(address));

        wallet.disconnect().await;
        assert!(wallet.address().is_none());
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let wallet = wallet(SimulatedBehavior::Approve);
        assert_eq!(
            wallet.sign_and_send(&transfer()).await,
            Err(WalletError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_signatures_are_unique() {
        let wallet = wallet(SimulatedBehavior::Approve);
        wallet.connect().await.unwrap();

        let first = wallet.sign_and_send(&transfer()).await.unwrap();
        let second = wallet.sign_and_send(&transfer()).await.unwrap();

        assert_ne!(first.signature, second.signature);
        assert_eq!(wallet.sent_transfers().len(), 2);
        assert_eq!(
            wallet
                .await_confirmation(&first, CommitmentLevel::Processed)
                .await
                .unwrap(),
            ConfirmationStatus::Confirmed
        );
    }
}
