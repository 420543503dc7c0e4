use crate::domain::model::{
    CommitmentLevel, ConfirmationStatus, PaymentFailure, PaymentOutcome, PaymentQuote,
    TransferSpec, WalletAddress,
};
use crate::domain::ports::WalletSession;
use crate::utils::error::{BookingError, Result, WalletError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

/// Native units paid per quote-currency unit (1 RM = 0.01 SOL).
pub const NATIVE_PER_QUOTE: Decimal = dec!(0.01);

/// Smallest indivisible units per native unit.
pub const LAMPORTS_PER_NATIVE: u64 = 1_000_000_000;

pub const QUOTE_CURRENCY: &str = "RM";
pub const NATIVE_SYMBOL: &str = "SOL";

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// 報價金額換算成最小單位，四捨五入（half-up）
pub fn quote_to_lamports(quote_total: Decimal) -> Result<u64> {
    if quote_total.is_sign_negative() && !quote_total.is_zero() {
        return Err(BookingError::InvalidAmount {
            message: format!("negative total {}", quote_total),
        });
    }

    let lamports = quote_total
        .checked_mul(NATIVE_PER_QUOTE)
        .and_then(|native| native.checked_mul(Decimal::from(LAMPORTS_PER_NATIVE)))
        .ok_or_else(|| BookingError::InvalidAmount {
            message: format!("total {} overflows the native amount", quote_total),
        })?
        .round_dp_with_strategy(0, ROUNDING);

    lamports.to_u64().ok_or_else(|| BookingError::InvalidAmount {
        message: format!("{} lamports does not fit a transfer", lamports),
    })
}

pub fn quote(quote_total: Decimal) -> Result<PaymentQuote> {
    Ok(PaymentQuote {
        quote_total,
        lamports: quote_to_lamports(quote_total)?,
    })
}

pub fn lamports_to_native(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_NATIVE)
}

/// Quote currency amount with exactly two decimals, e.g. `20.00`.
pub fn format_quote_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp_with_strategy(2, ROUNDING))
}

/// Native amount with exactly four decimals, e.g. `0.2000`.
pub fn format_native_amount(lamports: u64) -> String {
    format!(
        "{:.4}",
        lamports_to_native(lamports).round_dp_with_strategy(4, ROUNDING)
    )
}

/// Builds transfers and hands them to the wallet. One call, one transfer:
/// failures are returned to the caller, never retried here.
pub struct PaymentSubmitter<W: WalletSession> {
    wallet: Arc<W>,
    commitment: CommitmentLevel,
    confirmation_timeout: Duration,
}

impl<W: WalletSession> PaymentSubmitter<W> {
    pub fn new(wallet: Arc<W>, commitment: CommitmentLevel, confirmation_timeout: Duration) -> Self {
        Self {
            wallet,
            commitment,
            confirmation_timeout,
        }
    }

    pub fn wallet(&self) -> &Arc<W> {
        &self.wallet
    }

    pub async fn submit(&self, quote: &PaymentQuote, destination: &WalletAddress) -> PaymentOutcome {
        let Some(from) = self.wallet.address() else {
            tracing::warn!("Wallet lost its address before the transfer was built");
            return PaymentOutcome::Rejected(PaymentFailure::NetworkError(
                WalletError::NotConnected.to_string(),
            ));
        };

        let transfer = TransferSpec {
            from,
            to: destination.clone(),
            lamports: quote.lamports,
        };

        tracing::info!(
            "💳 Submitting transfer of {} {} ({} lamports) to {}",
            format_native_amount(quote.lamports),
            NATIVE_SYMBOL,
            quote.lamports,
            destination.short()
        );

        let handle = match self.wallet.sign_and_send(&transfer).await {
            Ok(handle) => handle,
            Err(WalletError::UserRejected) => {
                tracing::info!("Transfer signing cancelled by user");
                return PaymentOutcome::Cancelled;
            }
            Err(e) => {
                tracing::warn!("Transfer submission failed: {}", e);
                return PaymentOutcome::Rejected(PaymentFailure::NetworkError(e.to_string()));
            }
        };

        tracing::debug!(
            "Awaiting {} confirmation for {} (timeout {:?})",
            self.commitment,
            handle.signature,
            self.confirmation_timeout
        );

        let confirmation = tokio::time::timeout(
            self.confirmation_timeout,
            self.wallet.await_confirmation(&handle, self.commitment),
        )
        .await;

        match confirmation {
            Ok(Ok(ConfirmationStatus::Confirmed)) => {
                tracing::info!("✅ Transfer {} confirmed", handle.signature);
                PaymentOutcome::Confirmed(handle)
            }
            Ok(Ok(ConfirmationStatus::Failed(reason))) => {
                tracing::warn!("Transfer {} failed on chain: {}", handle.signature, reason);
                PaymentOutcome::Rejected(PaymentFailure::NetworkError(reason))
            }
            Ok(Err(e)) => {
                tracing::warn!("Confirmation of {} failed: {}", handle.signature, e);
                PaymentOutcome::Rejected(PaymentFailure::NetworkError(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    "Transfer {} not confirmed within {:?}",
                    handle.signature,
                    self.confirmation_timeout
                );
                PaymentOutcome::Rejected(PaymentFailure::Timeout)
            }
        }
    }
}
