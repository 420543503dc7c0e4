use crate::domain::model::{AttemptId, BookingState, PaymentFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Wallet is not connected")]
    WalletNotConnected,

    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: PaymentFailure },

    #[error("Another operation is still in progress for this booking")]
    OperationInProgress,

    #[error("Reservation commit failed: {message}")]
    ReservationCommitFailed { message: String },

    #[error("Venue catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    #[error("Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("Cannot {event} while booking is {state}")]
    InvalidTransition {
        state: BookingState,
        event: &'static str,
    },

    #[error("No menu items selected")]
    EmptySelection,

    #[error("Unknown venue: {venue_id}")]
    UnknownVenue { venue_id: u32 },

    #[error("'{item}' is not on the menu of {venue}")]
    UnknownMenuItem { venue: String, item: String },

    #[error("Reservation date and time have not been set")]
    ScheduleNotSet,

    #[error("Selection no longer matches the paid items")]
    SelectionChanged,

    #[error("Booking attempt {attempt} is no longer active")]
    StaleAttempt { attempt: AttemptId },

    #[error("Invalid payment amount: {message}")]
    InvalidAmount { message: String },

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

/// 錢包端口的錯誤
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("user rejected the request")]
    UserRejected,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Workflow,
    Payment,
    Reservation,
    Catalog,
    Configuration,
    Infrastructure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BookingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::WalletNotConnected
            | BookingError::PaymentFailed { .. }
            | BookingError::InvalidAmount { .. }
            | BookingError::Wallet(_) => ErrorCategory::Payment,
            BookingError::ReservationCommitFailed { .. } => ErrorCategory::Reservation,
            BookingError::CatalogUnavailable { .. } | BookingError::UnknownVenue { .. } => {
                ErrorCategory::Catalog
            }
            BookingError::ConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BookingError::HttpError(_) | BookingError::IoError(_) => ErrorCategory::Infrastructure,
            _ => ErrorCategory::Workflow,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 狀態守衛拒絕：使用者可以直接修正
            BookingError::OperationInProgress
            | BookingError::StaleAttempt { .. }
            | BookingError::EmptySelection
            | BookingError::InvalidTransition { .. } => ErrorSeverity::Low,
            // 可重試
            BookingError::PaymentFailed { .. }
            | BookingError::ReservationCommitFailed { .. }
            | BookingError::WalletNotConnected
            | BookingError::Wallet(_)
            | BookingError::HttpError(_) => ErrorSeverity::Medium,
            BookingError::CatalogUnavailable { .. } | BookingError::IoError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BookingError::WalletNotConnected => {
                "Please connect your wallet to pay for this booking.".to_string()
            }
            BookingError::PaymentFailed { reason } => format!("Payment failed: {}", reason),
            BookingError::OperationInProgress => {
                "Please wait for the current payment or reservation to finish.".to_string()
            }
            BookingError::ReservationCommitFailed { message } => {
                format!("Your payment went through but the reservation was not saved: {}", message)
            }
            BookingError::CatalogUnavailable { .. } => {
                "The restaurant list is currently unavailable.".to_string()
            }
            BookingError::InvalidSchedule { reason } => {
                format!("Please pick a valid date and time: {}", reason)
            }
            BookingError::EmptySelection => "Select at least one menu item first.".to_string(),
            BookingError::SelectionChanged | BookingError::InvalidTransition { .. } => {
                format!("{}.", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BookingError::WalletNotConnected => "Connect a wallet and submit the payment again",
            BookingError::PaymentFailed { reason } => match reason {
                PaymentFailure::UserRejected => "Approve the transaction in your wallet to pay",
                PaymentFailure::NetworkError(_) => "Check the network connection and retry",
                PaymentFailure::Timeout => {
                    "Check the transaction in a block explorer before paying again"
                }
            },
            BookingError::OperationInProgress => "Wait for the pending operation to complete",
            BookingError::ReservationCommitFailed { .. } => {
                "Retry the reservation; no new payment is required"
            }
            BookingError::CatalogUnavailable { .. } => "Check the catalog file path in the config",
            BookingError::InvalidSchedule { .. } | BookingError::ScheduleNotSet => {
                "Use a future date (YYYY-MM-DD) and time (HH:MM)"
            }
            BookingError::EmptySelection | BookingError::UnknownMenuItem { .. } => {
                "Choose items from the venue menu"
            }
            BookingError::SelectionChanged => "Pay again for the updated selection",
            BookingError::ConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::MissingConfigError { .. } => "Fix the configuration file and retry",
            _ => "Start a new booking and try again",
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_failure_suggestions_differ_by_reason() {
        let timeout = BookingError::PaymentFailed {
            reason: PaymentFailure::Timeout,
        };
        let rejected = BookingError::PaymentFailed {
            reason: PaymentFailure::UserRejected,
        };

        assert_eq!(timeout.category(), ErrorCategory::Payment);
        assert_eq!(timeout.severity(), ErrorSeverity::Medium);
        assert_ne!(timeout.recovery_suggestion(), rejected.recovery_suggestion());
        assert_eq!(
            timeout.to_string(),
            "Payment failed: confirmation timed out"
        );
    }

    #[test]
    fn test_guard_errors_are_low_severity() {
        let err = BookingError::InvalidTransition {
            state: BookingState::SelectingMenu,
            event: "commit",
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Workflow);
        assert_eq!(err.to_string(), "Cannot commit while booking is selecting-menu");
    }

    #[test]
    fn test_commit_failure_reassures_user() {
        let err = BookingError::ReservationCommitFailed {
            message: "503".to_string(),
        };
        assert!(err.user_friendly_message().contains("payment went through"));
        assert_eq!(err.category(), ErrorCategory::Reservation);
    }
}
