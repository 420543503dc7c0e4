pub mod payment;
pub mod workflow;

pub use crate::domain::model::{BookingRecord, BookingState, PaymentOutcome, Venue};
pub use crate::domain::ports::{CatalogProvider, Clock, ReservationSink, WalletSession};
pub use crate::utils::error::Result;
pub use payment::PaymentSubmitter;
pub use workflow::{BookingEvent, BookingWorkflow, EventOutcome};
