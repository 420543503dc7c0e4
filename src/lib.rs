pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::BookingConfig;

pub use adapters::{HttpSink, LogSink, SimulatedBehavior, SimulatedWallet, StaticCatalog, TomlCatalog};
pub use core::{BookingEvent, BookingWorkflow, EventOutcome, PaymentSubmitter};
pub use utils::error::{BookingError, Result};
