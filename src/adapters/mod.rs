// Adapters layer: concrete catalog, wallet and reservation sink implementations.

pub mod catalog;
pub mod sink;
pub mod wallet;

pub use catalog::{StaticCatalog, TomlCatalog};
pub use sink::{HttpSink, LogSink};
pub use wallet::{SimulatedBehavior, SimulatedWallet};
