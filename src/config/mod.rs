#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::wallet::SimulatedBehavior;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

pub use toml_config::BookingConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "venue-booking")]
#[command(about = "Book a table, pay with your wallet, then confirm the reservation")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List venues and their menus
    Venues,
    /// Pay for menu items and reserve a table
    Book(BookArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct BookArgs {
    #[arg(long)]
    pub venue: u32,

    /// Menu item to order; repeat for more items
    #[arg(long = "item", required = true)]
    pub items: Vec<String>,

    /// Reservation date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,

    /// Reservation time (HH:MM)
    #[arg(long)]
    pub time: String,

    /// Override payment.destination from config
    #[arg(long)]
    pub destination: Option<String>,

    /// Override the simulated wallet behaviour from config
    #[arg(long, value_enum)]
    pub simulate: Option<SimulatedBehavior>,

    /// Show the quote without paying
    #[arg(long)]
    pub dry_run: bool,
}
