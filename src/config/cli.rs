use crate::adapters::{HttpSink, LogSink, SimulatedWallet, StaticCatalog, TomlCatalog};
use crate::config::toml_config::{BookingConfig, SinkType};
use crate::config::BookArgs;
use crate::core::{BookingWorkflow, CatalogProvider, PaymentSubmitter, ReservationSink};
use crate::domain::model::{BookingRecord, SinkAck, Venue};
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Catalog chosen by `[catalog]`: bundled when absent, file-backed otherwise.
#[derive(Debug, Clone)]
pub enum ConfiguredCatalog {
    Bundled(StaticCatalog),
    File(TomlCatalog),
}

impl CatalogProvider for ConfiguredCatalog {
    fn list_venues(&self) -> Result<Vec<Venue>> {
        match self {
            ConfiguredCatalog::Bundled(catalog) => catalog.list_venues(),
            ConfiguredCatalog::File(catalog) => catalog.list_venues(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfiguredSink {
    Log(LogSink),
    Http(HttpSink),
}

#[async_trait]
impl ReservationSink for ConfiguredSink {
    async fn commit(&self, record: &BookingRecord) -> Result<SinkAck> {
        match self {
            ConfiguredSink::Log(sink) => sink.commit(record).await,
            ConfiguredSink::Http(sink) => sink.commit(record).await,
        }
    }
}

pub type CliWorkflow = BookingWorkflow<ConfiguredCatalog, SimulatedWallet, ConfiguredSink>;

/// 套用命令列覆蓋設定
pub fn apply_overrides(config: &mut BookingConfig, args: &BookArgs) {
    if let Some(destination) = &args.destination {
        config.payment.destination = Some(destination.clone());
        tracing::info!("🔧 Payment destination overridden to: {}", destination);
    }
    if let Some(behavior) = args.simulate {
        config.wallet.behavior = behavior;
        tracing::info!("🔧 Simulated wallet behaviour overridden to: {:?}", behavior);
    }
}

pub fn build_catalog(config: &BookingConfig) -> ConfiguredCatalog {
    match &config.catalog {
        Some(catalog) => ConfiguredCatalog::File(TomlCatalog::new(&catalog.path)),
        None => ConfiguredCatalog::Bundled(StaticCatalog::bundled()),
    }
}

pub fn build_sink(config: &BookingConfig) -> Result<ConfiguredSink> {
    match config.sink.r#type {
        SinkType::Log => Ok(ConfiguredSink::Log(LogSink::new())),
        SinkType::Http => {
            let endpoint = config
                .sink
                .endpoint
                .clone()
                .ok_or_else(|| BookingError::MissingConfigError {
                    field: "sink.endpoint".to_string(),
                })?;
            Ok(ConfiguredSink::Http(HttpSink::new(
                endpoint,
                config.sink_timeout(),
            )?))
        }
    }
}

pub fn build_workflow(config: &BookingConfig) -> Result<CliWorkflow> {
    tracing::info!(
        "🌐 Network: {} ({})",
        config.network.cluster,
        config.rpc_url()
    );
    let wallet = Arc::new(
        SimulatedWallet::new(config.wallet_address(), config.wallet.behavior)
            .with_confirmation_delay(config.confirmation_delay()),
    );
    let submitter = PaymentSubmitter::new(
        wallet,
        config.payment.commitment,
        config.confirmation_timeout(),
    );

    Ok(BookingWorkflow::new(
        build_catalog(config),
        submitter,
        build_sink(config)?,
        config.destination()?,
    ))
}
