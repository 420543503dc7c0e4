use anyhow::Context;
use clap::Parser;
use venue_booking::config::cli::{apply_overrides, build_catalog, build_workflow, CliWorkflow};
use venue_booking::config::{BookArgs, Command};
use venue_booking::core::payment::{format_native_amount, format_quote_amount, NATIVE_SYMBOL, QUOTE_CURRENCY};
use venue_booking::core::{CatalogProvider, WalletSession};
use venue_booking::utils::error::{BookingError, ErrorSeverity};
use venue_booking::utils::{logger, validation::Validate};
use venue_booking::{BookingConfig, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting venue-booking");

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            BookingConfig::from_file(path)
                .with_context(|| format!("Failed to load config file '{}'", path))?
        }
        None => BookingConfig::default(),
    };

    let result = match &cli.command {
        Command::Venues => list_venues(&config),
        Command::Book(args) => {
            apply_overrides(&mut config, args);
            book(&config, args).await
        }
    };

    if let Err(e) = result {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Booking failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn list_venues(config: &BookingConfig) -> venue_booking::Result<()> {
    let venues = build_catalog(config).list_venues()?;

    for venue in venues {
        println!("[{}] {} ★ {} ({})", venue.id, venue.name, venue.rating, venue.location);
        if !venue.description.is_empty() {
            println!("    {}", venue.description);
        }
        for item in &venue.menu {
            println!(
                "    - {:<20} {} {}",
                item.name,
                QUOTE_CURRENCY,
                format_quote_amount(item.price)
            );
        }
    }
    Ok(())
}

async fn book(config: &BookingConfig, args: &BookArgs) -> venue_booking::Result<()> {
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    let workflow = build_workflow(config)?;
    let address = workflow.wallet().connect().await?;
    println!("🔗 Wallet connected: {}", address.short());

    workflow.open_booking(args.venue).await?;
    for item in &args.items {
        workflow.toggle_item(item).await?;
    }
    workflow.set_schedule(&args.date, &args.time).await?;

    let quote = workflow.current_quote().await?;
    println!(
        "Total: {} {}  →  Pay {} {}",
        QUOTE_CURRENCY,
        format_quote_amount(quote.quote_total),
        format_native_amount(quote.lamports),
        NATIVE_SYMBOL
    );

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no payment will be sent");
        workflow.cancel().await;
        return Ok(());
    }

    let receipt = workflow.submit_payment().await?;
    println!("✅ Payment successful! Signature: {}", receipt.signature);

    commit_with_retries(&workflow, config.commit_attempts()).await
}

/// 預約提交失敗時重試，不需要重新付款
async fn commit_with_retries(workflow: &CliWorkflow, attempts: u32) -> venue_booking::Result<()> {
    let mut attempt = 1;
    loop {
        match workflow.commit().await {
            Ok(record) => {
                tracing::info!("✅ Booking {} committed", record.attempt);
                return Ok(());
            }
            Err(e @ BookingError::ReservationCommitFailed { .. }) if attempt < attempts => {
                tracing::warn!("Commit attempt {}/{} failed: {}", attempt, attempts, e);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
