//! Command-line surface
//!
//! Each subcommand loads the configuration, opens the record store when it
//! needs one, and prints its result to stdout. Logs go to stderr.

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::application::{LogNotifier, RefreshService};
use crate::crawling::ExtractionOrchestrator;
use crate::domain::repositories::RecordStore;
use crate::infrastructure::config::{AppConfig, ConfigManager};
use crate::infrastructure::http_client::HttpPageFetcher;
use crate::infrastructure::logging::init_logging_with_config;
use crate::infrastructure::record_repository::SqliteRecordStore;

type CliService = RefreshService<HttpPageFetcher, SqliteRecordStore, LogNotifier>;

#[derive(Parser)]
#[command(name = "deal-tracker")]
#[command(about = "Track product page prices and spot discounts")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config dir)
    #[arg(long, global = true, env = "DEAL_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch product pages and print the extracted records without storing them
    Lookup {
        /// Product page URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Start tracking a product page
    Add {
        url: String,
        /// Use this title instead of the one on the page
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Stop tracking a product page
    Remove { url: String },

    /// Stop tracking everything
    Clear,

    /// Show tracked products, most discounted first
    List,

    /// Re-fetch every tracked product and report items on sale
    Refresh,
}

/// Parse arguments and run the selected command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_config().await?;
    config.validate()?;
    init_logging_with_config(config.logging.clone())?;

    execute(cli.command, &config).await
}

async fn open_service(config: &AppConfig) -> Result<CliService> {
    let engine = ExtractionOrchestrator::from_config(config)?;
    let store = SqliteRecordStore::connect(&config.database_url).await?;
    Ok(RefreshService::new(engine, store, LogNotifier, config.refresh.clone()))
}

async fn execute(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Lookup { urls } => {
            let engine = ExtractionOrchestrator::from_config(config)?;
            let report = engine.lookup(&urls).await;
            println!("{}", serde_json::to_string_pretty(&report.records)?);
        }
        Commands::Add { url, title } => {
            let service = open_service(config).await?;
            let record = service.track(&url, title.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Remove { url } => {
            let service = open_service(config).await?;
            if !service.untrack(&url).await? {
                bail!("not tracking {}", url);
            }
            println!("Removed {}", url);
        }
        Commands::Clear => {
            open_service(config).await?.clear().await?;
            println!("Cleared all tracked products");
        }
        Commands::List => {
            let service = open_service(config).await?;
            print_records(service.store()).await?;
        }
        Commands::Refresh => {
            let service = open_service(config).await?;
            let report = service.refresh().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.succeeded {
                bail!("refresh failed after {} attempt(s)", report.attempts);
            }
        }
    }

    Ok(())
}

async fn print_records(store: &impl RecordStore) -> Result<()> {
    let records = store.get_all().await?;
    if records.is_empty() {
        println!("No tracked products");
        return Ok(());
    }

    let price = |p: Option<rust_decimal::Decimal>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
    for record in &records {
        let marker = if record.is_on_sale() { "🏷️" } else { "  " };
        println!(
            "{} {:<40} {:>10} (was {:>10})  {}",
            marker,
            record.title.as_deref().unwrap_or("(untitled)"),
            price(record.current_price),
            price(record.previous_price),
            record.url
        );
    }

    match store.last_refreshed_at().await? {
        Some(at) => println!("Last refreshed: {}", at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")),
        None => println!("Never refreshed"),
    }
    Ok(())
}
