//! Country cache command-line entry point
//!
//! Each subcommand maps onto one pipeline or query operation and prints its
//! result as JSON on stdout.

use anyhow::{Context, Result};
use cache_config::{load_config, LoggingSettings};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use country_cache::{CacheError, CountryCacheService, ListParams};

#[derive(Parser, Debug)]
#[command(name = "country_cache")]
#[command(about = "Country reference data cache with GDP estimates")]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch both feeds and refresh the cache
    Refresh,
    /// List cached countries
    List {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        /// e.g. gdp_desc, population_asc, name_desc
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one country
    Get { name: String },
    /// Delete one country
    Delete { name: String },
    /// Show the global cache status
    Status,
    /// Print where the summary image is written
    SummaryPath,
}

fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("invalid log filter")?;

    // Logs go to stderr so stdout stays machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn execute(service: &CountryCacheService, command: Command) -> Result<(), CacheError> {
    let refreshed = matches!(command, Command::Refresh);
    let output = match command {
        Command::Refresh => {
            let summary = service.pipeline().run_refresh().await?;
            serde_json::json!({ "message": "Refresh successful", "status": summary })
        }
        Command::List {
            region,
            currency,
            sort,
        } => {
            let params = ListParams {
                region,
                currency,
                sort,
            };
            serde_json::json!(service.queries().list_countries(&params).await?)
        }
        Command::Get { name } => serde_json::json!(service.queries().get_country(&name).await?),
        Command::Delete { name } => {
            service.queries().delete_country(&name).await?;
            serde_json::json!({ "message": format!("Country '{name}' deleted successfully") })
        }
        Command::Status => serde_json::json!(service.queries().get_status().await?),
        Command::SummaryPath => {
            let path = service.existing_summary_path()?;
            serde_json::json!({ "summary_path": path.display().to_string() })
        }
    };

    if let Err(e) = print_json(&output) {
        error!("Failed to write output: {}", e);
    }
    if refreshed {
        // Let the summary land before the runtime shuts down
        service.pipeline().wait_for_materialization().await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_tracing(&config.logging)?;
    info!("Country cache starting (config: {:?})", args.config);

    let service = CountryCacheService::from_config(&config)?;

    if let Err(e) = execute(&service, args.command).await {
        let kind = e.kind();
        error!(?kind, status = kind.http_status(), "{}", e);
        return Err(e.into());
    }
    Ok(())
}
