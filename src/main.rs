//! forecast-volumes - Forecast Volume Service
//!
//! Serves daily and monthly decline-curve volumes over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults (empty in-memory store)
//! cargo run --release
//!
//! # Seed an in-memory store
//! FORECAST_VOLUMES_CONFIG=demos/forecast_volumes.toml cargo run --release
//!
//! # Import a seed file into a sled database
//! ./forecast-volumes import --file demos/seed.json --path ./data/forecast_volumes
//! ```
//!
//! # Environment Variables
//!
//! - `FORECAST_VOLUMES_CONFIG`: Path to the TOML config
//! - `FORECAST_SERVER_ADDR`: Server bind address
//! - `FORECAST_DAILY_YEAR_LIMIT`: Daily output limit in years (0 = unlimited)
//! - `FORECAST_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use forecast_volumes::api::{create_app, AppState};
use forecast_volumes::config::{ServiceConfig, StoreBackend, StoreConfig};
use forecast_volumes::{ForecastStore, ForecastVolumeService, InMemoryStore, SeedData, SledStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "forecast-volumes")]
#[command(about = "Decline-curve forecast volume service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to the TOML config, instead of the standard search order
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "FORECAST_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Import a JSON seed file into a sled database
    Import {
        /// Seed file with `forecasts` and `forecastOutputs`
        #[arg(long)]
        file: PathBuf,
        /// Sled database directory (default: store.path from config)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ServiceConfig> {
    match path {
        Some(path) => {
            let mut config = ServiceConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env_overrides();
            config.validate().context("Invalid config after environment overrides")?;
            info!(path = %path.display(), "Loaded service config");
            Ok(config)
        }
        None => Ok(ServiceConfig::load()),
    }
}

fn load_seed(config: &StoreConfig) -> Result<Option<SeedData>> {
    config
        .seed_file
        .as_ref()
        .map(|path| {
            SeedData::from_file(path)
                .with_context(|| format!("Failed to read seed file {}", path.display()))
        })
        .transpose()
}

fn open_store(config: &StoreConfig) -> Result<Arc<dyn ForecastStore>> {
    let store: Arc<dyn ForecastStore> = match config.backend {
        StoreBackend::Memory => {
            let seed = load_seed(config)?.unwrap_or_default();
            info!(
                forecasts = seed.forecasts.len(),
                outputs = seed.forecast_outputs.len(),
                "Seeded in-memory store"
            );
            Arc::new(InMemoryStore::from_seed(seed))
        }
        StoreBackend::Sled => {
            let store = SledStore::open(&config.path)
                .with_context(|| format!("Failed to open sled store at {}", config.path.display()))?;
            if let Some(seed) = load_seed(config)? {
                store.import(&seed).context("Failed to import seed documents")?;
            }
            Arc::new(store)
        }
    };
    Ok(store)
}

fn run_import(file: &Path, path: &Path) -> Result<()> {
    let seed = SeedData::from_file(file)
        .with_context(|| format!("Failed to read seed file {}", file.display()))?;
    let store = SledStore::open(path)
        .with_context(|| format!("Failed to open sled store at {}", path.display()))?;
    let written = store.import(&seed).context("Import failed")?;
    info!(documents = written, path = %path.display(), "Import complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut config = load_config(args.config.as_ref())?;

    if let Some(SubCommand::Import { file, path }) = &args.command {
        let target = path.clone().unwrap_or_else(|| config.store.path.clone());
        return run_import(file, &target);
    }

    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    let store = open_store(&config.store)?;
    info!(
        backend = store.backend_name(),
        daily_year_limit = config.volumes.daily_year_limit,
        "Forecast volume service starting"
    );

    let service = ForecastVolumeService::new(store, config.volumes.clone());
    let app = create_app(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP server listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await;

    match result {
        Ok(()) => {
            info!("Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}
