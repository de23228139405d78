//! Climate API Server
//!
//! Serves gridded temperature subsets, GeoTIFF and PDF exports.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use climate_api::build_router;
use climate_api::config::ServiceConfig;
use climate_api::state::AppState;

/// Climate API Server
#[derive(Parser, Debug)]
#[command(name = "climate-api")]
#[command(about = "Temperature subset server with GeoTIFF and PDF exports")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000", env = "CLIMATE_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "CLIMATE_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Service configuration file
    #[arg(short, long, default_value = "config/climate-api.yaml", env = "CLIMATE_CONFIG")]
    config: PathBuf,

    /// Dataset path, overrides the configuration file
    #[arg(long, env = "CLIMATE_DATA_PATH")]
    data_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // HDF5 prints its own error stack to stderr on every failed probe
    netcdf_store::silence_hdf5_errors();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let mut config = ServiceConfig::load(&args.config)?;
    if let Some(path) = args.data_path {
        config.dataset.path = path;
    }
    info!(
        dataset = %config.dataset.path.display(),
        variable = %config.dataset.variable,
        strict_status_codes = config.errors.strict_status_codes,
        "Starting climate API server"
    );
    if !config.dataset.path.exists() {
        warn!(
            "Dataset {} does not exist yet; data requests will fail until it does",
            config.dataset.path.display()
        );
    }

    let state = Arc::new(AppState::new(config).with_prometheus(prometheus_handle));
    let app = build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Climate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
