//! ecofarm-api - Farm management service
//!
//! Farm registry, monitoring ingestion, weather-derived soil readings,
//! AI recommendations, chat relay and support desk over HTTP/JSON.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ecofarm_common::config::{self, TomlConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

use ecofarm_api::config::{LlmSettings, WeatherSettings};
use ecofarm_api::{logging, AppState};

const DEFAULT_PORT: u16 = 5780;

/// Command-line arguments for ecofarm-api
#[derive(Parser, Debug)]
#[command(name = "ecofarm-api")]
#[command(about = "Farm management service for EcoFarm")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides TOML `port`)
    #[arg(short, long, env = "ECOFARM_PORT")]
    port: Option<u16>,

    /// Folder holding ecofarm.db
    #[arg(short, long, env = "ECOFARM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config_dir>/ecofarm/ecofarm-api.toml)
    #[arg(short, long, env = "ECOFARM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Installed before the config is read so loading is logged
    let (subscriber, log_level) =
        logging::subscriber(EnvFilter::try_from_default_env().ok(), std::io::stdout);
    subscriber.init();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let toml_config = match &config_path {
        Some(path) => TomlConfig::load(path).context("Failed to load TOML config")?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the TOML level
    log_level.apply_config(&toml_config);

    info!(
        "Starting EcoFarm API (ecofarm-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    // Root folder: CLI/ENV (via clap) → TOML → default
    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = config::prepare_root_folder(&root_folder)
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", root_folder.display());
    info!("Database: {}", db_path.display());

    let db_pool = ecofarm_common::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let weather = WeatherSettings::from_toml(&toml_config);
    let llm = LlmSettings::from_toml(&toml_config);
    info!(model = %llm.model, "Language model configured");

    let state = AppState::with_providers(db_pool, &weather, &llm)
        .context("Failed to build provider clients")?;
    let app = ecofarm_api::build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
