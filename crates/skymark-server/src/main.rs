//! Skymark server - HTTP API for the study-abroad advisor.

use anyhow::Result;
use axum::Router;
use clap::Parser;
use skymark_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Skymark server - study-abroad chat assistant and fine-tuning admin API.
#[derive(Parser, Debug)]
#[command(name = "skymark-server")]
#[command(about = "HTTP server for the Skymark study-abroad assistant")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override database path from config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Enable verbose logging (INFO level for all targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "chat=debug" or "provider=trace").
    /// Can be specified multiple times. Targets are prefixed with "skymark::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::info!(
        target: "skymark::startup",
        "Loaded configuration (port: {}, db: {})",
        config.port,
        config.db_path.display()
    );

    // Startup halts if the store cannot be opened.
    let state = match AppState::new(config.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(target: "skymark::startup", "Failed to initialize application state: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!(target: "skymark::startup", "Initialized application state");

    let app = Router::new()
        .nest("/api", routes::api_router())
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "skymark::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
