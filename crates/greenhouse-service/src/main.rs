//! Greenhouse Service - Simulated sensors and HTTP API.
//!
//! Run with: `cargo run -p greenhouse-service`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use greenhouse_core::{SensorKind, SensorRegistry, SystemClock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use greenhouse_service::{AppState, Collector, Config, api, config::default_config_path};

/// Greenhouse Service - Simulated sensors and HTTP REST API.
#[derive(Parser, Debug)]
#[command(name = "greenhouse-service")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// Directory for saved snapshots (overrides config).
    #[arg(short, long, global = true)]
    export_dir: Option<PathBuf>,

    /// Disable background producers (API only mode).
    #[arg(long, global = true)]
    no_collector: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service in the foreground (default behavior).
    Run,
    /// Load and validate the configuration, then print it.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Command::CheckConfig) => check_config(&args),
        Some(Command::Run) | None => run_server(args).await,
    }
}

/// Load the configuration and apply CLI overrides.
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(dir) = &args.export_dir {
        config.export.directory = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn check_config(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let source = args.config.clone().unwrap_or_else(default_config_path);

    println!("Configuration OK ({})", source.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("greenhouse_service=info".parse()?)
                .add_directive("greenhouse_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = load_config(&args)?;

    // Seed every sensor before producers start and before accepting requests
    let clock = Arc::new(SystemClock::with_offset(config.site.utc_offset()));
    let registry = SensorRegistry::new(clock);
    for kind in SensorKind::ALL {
        registry.seed(kind, config.sensors.seed_count(kind));
    }

    let addr: SocketAddr = config.server.bind.parse()?;
    let state = AppState::new(registry, config);

    // Start the background collector
    let collector = Collector::new(Arc::clone(&state));
    if !args.no_collector {
        collector.start().await;
    } else {
        info!("Background collector disabled");
    }

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    info!("Starting server on {}", addr);

    // Run the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    collector.stop().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
