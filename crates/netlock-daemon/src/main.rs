//! Netlock Daemon - Main entry point
//!
//! Loads the daemon config, opens the settings store and serves the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netlock_core::{Settings, SystemClock};
use netlock_daemon::{app, interfaces, DaemonConfig, FileStore, Registry};

#[derive(Parser, Debug)]
#[command(name = "netlock-daemon")]
#[command(about = "HTTP service for network device lock timers")]
struct Args {
    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the daemon config file
    #[arg(short, long, env = "NETLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the settings document
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Directory with a pre-built front-end to serve
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "netlock_daemon=debug,tower_http=debug"
    } else {
        "netlock_daemon=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting netlock daemon v{}", env!("CARGO_PKG_VERSION"));

    // Load or create config
    let config_path = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("netlock")
            .join("daemon.json")
    });

    let mut config = if config_path.exists() {
        DaemonConfig::load(&config_path)?
    } else {
        let config = DaemonConfig::default();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save(&config_path)?;
        info!("Created default config at {:?}", config_path);
        config
    };

    config.apply_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_path) = args.data_path {
        config.data_path = data_path;
    }
    if let Some(static_dir) = args.static_dir {
        config.static_dir = Some(static_dir);
    }

    // Ensure directories exist
    config.ensure_directories()?;

    // Open the settings store; a document that cannot be decrypted stops startup
    let store = FileStore::open(config.settings_path(), config.encryption_key.as_deref())?;
    if store.is_encrypted() {
        info!("Settings at {:?} are encrypted at rest", store.path());
    } else {
        warn!("No encryption key configured, settings are stored in plain text");
    }

    let admin_addresses = if config.seed_admin_from_interfaces {
        interfaces::local_addresses()
    } else {
        Vec::new()
    };
    let seed = Settings::seeded(admin_addresses, config.admin_password.clone());

    let registry = Arc::new(Registry::open(
        Arc::new(store),
        Arc::new(SystemClock),
        seed,
    )?);

    let app = app(
        registry,
        &config.cors_origins(),
        config.static_dir.as_deref(),
    )?;

    let addr = config.bind_addr()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Daemon shutting down");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
