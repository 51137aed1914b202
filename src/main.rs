//! Session Gate
//!
//! Form-login access gate in front of a single greeting endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ security headers ─▶ request id ─▶ trace ─▶ limit/timeout
//!                                                                   │
//!                                                                   ▼
//!                                                        ┌─────────────────────┐
//!                                                        │     access gate     │
//!                                                        │ cookie → session →  │
//!                                                        │  allow | redirect   │
//!                                                        └──────────┬──────────┘
//!                                                                   │ allow
//!                    /login, /logout (public)                       ▼
//!                    ───────────────────────▶ handlers ◀──── GET / "Hello, World"
//!
//!     Shared state: session table (one live session per principal),
//!                   credential store (reloadable), session policy (reloadable)
//!     Background:   session sweeper, config watcher (--watch)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use session_gate::auth::generated_user;
use session_gate::config::{load_config, watcher::ConfigWatcher, GateConfig};
use session_gate::observability::{logging, metrics};
use session_gate::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "session-gate")]
#[command(about = "Form-login session gate serving a greeting", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload users and session policy when the config file changes
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("session-gate v{} starting", env!("CARGO_PKG_VERSION"));

    if config.users.is_empty() {
        let user = generated_user();
        tracing::warn!(
            username = %user.username,
            password = %user.password,
            "No users configured; using generated security password. \
             This generated password is for development use only"
        );
        config.users.push(user);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        users = config.users.len(),
        idle_timeout_secs = config.session.idle_timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    // The watcher handle must outlive the server
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config);
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
