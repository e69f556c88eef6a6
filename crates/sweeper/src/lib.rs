//! # Sweeper Server - Main Entry Point
//!
//! Authoritative multiplayer Minesweeper over binary WebSocket frames. This
//! crate is the composition root: it parses the command line, loads the
//! TOML configuration, sets up logging and runs the [`game_server`] until a
//! termination signal arrives.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (config.toml is created if missing)
//! sweeper
//!
//! # Override specific settings
//! sweeper --config production.toml --bind 0.0.0.0:8080 --log-level debug
//!
//! # JSON logging for production
//! sweeper --json-logs
//! ```
//!
//! ## Signal Handling
//!
//! SIGINT (Ctrl+C) and SIGTERM start a graceful shutdown: the accept loop
//! stops and every client receives a close frame. A second signal exits
//! immediately.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;

pub use config::{AppConfig, LoggingSettings, ServerSettings, SessionSettings};

/// Runs the server process.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
///
/// Called from `#[tokio::main]`, so it does not start a runtime itself.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let mut config = match AppConfig::load_from_file(&args.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load configuration from {}: {e}",
                args.config_path.display()
            );
            std::process::exit(1);
        }
    };
    config.apply_overrides(&args);

    // Logging comes before anything that might want to log
    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(config, &args.config_path) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
