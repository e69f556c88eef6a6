//! Application lifecycle: server startup, periodic status reporting and
//! graceful shutdown.

use crate::{
    config::AppConfig,
    logging::display_banner,
    signals::{shutdown_on_signal, wait_for_signal},
};
use game_server::{GameServer, ServerError, ShutdownState};
use std::path::Path;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// How often the status line is logged.
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound on waiting for the server task once shutdown has started.
/// The server drains its own connections within a shorter window.
const SERVER_STOP_TIMEOUT: Duration = Duration::from_secs(8);

/// Main application struct.
///
/// Owns the validated configuration and the game server until [`run`]
/// hands the server to its own task.
///
/// [`run`]: Application::run
pub struct Application {
    config: AppConfig,
    server: GameServer,
}

impl Application {
    /// Creates the application from an already loaded configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration with command-line overrides applied
    /// * `config_path` - Where the configuration came from, for the log
    ///
    /// # Returns
    ///
    /// A ready `Application`, or an error if validation failed.
    pub fn new(config: AppConfig, config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated from {}", config_path.display());

        display_banner();

        let server = GameServer::new(config.to_server_config()?);
        Ok(Self { config, server })
    }

    /// Runs the server until a termination signal arrives, then shuts down
    /// gracefully.
    ///
    /// # Returns
    ///
    /// `Ok(())` after a clean shutdown, or the error that stopped the server
    /// early (for example a bind failure).
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let registry = self.server.get_registry();
        let connection_manager = self.server.get_connection_manager();
        let shutdown_state = ShutdownState::new();

        let mut server_handle = {
            let server = self.server;
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move { server.start_with_shutdown_state(shutdown_state).await })
        };

        let monitoring_handle = {
            let registry = registry.clone();
            let connection_manager = connection_manager.clone();

            tokio::spawn(async move {
                let mut ticker = interval(STATUS_INTERVAL);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    info!(
                        "📊 Status - {} active session(s) | {} connection(s)",
                        registry.session_count().await,
                        connection_manager.connection_count().await
                    );
                }
            })
        };

        info!(
            "🎮 Ready to accept connections on {}",
            self.config.server.bind_address
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        tokio::select! {
            signalled = shutdown_on_signal(&shutdown_state) => signalled?,
            finished = &mut server_handle => {
                monitoring_handle.abort();
                return match finished {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!("❌ Server error: {}", e);
                        Err(e.into())
                    }
                    Err(e) => Err(ServerError::Internal(format!("Server task failed: {e}")).into()),
                };
            }
        }

        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up forced shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown signal received again - exiting immediately");
            std::process::exit(1);
        });

        monitoring_handle.abort();

        info!("⏳ Waiting for the server to close its connections...");
        match timeout(SERVER_STOP_TIMEOUT, server_handle).await {
            Ok(Ok(Ok(()))) => info!("✅ Server task completed gracefully"),
            Ok(Ok(Err(e))) => error!("❌ Server stopped with an error: {}", e),
            Ok(Err(e)) => error!("❌ Server task failed: {}", e),
            Err(_) => warn!("⏰ Server task did not complete within {:?}", SERVER_STOP_TIMEOUT),
        }

        info!("📊 Final Statistics:");
        info!("  - Sessions still registered: {}", registry.session_count().await);
        info!("  - Connections still open: {}", connection_manager.connection_count().await);
        info!("✅ Sweeper server shutdown complete");

        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  📦 Max message size: {} bytes", self.config.server.max_message_size);
        if self.config.sessions.idle_timeout_secs == 0 {
            info!("  🕒 Idle session reaping: disabled");
        } else {
            info!(
                "  🕒 Idle session timeout: {}s (checked every {}ms)",
                self.config.sessions.idle_timeout_secs, self.config.sessions.reap_interval_ms
            );
        }
    }
}
