//! Core game server implementation.
//!
//! `GameServer` is the composition root of the network side: it owns the
//! session registry and the connection manager and hands them by `Arc` to
//! every connection handler and to the idle-session reaper.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    server::handlers::{handle_connection, ConnectionContext},
    shutdown::ShutdownState,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use sweeper_core::SessionRegistry;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// How long shutdown waits for open connections to finish.
const CONNECTION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The core game server structure.
///
/// # Architecture
///
/// * **Session Registry**: every live game, keyed by session id
/// * **Connection Manager**: every live connection and its session binding
/// * **Accept Loop**: one handler task per connection, capped at
///   `max_connections`
/// * **Reaper**: periodic removal of sessions nobody is attached to
pub struct GameServer {
    /// Server configuration
    config: ServerConfig,

    registry: Arc<SessionRegistry>,

    connection_manager: Arc<ConnectionManager>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl GameServer {
    /// Creates a new game server instance with the provided configuration.
    ///
    /// Nothing is bound until [`GameServer::start`] is called.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration parameters
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            connection_manager: Arc::new(ConnectionManager::new()),
            shutdown_sender,
        }
    }

    /// Starts the game server with graceful shutdown support.
    ///
    /// The server runs until shutdown is initiated on `shutdown_state` or
    /// [`GameServer::shutdown`] is called. Open connections receive a close
    /// frame and are given a short grace period to finish.
    ///
    /// # Returns
    ///
    /// `Ok(())` after a clean shutdown, or `ServerError::Network` if binding
    /// the listener failed.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    /// Starts the game server and runs until [`GameServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    async fn start_internal(
        &self,
        shutdown_state: Option<ShutdownState>,
    ) -> Result<(), ServerError> {
        let bind_address = self.config.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {bind_address}: {e}")))?;

        self.serve(listener, shutdown_state).await
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Useful when the caller needs the bound address up front, for example
    /// when binding to port 0.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_state: Option<ShutdownState>,
    ) -> Result<(), ServerError> {
        let shutdown_state = shutdown_state.unwrap_or_default();
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;

        info!("🚀 Starting game server on {}", local_addr);
        info!(
            "🔧 Limits: {} connections, {} byte messages",
            self.config.max_connections, self.config.max_message_size
        );

        let reaper = self.spawn_session_reaper(shutdown_state.clone());
        let context = ConnectionContext {
            registry: self.registry.clone(),
            connection_manager: self.connection_manager.clone(),
            shutdown_state: shutdown_state.clone(),
            max_message_size: self.config.max_message_size,
        };

        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let mut handlers: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();

        loop {
            tokio::select! {
                _ = shutdown_state.wait() => {
                    info!("🛑 Accept loop stopping - shutdown initiated");
                    break;
                }
                _ = shutdown_receiver.recv() => {
                    info!("Internal shutdown signal received");
                    shutdown_state.initiate_shutdown();
                    break;
                }
                Some(finished) = handlers.next(), if !handlers.is_empty() => {
                    if let Err(e) = finished {
                        error!("Connection task failed: {}", e);
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        if handlers.len() >= self.config.max_connections {
                            warn!(
                                "🚫 Refusing connection from {}: {} connections open",
                                addr,
                                handlers.len()
                            );
                            drop(stream);
                            continue;
                        }

                        let context = context.clone();
                        handlers.push(tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, context).await {
                                error!("Connection error: {}", e);
                            }
                        }));
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
        }

        drop(listener);
        info!("🧹 Draining {} open connection(s)...", handlers.len());
        let drained = tokio::time::timeout(CONNECTION_DRAIN_TIMEOUT, async {
            while handlers.next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("Connections still open after {:?}; abandoning them", CONNECTION_DRAIN_TIMEOUT);
        }

        if let Some(reaper) = reaper {
            let _ = reaper.await;
        }

        shutdown_state.complete_shutdown();
        info!("Server stopped");
        Ok(())
    }

    /// Starts the idle-session reaper, unless the idle timeout is 0.
    fn spawn_session_reaper(&self, shutdown_state: ShutdownState) -> Option<JoinHandle<()>> {
        let Some(max_idle) = self.config.session_idle_timeout() else {
            info!("⏸️ Session reaper disabled (idle timeout: 0s)");
            return None;
        };

        let registry = self.registry.clone();
        let period = self.config.reap_interval();
        info!(
            "🕒 Session reaper started: every {:?}, idle limit {:?}",
            period, max_idle
        );

        Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_state.wait() => break,
                    _ = ticker.tick() => {
                        let reaped = registry.reap_idle(max_idle).await;
                        debug!("Reaper pass removed {} session(s)", reaped.len());
                    }
                }
            }

            info!("✅ Session reaper stopped");
        }))
    }

    /// Initiates server shutdown.
    ///
    /// Stops the accept loop and closes every open connection.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        self.shutdown_sender
            .send(())
            .map(|_| ())
            .map_err(|_| ServerError::Internal("Server is not running".to_string()))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Gets a handle to the session registry.
    pub fn get_registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Gets a handle to the connection manager.
    pub fn get_connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }
}
