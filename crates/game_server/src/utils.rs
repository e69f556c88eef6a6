//! Factory functions for creating server instances.

use crate::{config::ServerConfig, server::GameServer};

/// Creates a new game server with default configuration.
///
/// # Example
///
/// ```rust
/// use game_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().max_connections, 1000);
/// ```
pub fn create_server() -> GameServer {
    GameServer::new(ServerConfig::default())
}

/// Creates a new game server with custom configuration.
///
/// # Example
///
/// ```rust
/// use game_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     session_idle_timeout_secs: 0,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// assert!(server.config().session_idle_timeout().is_none());
/// ```
pub fn create_server_with_config(config: ServerConfig) -> GameServer {
    GameServer::new(config)
}
