//! Server configuration types and defaults.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration structure for the game server.
///
/// Built by the application from its config file and command line; the
/// defaults suit local development.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Largest WebSocket message accepted from a client, in bytes
    pub max_message_size: usize,

    /// How long a session may sit without clients before it is removed
    /// (0 disables the reaper)
    pub session_idle_timeout_secs: u64,

    /// How often the reaper looks for idle sessions, in milliseconds
    pub reap_interval_ms: u64,
}

impl ServerConfig {
    /// Idle timeout for sessions, or `None` when reaping is disabled.
    pub fn session_idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.session_idle_timeout_secs))
    }

    pub fn reap_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic
        Duration::from_millis(self.reap_interval_ms.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_connections: 1000,
            max_message_size: 1024,
            session_idle_timeout_secs: 300,
            reap_interval_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_timeout_zero_disables_reaper() {
        let config = ServerConfig {
            session_idle_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.session_idle_timeout(), None);
        assert_eq!(
            ServerConfig::default().session_idle_timeout(),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_reap_interval_never_zero() {
        let config = ServerConfig {
            reap_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.reap_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_config_from_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
bind_address = "0.0.0.0:9100"
max_connections = 16
max_message_size = 64
session_idle_timeout_secs = 0
reap_interval_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(config.bind_address, SocketAddr::from(([0, 0, 0, 0], 9100)));
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.session_idle_timeout(), None);

        let written = toml::to_string(&ServerConfig::default()).unwrap();
        assert_eq!(toml::from_str::<ServerConfig>(&written).unwrap(), ServerConfig::default());
    }
}
