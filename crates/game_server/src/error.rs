//! Error types and handling for the game server.
//!
//! Only failures that stop a server or a connection task surface as
//! `ServerError`. Wire and game errors met while routing are handled in place:
//! the router logs them and either drops the frame or closes the connection.

/// Enumeration of possible server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding, handshake or socket failures
    #[error("Network error: {0}")]
    Network(String),

    /// Failures inside the server that are not the peer's fault
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ServerError::Network("Failed to bind 127.0.0.1:1".to_string()).to_string(),
            "Network error: Failed to bind 127.0.0.1:1"
        );
        assert_eq!(
            ServerError::Internal("Server is not running".to_string()).to_string(),
            "Internal error: Server is not running"
        );
    }

    #[tokio::test]
    async fn test_shutdown_of_idle_server_is_internal_error() {
        let server = crate::create_server();
        assert!(matches!(server.shutdown().await, Err(ServerError::Internal(_))));
    }
}
