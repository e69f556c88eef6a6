//! Bookkeeping record for one live connection.

use std::net::SocketAddr;
use std::time::SystemTime;
use sweeper_core::SessionId;

/// Represents an individual client connection to the server.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    /// The session this connection is attached to (None until Connect succeeds)
    pub session_id: Option<SessionId>,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,
}

impl ClientConnection {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            session_id: None,
            remote_addr,
            connected_at: SystemTime::now(),
        }
    }

    /// Time since the connection was established, zero if the clock moved back.
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed().unwrap_or_default()
    }
}
