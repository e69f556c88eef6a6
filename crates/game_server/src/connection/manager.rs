//! Connection manager for tracking and managing client connections.

use super::{client::ClientConnection, ConnectionId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use sweeper_core::SessionId;
use tokio::sync::RwLock;
use tracing::info;

/// Central registry of live connections.
///
/// Hands out process-unique connection ids and records which session each
/// connection is bound to. It never touches sockets; the per-connection
/// handler owns those.
#[derive(Debug)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, ClientConnection>>,
    next_id: AtomicUsize,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Registers a connection and returns its unique id.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    pub async fn add_connection(&self, remote_addr: SocketAddr) -> ConnectionId {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .write()
            .await
            .insert(connection_id, ClientConnection::new(remote_addr));
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Forgets a connection. Logs how long it lived and where it was playing.
    pub async fn remove_connection(&self, connection_id: ConnectionId) -> Option<ClientConnection> {
        let removed = self.connections.write().await.remove(&connection_id);
        if let Some(connection) = &removed {
            info!(
                "❌ Connection {} from {} disconnected after {:.1}s (session {:?})",
                connection_id,
                connection.remote_addr,
                connection.age().as_secs_f64(),
                connection.session_id
            );
        }
        removed
    }

    /// Records the session a connection is bound to.
    pub async fn set_session(&self, connection_id: ConnectionId, session_id: Option<SessionId>) {
        if let Some(connection) = self.connections.write().await.get_mut(&connection_id) {
            connection.session_id = session_id;
        }
    }

    pub async fn get_session(&self, connection_id: ConnectionId) -> Option<SessionId> {
        self.connections
            .read()
            .await
            .get(&connection_id)
            .and_then(|connection| connection.session_id)
    }

    pub async fn get_connection(&self, connection_id: ConnectionId) -> Option<ClientConnection> {
        self.connections.read().await.get(&connection_id).cloned()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections currently bound to `session_id`.
    pub async fn connections_in_session(&self, session_id: SessionId) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|connection| connection.session_id == Some(session_id))
            .count()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
