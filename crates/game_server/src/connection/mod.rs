//! Connection management for client connections.
//!
//! This module tracks live WebSocket connections and provides the
//! [`ConnectionLink`] through which sessions push events to a connection.

pub mod client;
pub mod link;
pub mod manager;

pub use link::ConnectionLink;
pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
///
/// Connection ids double as the session-level client id, so they are unique
/// for the lifetime of the process.
pub type ConnectionId = usize;
