//! Core server implementation and connection handling.

pub mod core;
pub mod handlers;

pub use core::GameServer;
pub use handlers::ConnectionContext;
