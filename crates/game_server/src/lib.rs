//! # Game Server - WebSocket Front End for Sweeper
//!
//! Accepts WebSocket connections, binds each one to a game session and
//! carries binary frames between clients and the session engine in
//! `sweeper_core`. The server contains **no game rules**; it only decodes,
//! routes and delivers.
//!
//! ## Architecture Overview
//!
//! * **Accept Loop** ([`GameServer`]) - one handler task per connection, capped
//!   at `max_connections`, plus the idle-session reaper
//! * **Connection Handler** - handshake, a writer task draining the
//!   connection's outbound queue, and in-order routing of incoming frames
//! * **Router** - decodes frames with `sweeper_protocol` and applies them to
//!   the connection's session
//! * **Connection Manager** - ids, remote addresses and session bindings of
//!   live connections
//!
//! ### Message Flow
//!
//! 1. Client sends a binary frame; the first one must be Connect
//! 2. The router decodes it and locks the addressed session
//! 3. The session mutates its board and broadcasts events through every
//!    attached [`connection::ConnectionLink`]
//! 4. Each link encodes the event and queues it for its writer task
//!
//! ## Error Handling
//!
//! Structured [`ServerError`]s cover binding and handshake failures. Failures
//! while routing never propagate: they either drop the frame or close the
//! offending connection.

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::GameServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod server;
pub mod shutdown;
pub mod utils;

mod tests;
