//! # Sweeper Core - Authoritative Minesweeper Engine
//!
//! The game logic behind the Sweeper server. This crate owns every rule of the
//! game and knows nothing about sockets, frames or byte layouts:
//!
//! * [`Tile`] - single cell state and its visible projection ([`TileKind`])
//! * [`Board`] - mine placement, adjacency counts, flood fill reveal, flag counters
//! * [`Session`] - one game: deferred board creation, safe first move, win/loss
//!   state machine and the set of attached clients
//! * [`SessionRegistry`] - allocation and lookup of sessions by small integer id
//!
//! ## Message Flow
//!
//! 1. The transport layer decodes a client command
//! 2. The command is applied to the addressed [`Session`] while holding its mutex
//! 3. The session broadcasts the resulting [`GameEvent`]s through each attached
//!    [`ClientHandle`]
//!
//! Game logic never blocks and never awaits; the only async surface is the
//! registry, whose locks serialize mutation per session.

pub mod board;
pub mod error;
pub mod registry;
pub mod session;
pub mod tile;
pub mod types;

pub use board::Board;
pub use error::GameError;
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{ClientHandle, Session, SessionState, MAX_FIRST_MOVE_ATTEMPTS};
pub use tile::{Tile, TileKind};
pub use types::{BoardParams, ClientId, Coord, GameEvent, SessionId, TileDelta, MAX_SESSION_ID};
