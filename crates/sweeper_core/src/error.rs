//! Error types for the game engine.
//!
//! Only failures that the caller has to act on are errors. Rejected moves
//! (revealing an already revealed tile, flagging after the game ended, ...)
//! are silent no-ops and never surface here.

use crate::types::SessionId;

/// Enumeration of engine errors.
///
/// Every variant except [`GameError::InvalidLayout`] means the requesting
/// connection cannot be bound to a session and should be closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// No session is registered under the requested id
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    /// Every id in the session range is taken
    #[error("No free session id left (all {} in use)", crate::types::MAX_SESSION_ID as usize + 1)]
    SessionsExhausted,

    /// Requested board dimensions cannot form a playable board
    #[error("Invalid board: {rows}x{cols} with {mine_count} mines")]
    InvalidDimensions {
        rows: u8,
        cols: u8,
        mine_count: u8,
    },

    /// An explicit mine layout does not match its board parameters
    #[error("Invalid mine layout: {0}")]
    InvalidLayout(String),
}
