//! Per-connection routing state and routing results.

use crate::connection::{ConnectionId, ConnectionLink};
use std::sync::Arc;
use sweeper_core::{SessionHandle, SessionId};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// What the connection handler should do after a frame was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Keep reading frames
    Continue,
    /// Send a close frame with this code and reason, then hang up
    Close(CloseCode, String),
}

impl RouteOutcome {
    pub(crate) fn policy_violation(reason: impl Into<String>) -> Self {
        RouteOutcome::Close(CloseCode::Policy, reason.into())
    }
}

/// The session a connection is attached to.
#[derive(Debug, Clone)]
pub struct SessionBinding {
    pub session_id: SessionId,
    pub handle: SessionHandle,
}

/// Everything the router needs to know about one connection.
///
/// Owned by the connection handler and passed to the router for every frame,
/// so frames of one connection are processed strictly in order.
#[derive(Debug)]
pub struct ConnectionState {
    pub connection_id: ConnectionId,
    pub link: Arc<ConnectionLink>,
    pub session: Option<SessionBinding>,
}

impl ConnectionState {
    pub fn new(link: Arc<ConnectionLink>) -> Self {
        Self {
            connection_id: link.connection_id(),
            link,
            session: None,
        }
    }

    /// Whether a Connect has succeeded on this connection.
    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|binding| binding.session_id)
    }

    /// Detaches from the current session, if any.
    ///
    /// # Returns
    ///
    /// The id of the session that was left.
    pub async fn leave_session(&mut self) -> Option<SessionId> {
        let binding = self.session.take()?;
        binding.handle.lock().await.detach(self.connection_id);
        Some(binding.session_id)
    }
}
