//! Message routing logic for dispatching client frames to sessions.

use crate::{
    connection::ConnectionManager,
    messaging::{ConnectionState, RouteOutcome, SessionBinding},
};
use std::sync::Arc;
use sweeper_core::{ClientHandle, SessionRegistry};
use sweeper_protocol::{decode_command, ClientCommand, SessionRequest};
use tracing::{debug, info, trace, warn};

/// Routes one binary frame from a client.
///
/// # Arguments
///
/// * `frame` - The raw frame bytes
/// * `state` - Routing state of the sending connection
/// * `registry` - Session registry to create, join and look up sessions
/// * `connection_manager` - Records the session each connection is bound to
///
/// # Returns
///
/// [`RouteOutcome::Continue`] unless the connection must be closed.
///
/// # Rules
///
/// 1. The first frame must decode to Connect; anything else closes the connection
/// 2. A failed Connect (unknown session, no free id, bad dimensions) closes it
/// 3. After binding, undecodable frames are logged and dropped
/// 4. A second Connect leaves the current session before joining the next
pub async fn route_client_message(
    frame: &[u8],
    state: &mut ConnectionState,
    registry: &SessionRegistry,
    connection_manager: &ConnectionManager,
) -> RouteOutcome {
    let command = match decode_command(frame) {
        Ok(command) => command,
        Err(e) if !state.is_bound() => {
            warn!("⚠️ Connection {} sent an invalid first frame: {}", state.connection_id, e);
            return RouteOutcome::policy_violation("First message must be Connect");
        }
        Err(e) => {
            warn!("⚠️ Connection {} dropped frame: {}", state.connection_id, e);
            return RouteOutcome::Continue;
        }
    };

    trace!(
        "📥 Connection {}: {} ({} bytes)",
        state.connection_id,
        command.name(),
        frame.len()
    );

    if let ClientCommand::Connect(request) = command {
        return connect(request, state, registry, connection_manager).await;
    }

    let Some(binding) = state.session.as_ref() else {
        warn!(
            "⚠️ Connection {} sent {} before Connect",
            state.connection_id,
            command.name()
        );
        return RouteOutcome::policy_violation("First message must be Connect");
    };

    let mut session = binding.handle.lock().await;
    let events = match command {
        ClientCommand::Reveal { coord } => session.reveal(coord),
        ClientCommand::Flag { coord, unflag } => session.flag(coord, unflag),
        ClientCommand::Reset => session.reset(),
        ClientCommand::Connect(_) => Vec::new(),
    };

    debug!(
        "Session {}: {} from connection {} produced {} event(s)",
        binding.session_id,
        command.name(),
        state.connection_id,
        events.len()
    );
    RouteOutcome::Continue
}

/// Binds the connection to a new or existing session.
async fn connect(
    request: SessionRequest,
    state: &mut ConnectionState,
    registry: &SessionRegistry,
    connection_manager: &ConnectionManager,
) -> RouteOutcome {
    if let Some(previous) = state.leave_session().await {
        debug!(
            "Connection {} left session {} to reconnect",
            state.connection_id, previous
        );
        connection_manager.set_session(state.connection_id, None).await;
    }

    let session_id = match request {
        SessionRequest::New {
            rows,
            cols,
            mine_count,
        } => match registry.create_session(rows, cols, mine_count).await {
            Ok((session_id, _)) => session_id,
            Err(e) => {
                warn!(
                    "⚠️ Connection {} could not create a session: {}",
                    state.connection_id, e
                );
                return RouteOutcome::policy_violation(e.to_string());
            }
        },
        SessionRequest::Join(session_id) => session_id,
    };

    let client: Arc<dyn ClientHandle> = state.link.clone();
    match registry.join_session(session_id, client).await {
        Ok((handle, _)) => {
            state.session = Some(SessionBinding { session_id, handle });
            connection_manager
                .set_session(state.connection_id, Some(session_id))
                .await;
            info!("🎯 Connection {} joined session {}", state.connection_id, session_id);
            RouteOutcome::Continue
        }
        Err(e) => {
            warn!("⚠️ Connection {} could not join: {}", state.connection_id, e);
            RouteOutcome::policy_violation(e.to_string())
        }
    }
}
