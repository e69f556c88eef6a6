//! Connection handling logic for WebSocket clients.
//!
//! This module manages the lifecycle of individual client connections:
//! handshake, frame processing, and cleanup.

use crate::{
    connection::{ConnectionLink, ConnectionManager},
    error::ServerError,
    messaging::{route_client_message, ConnectionState, RouteOutcome},
    shutdown::ShutdownState,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use sweeper_core::SessionRegistry;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    accept_async_with_config,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame, WebSocketConfig},
        Message,
    },
};
use tracing::{debug, error, trace, warn};

/// How long the writer may take to flush queued frames after the reader ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared services every connection handler needs.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub registry: Arc<SessionRegistry>,
    pub connection_manager: Arc<ConnectionManager>,
    pub shutdown_state: ShutdownState,
    pub max_message_size: usize,
}

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Perform the WebSocket handshake with the configured size limit
/// 2. Register the connection with the connection manager
/// 3. Spawn the writer task draining the outbound queue into the socket
/// 4. Route binary frames in arrival order until the peer leaves, the router
///    asks to close, or the server shuts down
/// 5. Detach from the session, send a close frame if needed, wait for the
///    writer and unregister
///
/// # Arguments
///
/// * `stream` - The TCP stream for the client connection
/// * `addr` - The remote address of the client
/// * `context` - Registry, connection manager, shutdown state and limits
///
/// # Returns
///
/// `Ok(())` once the connection is closed, or `ServerError::Network` if the
/// handshake failed.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    context: ConnectionContext,
) -> Result<(), ServerError> {
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(context.max_message_size))
        .max_frame_size(Some(context.max_message_size));
    let ws_stream = accept_async_with_config(stream, Some(ws_config))
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake with {addr} failed: {e}")))?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let connection_id = context.connection_manager.add_connection(addr).await;

    let (outbound, mut outbound_receiver) = mpsc::unbounded_channel::<Message>();
    let link = Arc::new(ConnectionLink::new(connection_id, outbound));
    let mut state = ConnectionState::new(link.clone());

    // Outgoing message task
    let mut writer = tokio::spawn(async move {
        while let Some(message) = outbound_receiver.recv().await {
            let closing = matches!(message, Message::Close(_));
            if let Err(e) = ws_sender.send(message).await {
                debug!("Failed to send to connection {}: {}", connection_id, e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Incoming frames are routed inline so they are handled in order
    let close = loop {
        let message = tokio::select! {
            _ = context.shutdown_state.wait() => {
                break Some((CloseCode::Away, "Server shutting down".to_string()));
            }
            message = ws_receiver.next() => message,
        };

        match message {
            Some(Ok(Message::Binary(data))) => {
                match route_client_message(
                    &data,
                    &mut state,
                    &context.registry,
                    &context.connection_manager,
                )
                .await
                {
                    RouteOutcome::Continue => {}
                    RouteOutcome::Close(code, reason) => break Some((code, reason)),
                }
            }
            Some(Ok(Message::Text(_))) if !state.is_bound() => {
                warn!("⚠️ Connection {} opened with a text frame", connection_id);
                break Some((CloseCode::Policy, "First message must be Connect".to_string()));
            }
            Some(Ok(Message::Text(text))) => {
                warn!(
                    "⚠️ Connection {} sent a {} byte text frame; dropped",
                    connection_id,
                    text.len()
                );
            }
            Some(Ok(Message::Ping(data))) => {
                link.send_message(Message::Pong(data));
            }
            Some(Ok(Message::Close(_))) => {
                debug!("🔌 Client {} requested close", connection_id);
                break None;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("WebSocket error for connection {}: {}", connection_id, e);
                break None;
            }
            None => break None,
        }
    };

    if let Some(session_id) = state.leave_session().await {
        trace!("Connection {} detached from session {}", connection_id, session_id);
    }

    if let Some((code, reason)) = close {
        debug!("Closing connection {}: {}", connection_id, reason);
        link.send_message(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })));
    }

    // The writer ends once every sender is gone or the close frame is out
    drop(state);
    drop(link);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        warn!("Writer for connection {} did not finish in time", connection_id);
        writer.abort();
    }

    context.connection_manager.remove_connection(connection_id).await;
    Ok(())
}
