//! The outbound half of a connection as seen by game sessions.

use super::ConnectionId;
use sweeper_core::{ClientHandle, ClientId, GameEvent};
use sweeper_protocol::encode_event;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, trace};

/// Queues encoded events onto a connection's writer task.
///
/// Sending never blocks: frames go onto an unbounded channel that the
/// connection's writer drains into the socket. Once the writer is gone the
/// link reports itself closed and sessions stop broadcasting to it.
#[derive(Debug, Clone)]
pub struct ConnectionLink {
    connection_id: ConnectionId,
    outbound: UnboundedSender<Message>,
}

impl ConnectionLink {
    pub fn new(connection_id: ConnectionId, outbound: UnboundedSender<Message>) -> Self {
        Self {
            connection_id,
            outbound,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Queues a raw WebSocket message. Returns `false` if the writer is gone.
    pub fn send_message(&self, message: Message) -> bool {
        self.outbound.send(message).is_ok()
    }
}

impl ClientHandle for ConnectionLink {
    fn id(&self) -> ClientId {
        self.connection_id
    }

    fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    fn send(&self, event: &GameEvent) {
        match encode_event(event) {
            Ok(frame) => {
                trace!(
                    "📤 Connection {}: {} byte frame (opcode 0x{:02x})",
                    self.connection_id,
                    frame.len(),
                    frame.first().copied().unwrap_or_default()
                );
                if !self.send_message(Message::binary(frame)) {
                    trace!("Connection {} closed before delivery", self.connection_id);
                }
            }
            Err(e) => error!("Failed to encode event for connection {}: {}", self.connection_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeper_core::{Coord, TileDelta, TileKind};
    use tokio::sync::mpsc;

    #[test]
    fn test_send_encodes_binary_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = ConnectionLink::new(12, tx);
        assert_eq!(ClientHandle::id(&link), 12);

        link.send(&GameEvent::RevealBatch(vec![TileDelta::new(
            Coord::new(1, 2),
            TileKind::Flagged,
        )]));
        link.send(&GameEvent::Won);

        match rx.try_recv().unwrap() {
            Message::Binary(bytes) => assert_eq!(bytes.as_ref(), &[0x01, 0, 1, 0, 1, 0, 2, 9][..]),
            other => panic!("unexpected message {other:?}"),
        }
        match rx.try_recv().unwrap() {
            Message::Binary(bytes) => assert_eq!(bytes.as_ref(), &[0x03][..]),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_link_reports_closed_after_writer_drops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let link = ConnectionLink::new(1, tx);
        assert!(link.is_open());

        drop(rx);
        assert!(!link.is_open());
        assert!(!link.send_message(Message::binary(vec![0x02])));
        // Sending to a closed link is silently ignored
        link.send(&GameEvent::Lost);
    }
}
