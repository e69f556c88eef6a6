//! Client → server commands.

use crate::{error::ProtocolError, frame::Frame, opcode, NEW_SESSION};
use sweeper_core::{Coord, SessionId};
use tracing::trace;

/// Which session a Connect frame asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    /// Create a new session with these (unvalidated) dimensions
    New { rows: u8, cols: u8, mine_count: u8 },
    /// Join an existing session
    Join(SessionId),
}

/// A decoded client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    Connect(SessionRequest),
    Reveal { coord: Coord },
    Reset,
    Flag { coord: Coord, unflag: bool },
}

impl ClientCommand {
    pub fn opcode(&self) -> u8 {
        match self {
            ClientCommand::Connect(_) => opcode::CONNECT,
            ClientCommand::Reveal { .. } => opcode::REVEAL,
            ClientCommand::Reset => opcode::RESET,
            ClientCommand::Flag { .. } => opcode::FLAG,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::Connect(_) => "connect",
            ClientCommand::Reveal { .. } => "reveal",
            ClientCommand::Reset => "reset",
            ClientCommand::Flag { .. } => "flag",
        }
    }
}

// Field offsets, counted from the opcode byte.

struct ConnectLayout;

impl ConnectLayout {
    const SESSION_ID: usize = 1;
    const ROWS: usize = 2;
    const COLS: usize = 3;
    const MINE_COUNT: usize = 4;
    const JOIN_LEN: usize = 2;
    const LEN: usize = 5;
}

struct RevealLayout;

impl RevealLayout {
    const Y: usize = 1;
    const X: usize = 3;
    const LEN: usize = 5;
}

struct FlagLayout;

impl FlagLayout {
    const Y: usize = 1;
    const X: usize = 3;
    const UNFLAG: usize = 5;
    const LEN: usize = 6;
}

/// Decodes one client frame.
///
/// A join needs only the session id byte; a new-session request needs the
/// full five bytes. Anything past a layout's end is ignored.
pub fn decode_command(bytes: &[u8]) -> Result<ClientCommand, ProtocolError> {
    let frame = Frame::parse(bytes)?;

    match frame.opcode() {
        opcode::CONNECT => {
            frame.require(ConnectLayout::JOIN_LEN)?;
            let session_id = frame.u8_at(ConnectLayout::SESSION_ID)?;
            let request = if session_id == NEW_SESSION {
                frame.require(ConnectLayout::LEN)?;
                SessionRequest::New {
                    rows: frame.u8_at(ConnectLayout::ROWS)?,
                    cols: frame.u8_at(ConnectLayout::COLS)?,
                    mine_count: frame.u8_at(ConnectLayout::MINE_COUNT)?,
                }
            } else {
                SessionRequest::Join(session_id)
            };
            Ok(ClientCommand::Connect(request))
        }
        opcode::REVEAL => {
            frame.require(RevealLayout::LEN)?;
            Ok(ClientCommand::Reveal {
                coord: Coord::new(frame.u16_at(RevealLayout::Y)?, frame.u16_at(RevealLayout::X)?),
            })
        }
        opcode::RESET => Ok(ClientCommand::Reset),
        opcode::FLAG => {
            frame.require(FlagLayout::LEN)?;
            Ok(ClientCommand::Flag {
                coord: Coord::new(frame.u16_at(FlagLayout::Y)?, frame.u16_at(FlagLayout::X)?),
                unflag: frame.u8_at(FlagLayout::UNFLAG)? != 0,
            })
        }
        unknown => {
            trace!("Unknown client opcode 0x{:02x} in {} byte frame", unknown, bytes.len());
            Err(ProtocolError::UnknownOpcode(unknown))
        }
    }
}

/// Encodes a client command.
///
/// Connect frames are always five bytes; a join zero-fills the dimension bytes.
pub fn encode_command(command: &ClientCommand) -> Vec<u8> {
    let mut buf = vec![command.opcode()];

    match *command {
        ClientCommand::Connect(SessionRequest::New {
            rows,
            cols,
            mine_count,
        }) => buf.extend_from_slice(&[NEW_SESSION, rows, cols, mine_count]),
        ClientCommand::Connect(SessionRequest::Join(session_id)) => {
            buf.extend_from_slice(&[session_id, 0, 0, 0])
        }
        ClientCommand::Reveal { coord } => {
            buf.extend_from_slice(&coord.row.to_be_bytes());
            buf.extend_from_slice(&coord.col.to_be_bytes());
        }
        ClientCommand::Reset => {}
        ClientCommand::Flag { coord, unflag } => {
            buf.extend_from_slice(&coord.row.to_be_bytes());
            buf.extend_from_slice(&coord.col.to_be_bytes());
            buf.push(u8::from(unflag));
        }
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_connect_new() {
        assert_eq!(
            decode_command(&[0x80, 0xFF, 10, 12, 5]),
            Ok(ClientCommand::Connect(SessionRequest::New {
                rows: 10,
                cols: 12,
                mine_count: 5
            }))
        );
    }

    #[test]
    fn test_decode_connect_join_ignores_padding() {
        assert_eq!(
            decode_command(&[0x80, 7, 0, 0, 0]),
            Ok(ClientCommand::Connect(SessionRequest::Join(7)))
        );
        assert_eq!(
            decode_command(&[0x80, 7]),
            Ok(ClientCommand::Connect(SessionRequest::Join(7)))
        );
    }

    #[test]
    fn test_decode_reveal_is_big_endian_row_first() {
        assert_eq!(
            decode_command(&[0x81, 0x01, 0x02, 0x00, 0x05]),
            Ok(ClientCommand::Reveal {
                coord: Coord::new(0x0102, 5)
            })
        );
    }

    #[test]
    fn test_decode_flag_unflag_byte() {
        assert_eq!(
            decode_command(&[0x83, 0, 3, 0, 4, 0]),
            Ok(ClientCommand::Flag {
                coord: Coord::new(3, 4),
                unflag: false
            })
        );
        assert_eq!(
            decode_command(&[0x83, 0, 3, 0, 4, 0x2a]),
            Ok(ClientCommand::Flag {
                coord: Coord::new(3, 4),
                unflag: true
            })
        );
    }

    #[test]
    fn test_decode_reset_ignores_trailing_bytes() {
        assert_eq!(decode_command(&[0x82]), Ok(ClientCommand::Reset));
        assert_eq!(decode_command(&[0x82, 1, 2, 3]), Ok(ClientCommand::Reset));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_command(&[]), Err(ProtocolError::Empty));
        assert_eq!(decode_command(&[0x42, 1]), Err(ProtocolError::UnknownOpcode(0x42)));
        assert_eq!(
            decode_command(&[0x80]),
            Err(ProtocolError::Truncated {
                opcode: 0x80,
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            decode_command(&[0x80, 0xFF, 10]),
            Err(ProtocolError::Truncated {
                opcode: 0x80,
                expected: 5,
                actual: 3
            })
        );
        assert_eq!(
            decode_command(&[0x81, 0, 1, 0]),
            Err(ProtocolError::Truncated {
                opcode: 0x81,
                expected: 5,
                actual: 4
            })
        );
        assert_eq!(
            decode_command(&[0x83, 0, 1, 0, 1]),
            Err(ProtocolError::Truncated {
                opcode: 0x83,
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_encoded_commands_decode_back() {
        let commands = [
            ClientCommand::Connect(SessionRequest::New {
                rows: 16,
                cols: 30,
                mine_count: 99,
            }),
            ClientCommand::Connect(SessionRequest::Join(254)),
            ClientCommand::Reveal {
                coord: Coord::new(300, 2),
            },
            ClientCommand::Reset,
            ClientCommand::Flag {
                coord: Coord::new(1, 65535),
                unflag: true,
            },
        ];

        for command in commands {
            assert_eq!(decode_command(&encode_command(&command)), Ok(command));
        }
        assert_eq!(
            encode_command(&ClientCommand::Connect(SessionRequest::Join(3))),
            vec![0x80, 3, 0, 0, 0]
        );
    }
}
