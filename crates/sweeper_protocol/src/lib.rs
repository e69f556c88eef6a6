//! # Sweeper Protocol
//!
//! The binary frame format carried in WebSocket binary messages. Every frame
//! starts with a one-byte opcode; multi-byte integers are big-endian.
//!
//! ## Client → Server
//!
//! | Opcode | Command | Payload |
//! |--------|---------|---------|
//! | `0x80` | Connect | `session_id:u8` (`0xFF` = new), then `rows:u8 cols:u8 mine_count:u8` |
//! | `0x81` | Reveal  | `y:u16 x:u16` |
//! | `0x82` | Reset   | - |
//! | `0x83` | Flag    | `y:u16 x:u16 unflag:u8` |
//!
//! ## Server → Client
//!
//! | Opcode | Event | Payload |
//! |--------|-------|---------|
//! | `0x00` | Connected   | `session_id:u8 rows:u8 cols:u8 mine_count:u8` |
//! | `0x01` | RevealBatch | `count:u16`, then `count` x (`y:u16 x:u16 type:i8`) |
//! | `0x02` | Lost  | - |
//! | `0x03` | Won   | - |
//! | `0x04` | Reset | - |
//!
//! Decoders ignore bytes past the end of a frame's layout.

pub mod command;
pub mod error;
pub mod event;
mod frame;

pub use command::{decode_command, encode_command, ClientCommand, SessionRequest};
pub use error::ProtocolError;
pub use event::{decode_event, encode_event};

/// Frame opcodes.
pub mod opcode {
    // Client → Server
    pub const CONNECT: u8 = 0x80;
    pub const REVEAL: u8 = 0x81;
    pub const RESET: u8 = 0x82;
    pub const FLAG: u8 = 0x83;

    // Server → Client
    pub const CONNECTED: u8 = 0x00;
    pub const REVEAL_BATCH: u8 = 0x01;
    pub const LOST: u8 = 0x02;
    pub const WON: u8 = 0x03;
    pub const SESSION_RESET: u8 = 0x04;
}

/// Session id byte in a Connect frame that asks for a new session.
pub const NEW_SESSION: u8 = 0xFF;
