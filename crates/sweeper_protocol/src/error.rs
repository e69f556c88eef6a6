//! Errors produced while encoding or decoding frames.

/// A frame that cannot be decoded, or an event that cannot be encoded.
///
/// Decoding errors never close a connection on their own; the server drops the
/// frame and keeps reading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    /// The frame ended before its layout did
    #[error("Truncated frame for opcode 0x{opcode:02x}: expected {expected} bytes, got {actual}")]
    Truncated {
        opcode: u8,
        expected: usize,
        actual: usize,
    },

    /// A reveal batch whose tile count does not fit the u16 count field
    #[error("Reveal batch of {0} tiles does not fit in one frame")]
    BatchTooLarge(usize),

    #[error("Invalid tile type {0}")]
    InvalidTileType(i8),
}
