//! Bounds-checked access to the fields of a raw frame.

use crate::error::ProtocolError;

/// A non-empty frame whose fields are read at fixed offsets.
pub(crate) struct Frame<'a> {
    opcode: u8,
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    pub(crate) fn parse(bytes: &'a [u8]) -> Result<Self, ProtocolError> {
        let opcode = *bytes.first().ok_or(ProtocolError::Empty)?;
        Ok(Self { opcode, bytes })
    }

    pub(crate) fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Fails unless the frame holds at least `len` bytes.
    pub(crate) fn require(&self, len: usize) -> Result<(), ProtocolError> {
        if self.bytes.len() < len {
            return Err(self.truncated(len));
        }
        Ok(())
    }

    pub(crate) fn u8_at(&self, offset: usize) -> Result<u8, ProtocolError> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or_else(|| self.truncated(offset + 1))
    }

    pub(crate) fn i8_at(&self, offset: usize) -> Result<i8, ProtocolError> {
        self.u8_at(offset).map(|byte| byte as i8)
    }

    pub(crate) fn u16_at(&self, offset: usize) -> Result<u16, ProtocolError> {
        match self.bytes.get(offset..offset + 2) {
            Some(&[high, low]) => Ok(u16::from_be_bytes([high, low])),
            _ => Err(self.truncated(offset + 2)),
        }
    }

    fn truncated(&self, expected: usize) -> ProtocolError {
        ProtocolError::Truncated {
            opcode: self.opcode,
            expected,
            actual: self.bytes.len(),
        }
    }
}
