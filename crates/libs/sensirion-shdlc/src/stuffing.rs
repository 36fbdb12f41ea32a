use crate::buffer::OutputBuffer;
use crate::error::ShdlcError;

pub const ESCAPE_BYTE: u8 = 0x7d;
pub const ESCAPE_MASK: u8 = 0b0010_0000;

/// Bytes that never appear literally between the frame delimiters.
pub const RESERVED_BYTES: [u8; 4] = [0x11, 0x13, ESCAPE_BYTE, 0x7e];

pub fn is_reserved(byte: u8) -> bool {
    RESERVED_BYTES.contains(&byte)
}

/// Appends `data` to `buffer`, escaping every reserved byte.
pub fn stuff_into(data: &[u8], buffer: &mut OutputBuffer) -> Result<usize, ShdlcError> {
    let start = buffer.offset();

    for &byte in data {
        if is_reserved(byte) {
            buffer.write(&[ESCAPE_BYTE, byte ^ ESCAPE_MASK])?;
        } else {
            buffer.write_byte(byte)?;
        }
    }

    Ok(buffer.offset() - start)
}

pub fn stuff(data: &[u8]) -> Vec<u8> {
    let mut stuffed = Vec::with_capacity(data.len() * 2);
    for &byte in data {
        if is_reserved(byte) {
            stuffed.extend_from_slice(&[ESCAPE_BYTE, byte ^ ESCAPE_MASK]);
        } else {
            stuffed.push(byte);
        }
    }
    stuffed
}

/// Recovers the original value of the byte following an escape.
///
/// `was_escaped == false` passes the byte through.
pub fn unstuff_byte(byte: u8, was_escaped: bool) -> u8 {
    if was_escaped {
        byte ^ ESCAPE_MASK
    } else {
        byte
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnstuffState {
    #[default]
    Normal,
    PendingUnescape,
}

/// Byte-at-a-time unstuffing state machine.
///
/// The decoder keeps one instance alive across the header, payload and
/// checksum regions; [`Unstuffer::is_pending`] at a region boundary means the
/// region ended on a dangling escape.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unstuffer {
    state: UnstuffState,
}

impl Unstuffer {
    pub const fn new() -> Self {
        Self { state: UnstuffState::Normal }
    }

    pub fn state(&self) -> UnstuffState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == UnstuffState::PendingUnescape
    }

    /// Feeds one wire byte, returning the decoded byte once one is complete.
    pub fn push(&mut self, byte: u8) -> Option<u8> {
        match self.state {
            UnstuffState::PendingUnescape => {
                self.state = UnstuffState::Normal;
                Some(unstuff_byte(byte, true))
            }
            UnstuffState::Normal if byte == ESCAPE_BYTE => {
                self.state = UnstuffState::PendingUnescape;
                None
            }
            UnstuffState::Normal => Some(byte),
        }
    }
}
