//! Big-endian scalar conversions for SHDLC payload fields.
//!
//! Sensirion devices transmit every multi-byte field most-significant byte
//! first. Readers take the leading 2 or 4 bytes of `bytes` and panic if the
//! slice is shorter, exactly like slice indexing.

pub fn bytes_to_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub fn bytes_to_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub fn bytes_to_i16(bytes: &[u8]) -> i16 {
    bytes_to_u16(bytes) as i16
}

pub fn bytes_to_i32(bytes: &[u8]) -> i32 {
    bytes_to_u32(bytes) as i32
}

/// Reinterprets the big-endian bit pattern as IEEE-754 binary32.
pub fn bytes_to_f32(bytes: &[u8]) -> f32 {
    f32::from_bits(bytes_to_u32(bytes))
}

pub fn u16_to_bytes(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

pub fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

pub fn i16_to_bytes(value: i16) -> [u8; 2] {
    value.to_be_bytes()
}

pub fn i32_to_bytes(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

pub fn f32_to_bytes(value: f32) -> [u8; 4] {
    u32_to_bytes(value.to_bits())
}
