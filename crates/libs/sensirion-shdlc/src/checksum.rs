/// Running modulo-256 byte sum, finished as its one's complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    pub const fn new() -> Self {
        Self { sum: 0 }
    }

    pub fn push(&mut self, byte: u8) -> &mut Self {
        self.sum = self.sum.wrapping_add(byte);
        self
    }

    pub fn extend(&mut self, data: &[u8]) -> &mut Self {
        for &byte in data {
            self.push(byte);
        }
        self
    }

    pub fn value(&self) -> u8 {
        !self.sum
    }
}

/// Checksum of a request frame (host to device).
pub fn checksum(address: u8, command: u8, data_len: u8, data: &[u8]) -> u8 {
    Checksum::new().push(address).push(command).push(data_len).extend(data).value()
}

/// Checksum of a response frame, which also covers the device state byte.
pub fn response_checksum(address: u8, command: u8, state: u8, data_len: u8, data: &[u8]) -> u8 {
    Checksum::new().push(address).push(command).push(state).push(data_len).extend(data).value()
}
