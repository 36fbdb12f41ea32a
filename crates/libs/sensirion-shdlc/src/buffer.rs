use crate::error::ShdlcError;

/// Write cursor over a caller-owned byte slice.
///
/// Frames are assembled into a fixed-size array sized for the worst-case
/// stuffed frame, so encoding never allocates.
pub struct OutputBuffer<'a> {
    storage: &'a mut [u8],
    len: usize,
}

impl<'a> OutputBuffer<'a> {
    pub fn new(storage: &'a mut [u8]) -> Self {
        Self { storage, len: 0 }
    }

    /// Appends `bytes`, or leaves the buffer untouched when they do not fit.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, ShdlcError> {
        let end = self.len + bytes.len();
        let target = self.storage.get_mut(self.len..end).ok_or(ShdlcError::BufferTooSmall)?;
        target.copy_from_slice(bytes);
        self.len = end;
        Ok(bytes.len())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<usize, ShdlcError> {
        self.write(&[byte])
    }

    /// Bytes written so far.
    pub fn offset(&self) -> usize {
        self.len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }
}
