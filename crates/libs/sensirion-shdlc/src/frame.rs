//! SHDLC wire frames.
//!
//! Request (host to device):
//! `0x7e | address | command | data_len | data.. | checksum | 0x7e`
//!
//! Response (device to host) carries the device state after the command:
//! `0x7e | address | command | state | data_len | data.. | checksum | 0x7e`
//!
//! Everything between the delimiters is byte-stuffed (see [`crate::stuffing`]).

use crate::buffer::OutputBuffer;
use crate::checksum::{checksum, response_checksum};
use crate::error::ShdlcError;
use crate::stuffing::{stuff_into, Unstuffer};

pub const START_BYTE: u8 = 0x7e;
pub const STOP_BYTE: u8 = 0x7e;

/// The length field is a single byte.
pub const MAX_DATA_LEN: usize = 255;

pub const REQUEST_HEADER_LEN: usize = 3;
pub const RESPONSE_HEADER_LEN: usize = 4;

/// Delimiters plus a fully stuffed request header, payload and checksum.
pub const MAX_TX_FRAME_LEN: usize = max_tx_frame_len(MAX_DATA_LEN);
/// Delimiters plus a fully stuffed response header, payload and checksum.
pub const MAX_RX_FRAME_LEN: usize = max_rx_frame_len(MAX_DATA_LEN);

pub const fn max_tx_frame_len(data_len: usize) -> usize {
    2 + (REQUEST_HEADER_LEN + 1 + data_len) * 2
}

pub const fn max_rx_frame_len(data_len: usize) -> usize {
    2 + (RESPONSE_HEADER_LEN + 1 + data_len) * 2
}

/// Decoded header of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub address: u8,
    pub command: u8,
    pub state: u8,
    pub data_len: u8,
}

/// Decoded request frame, as seen by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub address: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

fn data_len_of(data: &[u8]) -> Result<u8, ShdlcError> {
    u8::try_from(data.len()).map_err(|_| ShdlcError::PayloadTooLong(data.len()))
}

/// Encodes a request frame into `buffer` and returns the buffer offset.
///
/// A buffer of [`MAX_TX_FRAME_LEN`] bytes always suffices.
pub fn encode_request(
    address: u8,
    command: u8,
    data: &[u8],
    buffer: &mut OutputBuffer,
) -> Result<usize, ShdlcError> {
    let data_len = data_len_of(data)?;
    let crc = checksum(address, command, data_len, data);

    buffer.write_byte(START_BYTE)?;
    stuff_into(&[address, command, data_len], buffer)?;
    stuff_into(data, buffer)?;
    stuff_into(&[crc], buffer)?;
    buffer.write_byte(STOP_BYTE)?;

    Ok(buffer.offset())
}

/// Encodes a response frame into `buffer` and returns the buffer offset.
///
/// A buffer of [`MAX_RX_FRAME_LEN`] bytes always suffices.
pub fn encode_response(
    address: u8,
    command: u8,
    state: u8,
    data: &[u8],
    buffer: &mut OutputBuffer,
) -> Result<usize, ShdlcError> {
    let data_len = data_len_of(data)?;
    let crc = response_checksum(address, command, state, data_len, data);

    buffer.write_byte(START_BYTE)?;
    stuff_into(&[address, command, state, data_len], buffer)?;
    stuff_into(data, buffer)?;
    stuff_into(&[crc], buffer)?;
    buffer.write_byte(STOP_BYTE)?;

    Ok(buffer.offset())
}

pub fn request_frame(address: u8, command: u8, data: &[u8]) -> Result<Vec<u8>, ShdlcError> {
    let mut storage = [0u8; MAX_TX_FRAME_LEN];
    let mut buffer = OutputBuffer::new(&mut storage);
    encode_request(address, command, data, &mut buffer)?;
    Ok(buffer.as_slice().to_vec())
}

pub fn response_frame(
    address: u8,
    command: u8,
    state: u8,
    data: &[u8],
) -> Result<Vec<u8>, ShdlcError> {
    let mut storage = [0u8; MAX_RX_FRAME_LEN];
    let mut buffer = OutputBuffer::new(&mut storage);
    encode_response(address, command, state, data, &mut buffer)?;
    Ok(buffer.as_slice().to_vec())
}

/// Cursor over a received frame that unstuffs one region at a time.
///
/// Header and payload bytes must end before the last position of the buffer,
/// which is reserved for at least the checksum. A buffer cut short after the
/// checksum therefore fails on the stop byte, not on the payload.
struct FrameReader<'a> {
    frame: &'a [u8],
    position: usize,
    limit: usize,
    unstuffer: Unstuffer,
}

impl<'a> FrameReader<'a> {
    fn new(frame: &'a [u8]) -> Result<Self, ShdlcError> {
        if frame.first() != Some(&START_BYTE) {
            return Err(ShdlcError::MissingStart);
        }

        Ok(Self {
            frame,
            position: 1,
            limit: frame.len().saturating_sub(1),
            unstuffer: Unstuffer::new(),
        })
    }

    /// Fills `out` completely or fails with [`ShdlcError::EncodingError`].
    fn read_region(&mut self, out: &mut [u8]) -> Result<(), ShdlcError> {
        let mut filled = 0;

        while filled < out.len() && self.position < self.limit {
            if let Some(byte) = self.unstuffer.push(self.frame[self.position]) {
                out[filled] = byte;
                filled += 1;
            }
            self.position += 1;
        }

        if filled < out.len() || self.unstuffer.is_pending() {
            return Err(ShdlcError::EncodingError);
        }

        Ok(())
    }

    fn read_checksum(&mut self) -> Result<u8, ShdlcError> {
        while let Some(&byte) = self.frame.get(self.position) {
            self.position += 1;
            if let Some(value) = self.unstuffer.push(byte) {
                return Ok(value);
            }
        }

        Err(ShdlcError::EncodingError)
    }

    /// Bytes after the stop byte are ignored.
    fn expect_stop(&self) -> Result<(), ShdlcError> {
        match self.frame.get(self.position) {
            Some(&STOP_BYTE) => Ok(()),
            _ => Err(ShdlcError::MissingStop),
        }
    }
}

fn check_crc(computed: u8, received: u8) -> Result<(), ShdlcError> {
    if computed != received {
        return Err(ShdlcError::CrcMismatch { computed, received });
    }
    Ok(())
}

fn check_capacity(data_len: u8, max_data_len: usize) -> Result<(), ShdlcError> {
    let capacity = max_data_len.min(MAX_DATA_LEN);
    if usize::from(data_len) > capacity {
        return Err(ShdlcError::FrameTooLong { declared: usize::from(data_len), capacity });
    }
    Ok(())
}

/// Decodes and validates a response frame.
///
/// Frames declaring more than `max_data_len` payload bytes are rejected with
/// [`ShdlcError::FrameTooLong`] before any payload byte is read.
pub fn decode_response(
    frame: &[u8],
    max_data_len: usize,
) -> Result<(FrameHeader, Vec<u8>), ShdlcError> {
    let mut reader = FrameReader::new(frame)?;

    let mut raw = [0u8; RESPONSE_HEADER_LEN];
    reader.read_region(&mut raw)?;
    let header = FrameHeader { address: raw[0], command: raw[1], state: raw[2], data_len: raw[3] };

    check_capacity(header.data_len, max_data_len)?;

    let mut data = vec![0u8; usize::from(header.data_len)];
    reader.read_region(&mut data)?;

    let received = reader.read_checksum()?;
    let computed =
        response_checksum(header.address, header.command, header.state, header.data_len, &data);
    check_crc(computed, received)?;

    reader.expect_stop()?;

    Ok((header, data))
}

/// Decodes and validates a request frame.
pub fn decode_request(frame: &[u8], max_data_len: usize) -> Result<Request, ShdlcError> {
    let mut reader = FrameReader::new(frame)?;

    let mut raw = [0u8; REQUEST_HEADER_LEN];
    reader.read_region(&mut raw)?;
    let [address, command, data_len] = raw;

    check_capacity(data_len, max_data_len)?;

    let mut data = vec![0u8; usize::from(data_len)];
    reader.read_region(&mut data)?;

    let received = reader.read_checksum()?;
    check_crc(checksum(address, command, data_len, &data), received)?;

    reader.expect_stop()?;

    Ok(Request { address, command, data })
}
