use std::fmt;

use serde::Serialize;
use shdlc::{FrameHeader, Shdlc, Transport};

use crate::error::SensorError;

/// Longest serial number string a device returns, terminator included.
pub const MAX_SERIAL_LEN: usize = 32;

const ERROR_FLAG: u8 = 0x80;
const EXECUTION_ERROR_MASK: u8 = 0x7f;

/// State byte from a response header.
///
/// Bit 7 flags a device error; bits 0-6 hold the execution error code of
/// the last command. Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceState(pub u8);

impl DeviceState {
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn has_error_flag(self) -> bool {
        self.0 & ERROR_FLAG != 0
    }

    pub fn execution_error(self) -> u8 {
        self.0 & EXECUTION_ERROR_MASK
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl From<FrameHeader> for DeviceState {
    fn from(header: FrameHeader) -> Self {
        Self(header.state)
    }
}

/// A reading together with the device state reported alongside it.
///
/// A non-zero state does not invalidate the values, but they may be
/// inaccurate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measured<T> {
    pub value: T,
    pub state: DeviceState,
}

impl<T> Measured<T> {
    pub fn is_accurate(&self) -> bool {
        self.state.is_ok()
    }
}

/// Firmware, hardware and protocol versions of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionInformation {
    pub firmware_major: u8,
    pub firmware_minor: u8,
    pub hardware_revision: u8,
    pub shdlc_major: u8,
    pub shdlc_minor: u8,
}

impl VersionInformation {
    pub const LEN: usize = 7;

    /// Bytes 2 and 4 are reserved.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SensorError> {
        expect_len(data, Self::LEN)?;
        Ok(Self {
            firmware_major: data[0],
            firmware_minor: data[1],
            hardware_revision: data[3],
            shdlc_major: data[5],
            shdlc_minor: data[6],
        })
    }
}

impl fmt::Display for VersionInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FW: {}.{} HW: {}, SHDLC: {}.{}",
            self.firmware_major,
            self.firmware_minor,
            self.hardware_revision,
            self.shdlc_major,
            self.shdlc_minor
        )
    }
}

/// Serial numbers are NUL-terminated ASCII.
pub fn parse_serial(data: &[u8]) -> String {
    let data = &data[..data.len().min(MAX_SERIAL_LEN)];
    let end = data.iter().position(|&byte| byte == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

pub(crate) fn expect_len(data: &[u8], expected: usize) -> Result<(), SensorError> {
    if data.len() < expected {
        return Err(SensorError::NotEnoughData { expected, received: data.len() });
    }
    Ok(())
}

pub(crate) fn check_state(header: FrameHeader) -> Result<(), SensorError> {
    let state = DeviceState::from(header);
    if state.is_ok() {
        return Ok(());
    }
    log::warn!("sensor: cmd=0x{:02x} rejected with state {}", header.command, state);
    Err(SensorError::DeviceState(state))
}

/// Runs one command and fails on a non-zero device state.
pub(crate) fn execute<T: Transport>(
    shdlc: &mut Shdlc<T>,
    address: u8,
    command: u8,
    data: &[u8],
    max_rx_len: usize,
) -> Result<Vec<u8>, SensorError> {
    let (header, rx_data) = shdlc.transact(address, command, data, max_rx_len)?;
    check_state(header)?;
    Ok(rx_data)
}
