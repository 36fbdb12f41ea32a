//! SEN44 environmental sensor node (PM, VOC, RH/T).

use serde::Serialize;
use shdlc::bytes::{bytes_to_i16, bytes_to_u16};
use shdlc::{Shdlc, Transport};

use crate::device::{
    check_state, execute, expect_len, parse_serial, DeviceState, Measured, VersionInformation,
    MAX_SERIAL_LEN,
};
use crate::error::SensorError;

pub const ADDRESS: u8 = 0x00;

pub const CMD_START_MEASUREMENT: u8 = 0x00;
pub const CMD_STOP_MEASUREMENT: u8 = 0x01;
pub const CMD_READ_MEASUREMENT: u8 = 0x03;
pub const CMD_DEVICE_INFO: u8 = 0xd0;
pub const CMD_READ_VERSION: u8 = 0xd1;
pub const CMD_READ_DEVICE_STATUS: u8 = 0xd2;
pub const CMD_RESET: u8 = 0xd3;

const MEASUREMENT_MODE: [u8; 1] = [0x02];
const SUBCMD_READ_MEASUREMENT: [u8; 1] = [0x07];
const SUBCMD_SERIAL: [u8; 1] = [0x03];
/// Reads the status register without clearing it.
const SUBCMD_KEEP_STATUS: [u8; 1] = [0x00];

const STATUS_REGISTER_LEN: usize = 5;

/// One measurement as raw fixed-point integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Sen44Measurement {
    /// Mass concentration, µg/m³.
    pub mc_1p0: u16,
    pub mc_2p5: u16,
    pub mc_4p0: u16,
    pub mc_10p0: u16,
    /// VOC index scaled by 10.
    pub voc_index: i16,
    /// %RH scaled by 100.
    pub ambient_humidity: i16,
    /// °C scaled by 200.
    pub ambient_temperature: i16,
}

impl Sen44Measurement {
    pub const LEN: usize = 14;

    pub fn from_bytes(data: &[u8]) -> Result<Self, SensorError> {
        expect_len(data, Self::LEN)?;
        Ok(Self {
            mc_1p0: bytes_to_u16(&data[0..]),
            mc_2p5: bytes_to_u16(&data[2..]),
            mc_4p0: bytes_to_u16(&data[4..]),
            mc_10p0: bytes_to_u16(&data[6..]),
            voc_index: bytes_to_i16(&data[8..]),
            ambient_humidity: bytes_to_i16(&data[10..]),
            ambient_temperature: bytes_to_i16(&data[12..]),
        })
    }

    pub fn voc_index(&self) -> f32 {
        f32::from(self.voc_index) / 10.0
    }

    pub fn humidity_percent(&self) -> f32 {
        f32::from(self.ambient_humidity) / 100.0
    }

    pub fn temperature_celsius(&self) -> f32 {
        f32::from(self.ambient_temperature) / 200.0
    }
}

/// SEN44 driver over an SHDLC engine.
#[derive(Debug)]
pub struct Sen44<T> {
    shdlc: Shdlc<T>,
}

impl<T: Transport> Sen44<T> {
    pub fn new(shdlc: Shdlc<T>) -> Self {
        Self { shdlc }
    }

    pub fn shdlc(&self) -> &Shdlc<T> {
        &self.shdlc
    }

    pub fn shdlc_mut(&mut self) -> &mut Shdlc<T> {
        &mut self.shdlc
    }

    pub fn into_inner(self) -> Shdlc<T> {
        self.shdlc
    }

    pub fn probe(&mut self) -> Result<String, SensorError> {
        self.serial_number()
    }

    pub fn serial_number(&mut self) -> Result<String, SensorError> {
        let data =
            execute(&mut self.shdlc, ADDRESS, CMD_DEVICE_INFO, &SUBCMD_SERIAL, MAX_SERIAL_LEN)?;
        Ok(parse_serial(&data))
    }

    pub fn start_measurement(&mut self) -> Result<(), SensorError> {
        execute(&mut self.shdlc, ADDRESS, CMD_START_MEASUREMENT, &MEASUREMENT_MODE, 0)?;
        Ok(())
    }

    pub fn stop_measurement(&mut self) -> Result<(), SensorError> {
        execute(&mut self.shdlc, ADDRESS, CMD_STOP_MEASUREMENT, &[], 0)?;
        Ok(())
    }

    /// Reads the latest measurement; see [`Measured`] for the state.
    pub fn read_measurement(&mut self) -> Result<Measured<Sen44Measurement>, SensorError> {
        let (header, data) = self.shdlc.transact(
            ADDRESS,
            CMD_READ_MEASUREMENT,
            &SUBCMD_READ_MEASUREMENT,
            Sen44Measurement::LEN,
        )?;
        let value = Sen44Measurement::from_bytes(&data)?;
        Ok(Measured { value, state: DeviceState::from(header) })
    }

    pub fn read_version(&mut self) -> Result<VersionInformation, SensorError> {
        let (header, data) =
            self.shdlc.transact(ADDRESS, CMD_READ_VERSION, &[], VersionInformation::LEN)?;
        expect_len(&data, VersionInformation::LEN)?;
        check_state(header)?;
        VersionInformation::from_bytes(&data)
    }

    /// Reads the device status register, least significant byte first on
    /// the wire.
    pub fn read_device_status_register(&mut self) -> Result<u32, SensorError> {
        let data = execute(
            &mut self.shdlc,
            ADDRESS,
            CMD_READ_DEVICE_STATUS,
            &SUBCMD_KEEP_STATUS,
            STATUS_REGISTER_LEN,
        )?;
        expect_len(&data, 4)?;
        Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Sends a soft reset. The sensor does not answer.
    pub fn reset(&mut self) -> Result<(), SensorError> {
        self.shdlc.transmit_only(ADDRESS, CMD_RESET, &[])?;
        Ok(())
    }
}
