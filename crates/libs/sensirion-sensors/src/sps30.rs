//! SPS30 particulate matter sensor.

use serde::Serialize;
use shdlc::bytes::{bytes_to_f32, bytes_to_u32, u32_to_bytes};
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
pub const CMD_SLEEP: u8 = 0x10;
pub const CMD_WAKE_UP: u8 = 0x11;
pub const CMD_START_FAN_CLEANING: u8 = 0x56;
pub const CMD_FAN_CLEAN_INTERVAL: u8 = 0x80;
pub const CMD_DEVICE_INFO: u8 = 0xd0;
pub const CMD_READ_VERSION: u8 = 0xd1;
pub const CMD_RESET: u8 = 0xd3;

const SUBCMD_START_FLOAT_OUTPUT: [u8; 2] = [0x01, 0x03];
const SUBCMD_FAN_CLEAN_INTERVAL: u8 = 0x00;
const SUBCMD_SERIAL: [u8; 1] = [0x03];

/// Byte sent outside any frame to bring the UART out of sleep.
const WAKE_UP_PULSE: u8 = 0xff;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// One measurement in float output mode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sps30Measurement {
    /// Mass concentration, µg/m³.
    pub mc_1p0: f32,
    pub mc_2p5: f32,
    pub mc_4p0: f32,
    pub mc_10p0: f32,
    /// Number concentration, #/cm³.
    pub nc_0p5: f32,
    pub nc_1p0: f32,
    pub nc_2p5: f32,
    pub nc_4p0: f32,
    pub nc_10p0: f32,
    /// µm.
    pub typical_particle_size: f32,
}

impl Sps30Measurement {
    pub const LEN: usize = 40;

    pub fn from_bytes(data: &[u8]) -> Result<Self, SensorError> {
        expect_len(data, Self::LEN)?;
        let value = |index: usize| bytes_to_f32(&data[index * 4..index * 4 + 4]);
        Ok(Self {
            mc_1p0: value(0),
            mc_2p5: value(1),
            mc_4p0: value(2),
            mc_10p0: value(3),
            nc_0p5: value(4),
            nc_1p0: value(5),
            nc_2p5: value(6),
            nc_4p0: value(7),
            nc_10p0: value(8),
            typical_particle_size: value(9),
        })
    }
}

/// SPS30 driver over an SHDLC engine.
#[derive(Debug)]
pub struct Sps30<T> {
    shdlc: Shdlc<T>,
}

impl<T: Transport> Sps30<T> {
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

    /// Checks that a sensor answers, returning its serial number.
    ///
    /// A sensor that is not asleep rejects the wake-up; that failure is
    /// ignored.
    pub fn probe(&mut self) -> Result<String, SensorError> {
        if let Err(err) = self.wake_up() {
            log::debug!("sps30: wake-up before probe failed: {err}");
        }
        self.serial_number()
    }

    pub fn serial_number(&mut self) -> Result<String, SensorError> {
        let data =
            execute(&mut self.shdlc, ADDRESS, CMD_DEVICE_INFO, &SUBCMD_SERIAL, MAX_SERIAL_LEN)?;
        Ok(parse_serial(&data))
    }

    pub fn start_measurement(&mut self) -> Result<(), SensorError> {
        execute(&mut self.shdlc, ADDRESS, CMD_START_MEASUREMENT, &SUBCMD_START_FLOAT_OUTPUT, 0)?;
        Ok(())
    }

    pub fn stop_measurement(&mut self) -> Result<(), SensorError> {
        execute(&mut self.shdlc, ADDRESS, CMD_STOP_MEASUREMENT, &[], 0)?;
        Ok(())
    }

    /// Reads the latest measurement.
    ///
    /// A non-zero device state is returned with the values instead of as an
    /// error.
    pub fn read_measurement(&mut self) -> Result<Measured<Sps30Measurement>, SensorError> {
        let (header, data) =
            self.shdlc.transact(ADDRESS, CMD_READ_MEASUREMENT, &[], Sps30Measurement::LEN)?;
        let value = Sps30Measurement::from_bytes(&data)?;
        Ok(Measured { value, state: DeviceState::from(header) })
    }

    /// Puts the sensor into its low-power state. Needs firmware 2.0 or later.
    pub fn sleep(&mut self) -> Result<(), SensorError> {
        execute(&mut self.shdlc, ADDRESS, CMD_SLEEP, &[], 0)?;
        Ok(())
    }

    pub fn wake_up(&mut self) -> Result<(), SensorError> {
        self.shdlc.transmit_raw(&[WAKE_UP_PULSE])?;
        execute(&mut self.shdlc, ADDRESS, CMD_WAKE_UP, &[], 0)?;
        Ok(())
    }

    /// Auto-cleaning interval in seconds.
    pub fn fan_auto_cleaning_interval(&mut self) -> Result<u32, SensorError> {
        let data = execute(
            &mut self.shdlc,
            ADDRESS,
            CMD_FAN_CLEAN_INTERVAL,
            &[SUBCMD_FAN_CLEAN_INTERVAL],
            4,
        )?;
        expect_len(&data, 4)?;
        Ok(bytes_to_u32(&data))
    }

    pub fn set_fan_auto_cleaning_interval(&mut self, seconds: u32) -> Result<(), SensorError> {
        let mut payload = [0u8; 5];
        payload[0] = SUBCMD_FAN_CLEAN_INTERVAL;
        payload[1..].copy_from_slice(&u32_to_bytes(seconds));

        let (header, _) = self.shdlc.transact(ADDRESS, CMD_FAN_CLEAN_INTERVAL, &payload, 4)?;
        check_state(header)
    }

    /// Auto-cleaning interval in whole days, rounded down.
    pub fn fan_auto_cleaning_interval_days(&mut self) -> Result<u32, SensorError> {
        Ok(self.fan_auto_cleaning_interval()? / SECONDS_PER_DAY)
    }

    pub fn set_fan_auto_cleaning_interval_days(&mut self, days: u8) -> Result<(), SensorError> {
        self.set_fan_auto_cleaning_interval(u32::from(days) * SECONDS_PER_DAY)
    }

    pub fn start_manual_fan_cleaning(&mut self) -> Result<(), SensorError> {
        execute(&mut self.shdlc, ADDRESS, CMD_START_FAN_CLEANING, &[], 0)?;
        Ok(())
    }

    pub fn read_version(&mut self) -> Result<VersionInformation, SensorError> {
        let (header, data) =
            self.shdlc.transact(ADDRESS, CMD_READ_VERSION, &[], VersionInformation::LEN)?;
        expect_len(&data, VersionInformation::LEN)?;
        check_state(header)?;
        VersionInformation::from_bytes(&data)
    }

    /// Sends a soft reset. The sensor does not answer.
    pub fn reset(&mut self) -> Result<(), SensorError> {
        self.shdlc.transmit_only(ADDRESS, CMD_RESET, &[])?;
        Ok(())
    }
}
