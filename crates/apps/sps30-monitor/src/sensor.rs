use std::fmt;
use std::time::Duration;

use anyhow::bail;
use clap::ValueEnum;
use sensirion_sensors::{
    Measured, Sen44, Sen44Measurement, SensorError, Sps30, Sps30Measurement, VersionInformation,
};
use serde::{Deserialize, Serialize};
use shdlc::{Shdlc, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Sps30,
    Sen44,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sps30 => f.write_str("SPS30"),
            Self::Sen44 => f.write_str("SEN44"),
        }
    }
}

/// SEN44 values with the fixed-point scaling applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sen44Reading {
    pub mc_1p0: u16,
    pub mc_2p5: u16,
    pub mc_4p0: u16,
    pub mc_10p0: u16,
    pub voc_index: f32,
    pub humidity_percent: f32,
    pub temperature_celsius: f32,
}

impl From<Sen44Measurement> for Sen44Reading {
    fn from(raw: Sen44Measurement) -> Self {
        Self {
            mc_1p0: raw.mc_1p0,
            mc_2p5: raw.mc_2p5,
            mc_4p0: raw.mc_4p0,
            mc_10p0: raw.mc_10p0,
            voc_index: raw.voc_index(),
            humidity_percent: raw.humidity_percent(),
            temperature_celsius: raw.temperature_celsius(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "sensor", rename_all = "lowercase")]
pub enum Reading {
    Sps30(Sps30Measurement),
    Sen44(Sen44Reading),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sps30(m) => write!(
                f,
                "pm1.0 {:.2} pm2.5 {:.2} pm4.0 {:.2} pm10.0 {:.2} µg/m³ | nc0.5 {:.2} nc1.0 {:.2} nc2.5 {:.2} nc4.0 {:.2} nc10.0 {:.2} #/cm³ | typical size {:.2} µm",
                m.mc_1p0,
                m.mc_2p5,
                m.mc_4p0,
                m.mc_10p0,
                m.nc_0p5,
                m.nc_1p0,
                m.nc_2p5,
                m.nc_4p0,
                m.nc_10p0,
                m.typical_particle_size
            ),
            Self::Sen44(m) => write!(
                f,
                "pm1.0 {} pm2.5 {} pm4.0 {} pm10.0 {} µg/m³ | voc index {:.1} | {:.2} %RH | {:.2} °C",
                m.mc_1p0,
                m.mc_2p5,
                m.mc_4p0,
                m.mc_10p0,
                m.voc_index,
                m.humidity_percent,
                m.temperature_celsius
            ),
        }
    }
}

/// Either supported driver behind one interface.
#[derive(Debug)]
pub enum Sensor<T> {
    Sps30(Sps30<T>),
    Sen44(Sen44<T>),
}

impl<T: Transport> Sensor<T> {
    pub fn new(kind: SensorKind, shdlc: Shdlc<T>) -> Self {
        match kind {
            SensorKind::Sps30 => Self::Sps30(Sps30::new(shdlc)),
            SensorKind::Sen44 => Self::Sen44(Sen44::new(shdlc)),
        }
    }

    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Sps30(_) => SensorKind::Sps30,
            Self::Sen44(_) => SensorKind::Sen44,
        }
    }

    fn shdlc_mut(&mut self) -> &mut Shdlc<T> {
        match self {
            Self::Sps30(sensor) => sensor.shdlc_mut(),
            Self::Sen44(sensor) => sensor.shdlc_mut(),
        }
    }

    pub fn into_inner(self) -> Shdlc<T> {
        match self {
            Self::Sps30(sensor) => sensor.into_inner(),
            Self::Sen44(sensor) => sensor.into_inner(),
        }
    }

    /// Waits on the transport clock.
    pub fn pause(&mut self, duration: Duration) {
        self.shdlc_mut().sleep(duration);
    }

    pub fn probe(&mut self) -> Result<String, SensorError> {
        match self {
            Self::Sps30(sensor) => sensor.probe(),
            Self::Sen44(sensor) => sensor.probe(),
        }
    }

    pub fn read_version(&mut self) -> Result<VersionInformation, SensorError> {
        match self {
            Self::Sps30(sensor) => sensor.read_version(),
            Self::Sen44(sensor) => sensor.read_version(),
        }
    }

    /// SEN44 only.
    pub fn read_device_status_register(&mut self) -> Result<Option<u32>, SensorError> {
        match self {
            Self::Sps30(_) => Ok(None),
            Self::Sen44(sensor) => sensor.read_device_status_register().map(Some),
        }
    }

    pub fn start_measurement(&mut self) -> Result<(), SensorError> {
        match self {
            Self::Sps30(sensor) => sensor.start_measurement(),
            Self::Sen44(sensor) => sensor.start_measurement(),
        }
    }

    pub fn stop_measurement(&mut self) -> Result<(), SensorError> {
        match self {
            Self::Sps30(sensor) => sensor.stop_measurement(),
            Self::Sen44(sensor) => sensor.stop_measurement(),
        }
    }

    pub fn read_measurement(&mut self) -> Result<Measured<Reading>, SensorError> {
        match self {
            Self::Sps30(sensor) => {
                let measured = sensor.read_measurement()?;
                Ok(Measured { value: Reading::Sps30(measured.value), state: measured.state })
            }
            Self::Sen44(sensor) => {
                let measured = sensor.read_measurement()?;
                Ok(Measured { value: Reading::Sen44(measured.value.into()), state: measured.state })
            }
        }
    }

    /// Only the SPS30 with firmware 2.0 or later has a sleep mode.
    pub fn supports_sleep(&self, version: Option<&VersionInformation>) -> bool {
        matches!(self, Self::Sps30(_))
            && version.is_some_and(|version| version.firmware_major >= 2)
    }

    pub fn sleep(&mut self) -> anyhow::Result<()> {
        match self {
            Self::Sps30(sensor) => Ok(sensor.sleep()?),
            Self::Sen44(_) => bail!("SEN44 has no sleep mode"),
        }
    }

    pub fn wake_up(&mut self) -> anyhow::Result<()> {
        match self {
            Self::Sps30(sensor) => Ok(sensor.wake_up()?),
            Self::Sen44(_) => bail!("SEN44 has no sleep mode"),
        }
    }

    pub fn start_manual_fan_cleaning(&mut self) -> anyhow::Result<()> {
        match self {
            Self::Sps30(sensor) => Ok(sensor.start_manual_fan_cleaning()?),
            Self::Sen44(_) => bail!("SEN44 has no manual fan cleaning command"),
        }
    }

    pub fn fan_auto_cleaning_interval(&mut self) -> anyhow::Result<u32> {
        match self {
            Self::Sps30(sensor) => Ok(sensor.fan_auto_cleaning_interval()?),
            Self::Sen44(_) => bail!("SEN44 has no fan auto-cleaning interval"),
        }
    }

    pub fn set_fan_auto_cleaning_interval_days(&mut self, days: u8) -> anyhow::Result<()> {
        match self {
            Self::Sps30(sensor) => Ok(sensor.set_fan_auto_cleaning_interval_days(days)?),
            Self::Sen44(_) => bail!("SEN44 has no fan auto-cleaning interval"),
        }
    }

    pub fn reset(&mut self) -> Result<(), SensorError> {
        match self {
            Self::Sps30(sensor) => sensor.reset(),
            Self::Sen44(sensor) => sensor.reset(),
        }
    }
}
