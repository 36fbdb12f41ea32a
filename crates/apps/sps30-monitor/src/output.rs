use std::io::{self, Write};

use sensirion_sensors::{DeviceState, VersionInformation};
use serde::Serialize;

use crate::sensor::{Reading, SensorKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub sensor: SensorKind,
    pub serial_number: String,
    pub version: Option<VersionInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_register: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub cycle: u64,
    pub index: u32,
    pub state: DeviceState,
    pub accurate: bool,
    pub reading: Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningInterval {
    pub seconds: u32,
    pub days: u32,
}

/// Writes results as text lines or as one JSON object per line.
pub struct Printer<W> {
    out: W,
    json: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn info(&mut self, info: &DeviceInfo) -> io::Result<()> {
        if self.json {
            return self.json_line(info);
        }
        writeln!(self.out, "{} serial: {}", info.sensor, info.serial_number)?;
        if let Some(version) = &info.version {
            writeln!(self.out, "{version}")?;
        }
        if let Some(register) = info.status_register {
            writeln!(self.out, "device status register: 0x{register:08x}")?;
        }
        Ok(())
    }

    pub fn sample(&mut self, sample: &Sample) -> io::Result<()> {
        if !sample.accurate {
            log::warn!("chip state {} - measurements may not be accurate", sample.state);
        }
        if self.json {
            return self.json_line(sample);
        }
        writeln!(self.out, "{}", sample.reading)
    }

    pub fn cleaning_interval(&mut self, interval: CleaningInterval) -> io::Result<()> {
        if self.json {
            return self.json_line(&interval);
        }
        writeln!(
            self.out,
            "fan auto-cleaning interval: {} s ({} days)",
            interval.seconds, interval.days
        )
    }

    pub fn message(&mut self, message: &str) -> io::Result<()> {
        if self.json {
            return self.json_line(&serde_json::json!({ "status": message }));
        }
        writeln!(self.out, "{message}")
    }

    fn json_line<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
