use serde::Deserialize;
use shdlc::{SerialConfig, ShdlcConfig};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::sensor::SensorKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub shdlc: ShdlcConfig,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub sensor: SensorKind,
    pub samples_per_cycle: u32,
    pub sample_interval_ms: u64,
    pub idle_secs: u64,
    /// Written to the sensor once before monitoring starts.
    pub auto_clean_days: Option<u8>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sensor: SensorKind::Sps30,
            samples_per_cycle: 60,
            sample_interval_ms: 1_000,
            idle_secs: 60,
            auto_clean_days: None,
        }
    }
}

impl MonitorSettings {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }
}

impl AppConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    /// Command-line values win over the file.
    pub fn apply_overrides(
        &mut self,
        device: Option<String>,
        baud_rate: Option<u32>,
        sensor: Option<SensorKind>,
    ) {
        if let Some(device) = device {
            self.serial.set_device(device);
        }
        if let Some(baud_rate) = baud_rate {
            self.serial.set_baud_rate(baud_rate);
        }
        if let Some(sensor) = sensor {
            self.monitor.sensor = sensor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert_eq!(config.shdlc.rx_delay_ms, 20);
        assert_eq!(config.monitor.samples_per_cycle, 60);
        assert_eq!(config.monitor.idle(), Duration::from_secs(60));
    }

    #[test]
    fn reads_all_tables_from_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[serial]
device = "/dev/ttyAMA0"
baud_rate = 115200
timeout_ms = 250

[shdlc]
rx_delay_ms = 40

[monitor]
sensor = "sen44"
samples_per_cycle = 10
idle_secs = 5
auto_clean_days = 4
"#
        )
        .expect("write config");

        let config = AppConfig::from_path(file.path()).expect("load");
        assert_eq!(config.serial.device, "/dev/ttyAMA0");
        assert_eq!(config.serial.timeout_ms, 250);
        assert_eq!(config.shdlc.rx_delay_ms, 40);
        assert_eq!(config.monitor.sensor, SensorKind::Sen44);
        assert_eq!(config.monitor.samples_per_cycle, 10);
        assert_eq!(config.monitor.sample_interval_ms, 1_000);
        assert_eq!(config.monitor.auto_clean_days, Some(4));
    }

    #[test]
    fn malformed_file_is_invalid_data() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[serial]\nbaud_rate = \"fast\"").expect("write config");

        let err = AppConfig::from_path(file.path()).expect_err("invalid");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = AppConfig::from_path(dir.path().join("absent.toml")).expect_err("missing");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = AppConfig::from_toml("[serial]\ndevice = \"/dev/ttyS0\"").expect("parse");
        config.apply_overrides(Some("/dev/ttyUSB1".into()), None, Some(SensorKind::Sen44));
        assert_eq!(config.serial.device, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.monitor.sensor, SensorKind::Sen44);

        config.apply_overrides(None, Some(9_600), None);
        assert_eq!(config.serial.device, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 9_600);
    }
}
