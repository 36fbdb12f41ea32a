use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use serde::Deserialize;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::frame::START_BYTE;
use crate::transport::Transport;

pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Serial line settings. Framing is fixed to 8N1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    /// Per-read timeout; a receive gives up once a read waits this long.
    pub timeout_ms: u64,
}

impl SerialConfig {
    pub fn new<T: Into<String>>(device: T) -> Self {
        Self { device: device.into(), ..Self::default() }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn set_device<T: Into<String>>(&mut self, device: T) {
        self.device = device.into();
    }

    pub fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = baud_rate;
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Blocking [`Transport`] over a local serial device.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port_mut(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        let device = &self.config.device;
        self.port.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, format!("serial device {device} is not open"))
        })
    }
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> io::Result<()> {
        let port = serialport::new(self.config.device.clone(), self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.config.timeout())
            .open()
            .map_err(|err| {
                log::warn!(
                    "serial: failed to open device={} baud_rate={} err={}",
                    self.config.device,
                    self.config.baud_rate,
                    err
                );
                io::Error::from(err)
            })?;

        port.clear(ClearBuffer::Input).map_err(io::Error::from)?;

        log::info!(
            "serial: opened device={} baud_rate={} timeout_ms={}",
            self.config.device,
            self.config.baud_rate,
            self.config.timeout_ms
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            log::debug!("serial: closed device={}", self.config.device);
        }
        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> io::Result<usize> {
        let port = self.port_mut()?;
        let written = port.write(data)?;
        port.flush()?;
        Ok(written)
    }

    fn receive(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        let port = self.port_mut()?;
        let mut received = Vec::with_capacity(max_len);
        let mut chunk = [0u8; 64];

        while received.len() < max_len && !frame_complete(&received) {
            let want = chunk.len().min(max_len - received.len());
            match port.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == io::ErrorKind::TimedOut => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(received)
    }
}

/// True once `buffer` holds an opening and a closing delimiter.
fn frame_complete(buffer: &[u8]) -> bool {
    buffer.iter().filter(|&&byte| byte == START_BYTE).take(2).count() == 2
}
