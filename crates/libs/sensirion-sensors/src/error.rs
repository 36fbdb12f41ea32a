use shdlc::ShdlcError;

use crate::device::DeviceState;

/// Errors returned by the sensor command layers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SensorError {
    #[error(transparent)]
    Shdlc(#[from] ShdlcError),

    #[error("response carried {received} data bytes, expected {expected}")]
    NotEnoughData { expected: usize, received: usize },

    #[error("device reported state {0}")]
    DeviceState(DeviceState),
}

impl SensorError {
    /// Device state carried by the error, if the device rejected the command.
    pub fn device_state(&self) -> Option<DeviceState> {
        match self {
            Self::DeviceState(state) => Some(*state),
            _ => None,
        }
    }
}
