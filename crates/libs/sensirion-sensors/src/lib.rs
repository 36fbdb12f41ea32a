//! Command layers for Sensirion's SHDLC sensors.
//!
//! Each driver owns a [`shdlc::Shdlc`] engine and maps device commands onto
//! single transactions. Nothing here touches the serial line directly.

pub mod device;
pub mod error;
pub mod sen44;
pub mod sps30;

pub use device::{DeviceState, Measured, VersionInformation};
pub use error::SensorError;
pub use sen44::{Sen44, Sen44Measurement};
pub use sps30::{Sps30, Sps30Measurement};
