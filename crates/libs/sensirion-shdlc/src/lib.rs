//! SHDLC link layer for serial-attached Sensirion sensors.
//!
//! The crate is split into a pure frame codec ([`bytes`], [`stuffing`],
//! [`checksum`], [`frame`]) and a blocking request/response engine
//! ([`engine::Shdlc`]) that drives any [`transport::Transport`].

pub mod buffer;
pub mod bytes;
pub mod checksum;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
#[cfg(feature = "serial")]
pub mod serial;
pub mod stuffing;
pub mod transport;

pub use config::ShdlcConfig;
pub use engine::Shdlc;
pub use error::ShdlcError;
pub use frame::{FrameHeader, Request};
pub use transport::Transport;

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport};
