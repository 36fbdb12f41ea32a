/// Errors returned by the SHDLC codec and transaction engine.
///
/// None of these are retried by the engine. Transport failures are carried
/// unchanged in [`ShdlcError::Transport`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShdlcError {
    #[error("frame does not begin with the start byte")]
    MissingStart,

    #[error("frame does not end with the stop byte")]
    MissingStop,

    #[error("checksum mismatch: computed 0x{computed:02x}, received 0x{received:02x}")]
    CrcMismatch { computed: u8, received: u8 },

    #[error("malformed byte stuffing or truncated frame")]
    EncodingError,

    #[error("transmit incomplete: {written} of {expected} bytes accepted")]
    TxIncomplete { written: usize, expected: usize },

    #[error("declared payload of {declared} bytes exceeds receive capacity of {capacity}")]
    FrameTooLong { declared: usize, capacity: usize },

    #[error("payload of {0} bytes exceeds the 255 byte frame limit")]
    PayloadTooLong(usize),

    #[error("output buffer too small")]
    BufferTooSmall,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ShdlcError {
    /// Numeric code Sensirion's embedded UART driver reports for the same
    /// condition. Errors with no such code return `None`.
    pub fn code(&self) -> Option<i16> {
        match self {
            Self::MissingStart => Some(-2),
            Self::MissingStop => Some(-3),
            Self::CrcMismatch { .. } => Some(-4),
            Self::EncodingError => Some(-5),
            Self::TxIncomplete { .. } => Some(-6),
            Self::FrameTooLong { .. } => Some(-7),
            Self::PayloadTooLong(_) | Self::BufferTooSmall | Self::Transport(_) => None,
        }
    }

    /// Returns `true` for errors raised while validating a received frame.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Self::MissingStart
                | Self::MissingStop
                | Self::CrcMismatch { .. }
                | Self::EncodingError
                | Self::FrameTooLong { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ShdlcError;

    #[test]
    fn legacy_codes_cover_frame_errors() {
        assert_eq!(ShdlcError::MissingStart.code(), Some(-2));
        assert_eq!(ShdlcError::FrameTooLong { declared: 9, capacity: 4 }.code(), Some(-7));
        assert_eq!(ShdlcError::PayloadTooLong(300).code(), None);
    }

    #[test]
    fn transport_errors_are_not_frame_errors() {
        let err = ShdlcError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_frame_error());
        assert!(ShdlcError::CrcMismatch { computed: 1, received: 2 }.is_frame_error());
        assert_eq!(err.to_string(), "transport error: gone");
    }
}
