use std::time::Duration;

use crate::buffer::OutputBuffer;
use crate::config::ShdlcConfig;
use crate::error::ShdlcError;
use crate::frame::{
    decode_response, encode_request, max_rx_frame_len, FrameHeader, MAX_DATA_LEN,
    MAX_TX_FRAME_LEN,
};
use crate::transport::Transport;

/// Blocking SHDLC request/response engine bound to one transport handle.
///
/// Every call runs one complete exchange on the calling thread; `&mut self`
/// keeps a second exchange from starting on the same handle while one is in
/// flight.
#[derive(Debug)]
pub struct Shdlc<T> {
    transport: T,
    config: ShdlcConfig,
}

impl<T: Transport> Shdlc<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ShdlcConfig::default())
    }

    pub fn with_config(transport: T, config: ShdlcConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ShdlcConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn open(&mut self) -> Result<(), ShdlcError> {
        self.transport.open()?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), ShdlcError> {
        self.transport.close()?;
        Ok(())
    }

    /// Blocks the calling thread through the transport's clock.
    pub fn sleep(&mut self, duration: Duration) {
        self.transport.sleep(duration);
    }

    /// Sends a command frame without waiting for a response.
    pub fn transmit_only(&mut self, address: u8, command: u8, data: &[u8]) -> Result<(), ShdlcError> {
        let mut storage = [0u8; MAX_TX_FRAME_LEN];
        let mut buffer = OutputBuffer::new(&mut storage);
        encode_request(address, command, data, &mut buffer)?;

        log::debug!(
            "shdlc: tx addr=0x{:02x} cmd=0x{:02x} data_len={}",
            address,
            command,
            data.len()
        );

        self.send(buffer.as_slice())
    }

    /// Sends bytes verbatim, without framing.
    pub fn transmit_raw(&mut self, data: &[u8]) -> Result<(), ShdlcError> {
        self.send(data)
    }

    /// Runs one request/response exchange with the configured delay.
    pub fn transact(
        &mut self,
        address: u8,
        command: u8,
        data: &[u8],
        max_rx_len: usize,
    ) -> Result<(FrameHeader, Vec<u8>), ShdlcError> {
        let delay = self.config.rx_delay();
        self.transact_with_delay(address, command, data, max_rx_len, delay)
    }

    /// Runs one request/response exchange, waiting `delay` before reading.
    ///
    /// Commands that make the device finish a measurement cycle need more
    /// time than the default.
    pub fn transact_with_delay(
        &mut self,
        address: u8,
        command: u8,
        data: &[u8],
        max_rx_len: usize,
        delay: Duration,
    ) -> Result<(FrameHeader, Vec<u8>), ShdlcError> {
        self.transmit_only(address, command, data)?;

        self.transport.sleep(delay);

        let max_rx_len = max_rx_len.min(MAX_DATA_LEN);
        let received = self.transport.receive(max_rx_frame_len(max_rx_len))?;
        log::trace!("shdlc: rx frame {}", hex::encode(&received));

        let (header, rx_data) = decode_response(&received, max_rx_len).map_err(|err| {
            log::warn!(
                "shdlc: failed to decode response to cmd=0x{:02x} ({} bytes): {}",
                command,
                received.len(),
                err
            );
            err
        })?;

        if header.command != command {
            log::warn!(
                "shdlc: response echoes cmd=0x{:02x}, expected cmd=0x{:02x}",
                header.command,
                command
            );
        }

        log::debug!(
            "shdlc: rx addr=0x{:02x} cmd=0x{:02x} state=0x{:02x} data_len={}",
            header.address,
            header.command,
            header.state,
            header.data_len
        );

        Ok((header, rx_data))
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), ShdlcError> {
        log::trace!("shdlc: tx frame {}", hex::encode(frame));

        let written = self.transport.transmit(frame)?;
        if written != frame.len() {
            log::warn!("shdlc: short write, {} of {} bytes", written, frame.len());
            return Err(ShdlcError::TxIncomplete { written, expected: frame.len() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    use super::Shdlc;
    use crate::config::ShdlcConfig;
    use crate::error::ShdlcError;
    use crate::frame::{response_frame, MAX_RX_FRAME_LEN};
    use crate::transport::Transport;

    #[derive(Default)]
    struct MockTransport {
        tx: Vec<Vec<u8>>,
        rx: VecDeque<Vec<u8>>,
        receive_requests: Vec<usize>,
        sleeps: Vec<Duration>,
        accept_limit: Option<usize>,
        fail_transmit: bool,
        fail_receive: bool,
    }

    impl Transport for MockTransport {
        fn open(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn transmit(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.fail_transmit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port unplugged"));
            }
            let accepted = self.accept_limit.map_or(data.len(), |limit| limit.min(data.len()));
            self.tx.push(data[..accepted].to_vec());
            Ok(accepted)
        }

        fn receive(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
            self.receive_requests.push(max_len);
            if self.fail_receive {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "port locked"));
            }
            Ok(self.rx.pop_front().unwrap_or_default())
        }

        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }
    }

    #[test]
    fn transact_sends_waits_and_decodes() {
        let mut transport = MockTransport::default();
        transport.rx.push_back(response_frame(0x00, 0x00, 0x00, &[]).expect("encode"));
        let mut shdlc = Shdlc::new(transport);

        let (header, data) = shdlc.transact(0x00, 0x00, &[0x01, 0x03], 0).expect("transact");
        assert_eq!(header.command, 0x00);
        assert!(data.is_empty());

        let transport = shdlc.into_inner();
        assert_eq!(transport.tx, vec![vec![0x7e, 0x00, 0x00, 0x02, 0x01, 0x03, 0xf9, 0x7e]]);
        assert_eq!(transport.sleeps, vec![Duration::from_millis(20)]);
        assert_eq!(transport.receive_requests, vec![12]);
    }

    #[test]
    fn receive_request_is_capped_at_frame_maximum() {
        let mut transport = MockTransport::default();
        transport.rx.push_back(response_frame(0x00, 0x03, 0x00, &[0xaa; 4]).expect("encode"));
        let mut shdlc = Shdlc::new(transport);

        let (_, data) = shdlc.transact(0x00, 0x03, &[], 1_000).expect("transact");
        assert_eq!(data, vec![0xaa; 4]);
        assert_eq!(shdlc.transport().receive_requests, vec![MAX_RX_FRAME_LEN]);
    }

    #[test]
    fn configured_and_explicit_delays() {
        let mut transport = MockTransport::default();
        transport.rx.push_back(response_frame(0x00, 0x01, 0x00, &[]).expect("encode"));
        transport.rx.push_back(response_frame(0x00, 0x01, 0x00, &[]).expect("encode"));
        let config = ShdlcConfig::new().with_rx_delay(Duration::from_millis(5));
        let mut shdlc = Shdlc::with_config(transport, config);

        shdlc.transact(0x00, 0x01, &[], 0).expect("transact");
        shdlc
            .transact_with_delay(0x00, 0x01, &[], 0, Duration::from_millis(1_000))
            .expect("transact");
        assert_eq!(
            shdlc.transport().sleeps,
            vec![Duration::from_millis(5), Duration::from_millis(1_000)]
        );
    }

    #[test]
    fn short_write_is_tx_incomplete() {
        let transport = MockTransport { accept_limit: Some(3), ..Default::default() };
        let mut shdlc = Shdlc::new(transport);

        let err = shdlc.transact(0x00, 0x03, &[], 40).expect_err("short write");
        assert!(matches!(err, ShdlcError::TxIncomplete { written: 3, expected: 6 }));
        assert!(shdlc.transport().sleeps.is_empty());
        assert!(shdlc.transport().receive_requests.is_empty());
    }

    #[test]
    fn transport_failure_passes_through() {
        let transport = MockTransport { fail_transmit: true, ..Default::default() };
        let mut shdlc = Shdlc::new(transport);

        let err = shdlc.transmit_only(0x00, 0xd3, &[]).expect_err("transport failure");
        match err {
            ShdlcError::Transport(io) => {
                assert_eq!(io.kind(), std::io::ErrorKind::BrokenPipe);
                assert_eq!(io.to_string(), "port unplugged");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn receive_failure_passes_through() {
        let transport = MockTransport { fail_receive: true, ..Default::default() };
        let mut shdlc = Shdlc::new(transport);

        let err = shdlc.transact(0x00, 0x03, &[], 40).expect_err("receive failure");
        match err {
            ShdlcError::Transport(io) => {
                assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
                assert_eq!(io.to_string(), "port locked");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(shdlc.transport().tx.len(), 1);
        assert_eq!(shdlc.transport().sleeps, vec![Duration::from_millis(20)]);
    }

    #[test]
    fn transmit_only_skips_delay_and_receive() {
        let mut shdlc = Shdlc::new(MockTransport::default());
        shdlc.transmit_only(0x00, 0xd3, &[]).expect("reset");

        let transport = shdlc.into_inner();
        assert_eq!(transport.tx.len(), 1);
        assert!(transport.sleeps.is_empty());
        assert!(transport.receive_requests.is_empty());
    }

    #[test]
    fn empty_receive_is_missing_start() {
        let mut shdlc = Shdlc::new(MockTransport::default());
        let err = shdlc.transact(0x00, 0x03, &[], 40).expect_err("silence");
        assert!(matches!(err, ShdlcError::MissingStart));
    }

    #[test]
    fn raw_bytes_are_not_framed() {
        let mut shdlc = Shdlc::new(MockTransport::default());
        shdlc.transmit_raw(&[0xff]).expect("raw");
        assert_eq!(shdlc.transport().tx, vec![vec![0xff]]);
    }

    #[test]
    fn oversize_payload_never_reaches_transport() {
        let mut shdlc = Shdlc::new(MockTransport::default());
        let err = shdlc.transmit_only(0x00, 0x00, &[0u8; 300]).expect_err("too long");
        assert!(matches!(err, ShdlcError::PayloadTooLong(300)));
        assert!(shdlc.transport().tx.is_empty());
    }
}
