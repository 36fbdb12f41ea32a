//! In-memory transports for exercising SHDLC drivers without hardware.

use std::collections::VecDeque;
use std::io;
use std::sync::Once;
use std::time::Duration;

use shdlc::frame::{decode_request, response_frame, MAX_DATA_LEN};
use shdlc::{Request, Transport};

static INIT_LOGGING: Once = Once::new();

/// Routes `log` output through the test harness; `RUST_LOG` still applies.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .is_test(true)
            .try_init();
    });
}

/// Transport that replays queued wire bytes and records everything sent.
///
/// Each `receive` pops one queued reply, truncated to the requested length.
/// An empty queue behaves like a read timeout and yields no bytes.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Vec<u8>>,
    transmitted: Vec<Vec<u8>>,
    sleeps: Vec<Duration>,
    receive_limits: Vec<usize>,
    short_write: Option<usize>,
    open: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a well-formed response frame.
    pub fn push_response(&mut self, address: u8, command: u8, state: u8, data: &[u8]) {
        let frame = response_frame(address, command, state, data)
            .expect("scripted response payload fits in a frame");
        self.replies.push_back(frame);
    }

    /// Queues raw bytes, for malformed or partial replies.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    /// Makes every following transmit accept at most `accepted` bytes.
    pub fn limit_writes(&mut self, accepted: usize) {
        self.short_write = Some(accepted);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// Raw bytes of every transmit call, in order.
    pub fn transmitted(&self) -> &[Vec<u8>] {
        &self.transmitted
    }

    /// Transmitted frames that decode as requests; raw pulses are skipped.
    pub fn requests(&self) -> Vec<Request> {
        self.transmitted
            .iter()
            .filter_map(|bytes| decode_request(bytes, MAX_DATA_LEN).ok())
            .collect()
    }

    /// Commands of every decodable request, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.requests().iter().map(|request| request.command).collect()
    }

    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    pub fn receive_limits(&self) -> &[usize] {
        &self.receive_limits
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> io::Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> io::Result<usize> {
        let accepted = self.short_write.map_or(data.len(), |limit| limit.min(data.len()));
        self.transmitted.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn receive(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        self.receive_limits.push(max_len);
        let mut reply = self.replies.pop_front().unwrap_or_default();
        reply.truncate(max_len);
        Ok(reply)
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
