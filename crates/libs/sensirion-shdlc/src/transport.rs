use std::io;
use std::time::Duration;

/// Raw byte-stream collaborator used by the transaction engine.
///
/// Implementations own the underlying handle (a serial port, a socket, an
/// in-memory script). Errors are returned as-is to the caller of the engine.
pub trait Transport {
    fn open(&mut self) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;

    /// Returns the number of bytes accepted by the underlying device.
    fn transmit(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Returns whatever is available, up to `max_len` bytes.
    fn receive(&mut self, max_len: usize) -> io::Result<Vec<u8>>;

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn transmit(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).transmit(data)
    }

    fn receive(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).receive(max_len)
    }

    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}
