use std::io::Write;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{io_result_to_transport, read_some, write_all_retrying, Transport};

/// A Unix domain socket driver.
///
/// `connect`'s address is a filesystem path, mirroring
/// `interprocess::os::unix::udsocket::UdStream::connect` — the teacher's own
/// Unix-domain stream type, which this driver is adapted from. The
/// transformed crate uses `std::os::unix::net::UnixStream` directly rather
/// than vendoring the teacher's raw-fd machinery, since that machinery
/// exists to support ancillary-data and peer-credential passing that are
/// outside this crate's scope — the safe standard-library socket already
/// satisfies the `Transport` contract in full (see `DESIGN.md`).
#[derive(Default)]
pub struct UnixSocketTransport {
    stream: Option<UnixStream>,
}

impl UnixSocketTransport {
    /// Creates a disconnected Unix socket transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for UnixSocketTransport {
    fn connect(&mut self, address: &str, timeout: Duration) -> Result<(), TransportError> {
        let stream = io_result_to_transport(UnixStream::connect(address))?;
        let read_timeout = if timeout.is_zero() { None } else { Some(timeout) };
        io_result_to_transport(stream.set_read_timeout(read_timeout))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stream = None;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::ConnectionClosed)?;
        read_some(stream, buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::ConnectionClosed)?;
        write_all_retrying(stream, bytes)?;
        stream.flush().map_err(TransportError::from_io)
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
