use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{io_result_to_transport, read_some, write_all_retrying, Transport};

/// A TCP socket driver. The connect address is `host:port`; IPv4, IPv6, and
/// DNS names are all accepted, matching `std::net::TcpStream::connect`'s own
/// address parsing (`spec.md` §4.2).
///
/// There is no TCP support in `interprocess`; `std::net::TcpStream` is the
/// idiomatic choice here rather than a fallback — see `SPEC_FULL.md` §4.2.
#[derive(Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Creates a disconnected TCP transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, address: &str, timeout: Duration) -> Result<(), TransportError> {
        let stream = io_result_to_transport(TcpStream::connect(address))?;
        io_result_to_transport(stream.set_nodelay(true))?;
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
