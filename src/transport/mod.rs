//! The transport capability: a uniform byte-stream interface over the four
//! concrete carriers (`spec.md` §4.2), shaped after `interprocess`'s own
//! `local_socket::traits::Stream` capability trait — a small, `Read`/`Write`
//! adjacent trait that every concrete stream type implements identically.

mod child_process;
mod stdio;
mod tcp_socket;

#[cfg(unix)]
mod unix_socket;

#[cfg(windows)]
mod named_pipe;

pub use child_process::ChildProcessTransport;
pub use stdio::StdioTransport;
pub use tcp_socket::TcpTransport;

#[cfg(unix)]
pub use unix_socket::UnixSocketTransport;

#[cfg(windows)]
pub use named_pipe::NamedPipeTransport;

use std::io;
use std::time::Duration;

use crate::error::TransportError;

/// Which concrete carrier a [`Client`](crate::client::Client) is using.
///
/// Exactly one variant is active per client after construction
/// (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// No transport has been selected (only valid before a successful `init`).
    None,
    /// A Unix domain socket.
    UnixSocket,
    /// A TCP socket.
    TcpSocket,
    /// A Windows named pipe.
    NamedPipe,
    /// The process's own stdin/stdout.
    Stdio,
    /// A spawned child editor process, wired through its stdin/stdout.
    ChildProcess,
}

/// The capability every concrete transport driver implements.
///
/// All methods are blocking; nonblocking or async operation is out of scope
/// (`spec.md` §1, §4.2). Implementations are not required to be `Clone`;
/// the `Client` owns exactly one instance.
pub trait Transport: Send {
    /// Establishes the stream. `address` is interpreted per-driver and is
    /// ignored by drivers that don't need one (stdio, child-process).
    ///
    /// Idempotent to failure: on error the driver remains disconnected.
    fn connect(&mut self, address: &str, timeout: Duration) -> Result<(), TransportError>;

    /// Releases the stream. Must be safe to call any number of times,
    /// including before `connect` or after a failed `connect`.
    fn disconnect(&mut self);

    /// Blocking read of between 1 and `buf.len()` bytes. Returning `Ok(0)`
    /// signals EOF, same as a `ConnectionClosed` error — the Client treats
    /// both uniformly (`spec.md` §4.2).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Writes the entire slice or fails; short writes are retried internally.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Cheap status query; must not perform I/O.
    fn is_connected(&self) -> bool;
}

pub(crate) fn io_result_to_transport<T>(r: io::Result<T>) -> Result<T, TransportError> {
    r.map_err(TransportError::from_io)
}

/// Writes the entire slice to `w`, retrying on short writes, the way every
/// driver in this module implements `Transport::write`.
pub(crate) fn write_all_retrying<W: io::Write>(w: &mut W, mut bytes: &[u8]) -> Result<(), TransportError> {
    while !bytes.is_empty() {
        match w.write(bytes) {
            Ok(0) => return Err(TransportError::BrokenPipe),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::from_io(e)),
        }
    }
    Ok(())
}

pub(crate) fn read_some<R: io::Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, TransportError> {
    loop {
        match r.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::from_io(e)),
        }
    }
}
