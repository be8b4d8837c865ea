//! A driver over the process's own standard streams, for embedding this
//! crate inside a plugin host that Neovim has already spawned with its own
//! stdin/stdout wired up (`spec.md` §4.2, "use_stdio").

use std::io::{self, Write};
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{read_some, write_all_retrying, Transport};

/// A driver reading `Stdin`/writing `Stdout`.
///
/// `connect` ignores its `address` and `timeout` arguments: there is nothing
/// to dial, the streams already exist for the lifetime of the process.
/// `disconnect` drops the driver's handles without closing the underlying
/// file descriptors — stdin/stdout are not owned by this crate.
#[derive(Default)]
pub struct StdioTransport {
    handles: Option<(io::Stdin, io::Stdout)>,
}

impl StdioTransport {
    /// Creates a disconnected stdio transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for StdioTransport {
    fn connect(&mut self, _address: &str, _timeout: Duration) -> Result<(), TransportError> {
        self.handles = Some((io::stdin(), io::stdout()));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.handles = None;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let (stdin, _) = self.handles.as_mut().ok_or(TransportError::ConnectionClosed)?;
        read_some(&mut stdin.lock(), buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let (_, stdout) = self.handles.as_mut().ok_or(TransportError::ConnectionClosed)?;
        let mut lock = stdout.lock();
        write_all_retrying(&mut lock, bytes)?;
        lock.flush().map_err(TransportError::from_io)
    }

    fn is_connected(&self) -> bool {
        self.handles.is_some()
    }
}
