//! A driver that spawns the editor itself and talks to it over the child's
//! stdin/stdout, the way `nvim --embed` is meant to be driven
//! (`spec.md` §4.2, "spawn_process").

use std::io::Write;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{read_some, write_all_retrying, Transport};

/// Spawns a child process and wires this driver to its stdin/stdout.
///
/// `connect`'s `address` is the path to the executable; extra arguments are
/// supplied via [`ChildProcessTransport::new`]. The `timeout` argument is
/// unused — spawning a process is not expected to block noticeably, unlike
/// dialing a socket.
pub struct ChildProcessTransport {
    args: Vec<String>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

impl ChildProcessTransport {
    /// Creates a driver that will spawn the executable with the given
    /// arguments once `connect` is called. Typical usage passes `["--embed"]`
    /// to launch Neovim in RPC-over-stdio mode.
    #[must_use]
    pub fn new(args: Vec<String>) -> Self {
        Self { args, child: None, stdin: None, stdout: None }
    }
}

impl Transport for ChildProcessTransport {
    fn connect(&mut self, address: &str, _timeout: Duration) -> Result<(), TransportError> {
        let mut cmd = Command::new(address);
        cmd.args(&self.args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null());
        let mut child = cmd.spawn().map_err(TransportError::from_io)?;
        let stdin = child.stdin.take().ok_or(TransportError::ConnectionClosed)?;
        let stdout = child.stdout.take().ok_or(TransportError::ConnectionClosed)?;
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout = Some(stdout);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stdin = None;
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let stdout = self.stdout.as_mut().ok_or(TransportError::ConnectionClosed)?;
        read_some(stdout, buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::ConnectionClosed)?;
        write_all_retrying(stdin, bytes)?;
        stdin.flush().map_err(TransportError::from_io)
    }

    fn is_connected(&self) -> bool {
        self.child.is_some()
    }
}
