//! Connection options and the transport-selection priority they drive.

use std::time::Duration;

use crate::error::ConnectError;
use crate::transport::{TcpTransport, Transport, TransportKind};

#[cfg(unix)]
use crate::transport::UnixSocketTransport;
#[cfg(windows)]
use crate::transport::NamedPipeTransport;

use crate::transport::{ChildProcessTransport, StdioTransport};

/// How a [`Client`](crate::client::Client) should reach its peer.
///
/// Builder-style: start from [`ConnectionOptions::new`] and chain the
/// setters for whichever transport applies. At most one of
/// `socket_path`/`tcp_address`+`tcp_port`/`spawn_process`/`use_stdio` takes
/// effect; see [`select_transport`] for the priority order.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub(crate) socket_path: Option<String>,
    pub(crate) tcp_address: Option<String>,
    pub(crate) tcp_port: Option<u16>,
    pub(crate) spawn_process: bool,
    pub(crate) use_stdio: bool,
    pub(crate) nvim_path: String,
    pub(crate) timeout_ms: u32,
    pub(crate) skip_api_info: bool,
}

impl ConnectionOptions {
    /// Default options: no transport selected yet, `nvim_path` `"nvim"`,
    /// `timeout_ms` 5000, API-info handshake enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { nvim_path: "nvim".to_string(), timeout_ms: 5000, ..Self::default() }
    }

    /// Selects the Unix-domain-socket (or Windows named-pipe) driver, dialing `path`.
    #[must_use]
    pub fn socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Selects the TCP driver, dialing `host:port`.
    #[must_use]
    pub fn tcp(mut self, address: impl Into<String>, port: u16) -> Self {
        self.tcp_address = Some(address.into());
        self.tcp_port = Some(port);
        self
    }

    /// Selects the child-process driver: spawns `nvim_path` (see
    /// [`ConnectionOptions::nvim_path`]) with `--embed`.
    #[must_use]
    pub fn spawn_process(mut self, spawn: bool) -> Self {
        self.spawn_process = spawn;
        self
    }

    /// Selects the stdio driver, talking over this process's own stdin/stdout.
    #[must_use]
    pub fn use_stdio(mut self, use_stdio: bool) -> Self {
        self.use_stdio = use_stdio;
        self
    }

    /// Overrides the `nvim` executable path used by [`spawn_process`](Self::spawn_process).
    #[must_use]
    pub fn nvim_path(mut self, path: impl Into<String>) -> Self {
        self.nvim_path = path.into();
        self
    }

    /// Sets the per-connect and per-read timeout, in milliseconds. `0` is
    /// driver-specific and typically means no explicit timeout.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Skips the `nvim_get_api_info` handshake on connect.
    #[must_use]
    pub fn skip_api_info(mut self, skip: bool) -> Self {
        self.skip_api_info = skip;
        self
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

/// Chooses exactly one transport per the priority order in `SPEC_FULL.md`
/// §4.2: `spawn_process` > `use_stdio` > `tcp_address`+`tcp_port` >
/// `socket_path` > none.
///
/// Returns the selected kind, the address string the driver's `connect`
/// should use, and a boxed driver instance.
pub(crate) fn select_transport(options: &ConnectionOptions) -> Result<(TransportKind, String, Box<dyn Transport>), ConnectError> {
    if options.spawn_process {
        let driver = ChildProcessTransport::new(vec!["--embed".to_string()]);
        return Ok((TransportKind::ChildProcess, options.nvim_path.clone(), Box::new(driver)));
    }
    if options.use_stdio {
        return Ok((TransportKind::Stdio, String::new(), Box::new(StdioTransport::new())));
    }
    if let Some(address) = &options.tcp_address {
        let port = options.tcp_port.ok_or(ConnectError::UnsupportedTransport)?;
        return Ok((TransportKind::TcpSocket, format!("{address}:{port}"), Box::new(TcpTransport::new())));
    }
    if let Some(path) = &options.socket_path {
        #[cfg(unix)]
        {
            return Ok((TransportKind::UnixSocket, path.clone(), Box::new(UnixSocketTransport::new())));
        }
        #[cfg(windows)]
        {
            return Ok((TransportKind::NamedPipe, path.clone(), Box::new(NamedPipeTransport::new())));
        }
        #[cfg(not(any(unix, windows)))]
        {
            return Err(ConnectError::UnsupportedTransport);
        }
    }
    Err(ConnectError::UnsupportedTransport)
}
