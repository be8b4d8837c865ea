//! The client state machine: composes the transport and framing layers into
//! a thread-safe MessagePack-RPC endpoint (`SPEC_FULL.md` §4.4).

mod api_info;
mod options;
mod pending;

pub use api_info::{ApiFunction, ApiInfo, ApiVersion};
pub use options::ConnectionOptions;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use tracing::{debug, trace, warn};

use crate::error::{ConnectError, RpcError};
use crate::rpc::{encode_notification, encode_request, DecodeOutcome, Message, StreamDecoder};
use crate::transport::{Transport, TransportKind};
use crate::value::Value;

use options::select_transport;
use pending::{Outcome, PendingTable};

type NotificationHandler = Box<dyn FnMut(&str, &Value) + Send>;

/// Everything the client lock protects: the transport handle, the streaming
/// decoder's buffer, connectedness, and the registered notification
/// callback. `next_msgid` and the pending table live outside this lock on
/// purpose — see the module doc on [`PendingTable`] and `SPEC_FULL.md` §5.
struct Locked {
    transport: Box<dyn Transport>,
    decoder: StreamDecoder,
    connected: bool,
    api_info: Option<ApiInfo>,
    event_handler: Option<NotificationHandler>,
}

/// A MessagePack-RPC client driving a single Neovim peer over one of the
/// four transports.
///
/// Cheaply shareable across threads via `Arc<Client>`: every public method
/// takes `&self`. Internally a single mutex (`SPEC_FULL.md` calls it "the
/// client lock") serializes the write, the read+decode+dispatch region, and
/// registration of the notification handler.
pub struct Client {
    options: ConnectionOptions,
    kind: TransportKind,
    address: String,
    next_msgid: AtomicU32,
    pending: PendingTable,
    locked: Mutex<Locked>,
}

impl Client {
    /// Constructs a client, selecting a transport per the priority order in
    /// `SPEC_FULL.md` §4.2. Performs no I/O — the transport is not dialed
    /// until [`connect`](Self::connect).
    pub fn init(options: ConnectionOptions) -> Result<Self, ConnectError> {
        let (kind, address, transport) = select_transport(&options)?;
        Ok(Self {
            options,
            kind,
            address,
            next_msgid: AtomicU32::new(0),
            pending: PendingTable::new(),
            locked: Mutex::new(Locked { transport, decoder: StreamDecoder::new(), connected: false, api_info: None, event_handler: None }),
        })
    }

    /// Constructs a client around an already-built transport driver,
    /// bypassing the priority selection [`init`](Self::init) performs over
    /// [`ConnectionOptions`]. Exposed for callers supplying a transport this
    /// crate doesn't ship (a TLS-wrapped socket, a logging wrapper, an
    /// in-memory driver for tests) — `connect()` still drives it through the
    /// usual lifecycle and handshake.
    #[must_use]
    pub fn with_transport(kind: TransportKind, transport: Box<dyn Transport>, options: ConnectionOptions) -> Self {
        Self {
            options,
            kind,
            address: String::new(),
            next_msgid: AtomicU32::new(0),
            pending: PendingTable::new(),
            locked: Mutex::new(Locked { transport, decoder: StreamDecoder::new(), connected: false, api_info: None, event_handler: None }),
        }
    }

    /// Which transport this client was constructed to use.
    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        self.kind
    }

    /// Dials the transport and, unless `skip_api_info` was set, performs the
    /// `nvim_get_api_info` handshake synchronously.
    pub fn connect(&self) -> Result<(), ConnectError> {
        let mut locked = self.lock();
        if locked.connected {
            return Err(ConnectError::AlreadyConnected);
        }
        if self.kind == TransportKind::TcpSocket && self.options.tcp_port == Some(0) {
            return Err(ConnectError::InvalidOptions("tcp_port 0 is not valid at connect time"));
        }
        locked.transport.connect(&self.address, self.options.timeout())?;
        locked.connected = true;
        locked.decoder = StreamDecoder::new();
        drop(locked);

        if self.options.skip_api_info {
            return Ok(());
        }
        match self.do_request("nvim_get_api_info", Value::Array(Vec::new())) {
            Ok(reply) => {
                let info = api_info::parse_api_info(&reply)?;
                self.lock().api_info = Some(info);
                Ok(())
            }
            Err(err) => {
                let mut locked = self.lock();
                locked.connected = false;
                locked.transport.disconnect();
                drop(locked);
                Err(match err {
                    RpcError::Transport(t) => ConnectError::Transport(t),
                    RpcError::Decode(_) | RpcError::NvimError(_) | RpcError::NotConnected => {
                        ConnectError::InvalidOptions("handshake request failed")
                    }
                })
            }
        }
    }

    /// Idempotent teardown. Clears the read buffer, drops the cached API
    /// info, fails every pending request with `ConnectionClosed`, and does
    /// NOT reset `next_msgid`.
    pub fn disconnect(&self) {
        let mut locked = self.lock();
        locked.transport.disconnect();
        locked.connected = false;
        locked.api_info = None;
        locked.decoder = StreamDecoder::new();
        drop(locked);
        self.pending.fail_all();
    }

    /// Whether the transport is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Issues a request and blocks until its response arrives (or the
    /// connection fails). `params` MUST be `Value::Array`.
    pub fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.do_request(method, params)
    }

    fn do_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        if !self.is_connected() {
            return Err(RpcError::NotConnected);
        }
        let msgid = self.next_message_id();
        self.pending.register(msgid);

        {
            let mut locked = self.lock();
            let bytes = encode_request(msgid, method, &params);
            if let Err(e) = locked.transport.write(&bytes) {
                locked.connected = false;
                drop(locked);
                self.pending.fail_all();
                return Err(RpcError::Transport(e));
            }
        }

        let outcome = self.pending.wait_for(msgid, || self.drive_one_round());
        match outcome {
            Outcome::Completed { error: Some(error), .. } => Err(RpcError::NvimError(error)),
            Outcome::Completed { result, .. } => Ok(result.unwrap_or(Value::Nil)),
            Outcome::ConnectionClosed => Err(RpcError::Transport(crate::error::TransportError::ConnectionClosed)),
        }
    }

    /// Sends a fire-and-forget notification. Does not allocate a `msgid`.
    pub fn notify(&self, method: &str, params: Value) -> Result<(), RpcError> {
        if !self.is_connected() {
            return Err(RpcError::NotConnected);
        }
        let bytes = encode_notification(method, &params);
        let mut locked = self.lock();
        if let Err(e) = locked.transport.write(&bytes) {
            locked.connected = false;
            drop(locked);
            self.pending.fail_all();
            return Err(RpcError::Transport(e));
        }
        Ok(())
    }

    /// The next `msgid` this client will issue; a monotonic counter that
    /// wraps through `u32::MAX` back to 0. Uniqueness only needs to hold
    /// among currently-outstanding requests.
    pub fn next_message_id(&self) -> u32 {
        self.next_msgid.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers (or, with `None`, detaches) the callback invoked from
    /// whichever thread is draining the read buffer when a `Notification`
    /// arrives. The callback borrows `method`/`params` for the duration of
    /// the call; it must copy anything it wants to retain.
    pub fn set_event_handler(&self, handler: Option<impl FnMut(&str, &Value) + Send + 'static>) {
        self.lock().event_handler = handler.map(|h| Box::new(h) as NotificationHandler);
    }

    /// Looks up an advertised remote procedure by name, if the handshake ran.
    #[must_use]
    pub fn find_api_function(&self, name: &str) -> Option<ApiFunction> {
        self.lock().api_info.as_ref().and_then(|info| info.find_function(name).cloned())
    }

    /// Returns the cached handshake metadata, if the handshake ran.
    #[must_use]
    pub fn get_api_info(&self) -> Option<ApiInfo> {
        self.lock().api_info.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Locked> {
        self.locked.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// One round of the demultiplex algorithm (`SPEC_FULL.md` §4.4): drain
    /// whatever frames the buffer already holds, and if none were available,
    /// perform exactly one blocking read and try again. Returns `true` if at
    /// least one frame was dispatched this round.
    fn drive_one_round(&self) -> bool {
        let mut locked = self.lock();
        if !locked.connected {
            return false;
        }

        let mut dispatched_any = false;
        loop {
            match locked.decoder.poll() {
                Ok(DecodeOutcome::Message(message)) => {
                    dispatch(&mut locked, &self.pending, message);
                    dispatched_any = true;
                }
                Ok(DecodeOutcome::NeedMoreData) => break,
                Err(e) => {
                    warn!(error = %e, "dropping connection after malformed RPC frame");
                    locked.connected = false;
                    locked.transport.disconnect();
                    drop(locked);
                    self.pending.fail_all();
                    return true;
                }
            }
        }
        if dispatched_any {
            return true;
        }

        let mut buf = [0u8; 4096];
        match locked.transport.read(&mut buf) {
            Ok(0) => {
                debug!("transport read returned EOF, disconnecting");
                locked.connected = false;
                locked.transport.disconnect();
                drop(locked);
                self.pending.fail_all();
                true
            }
            Ok(n) => {
                locked.decoder.feed(&buf[..n]);
                true
            }
            Err(crate::error::TransportError::Timeout) => {
                // Not fatal: drivers apply `timeout_ms` per-read so this
                // thread can periodically recheck `connected` rather than
                // block indefinitely; the caller just tries again.
                false
            }
            Err(e) => {
                debug!(error = %e, "transport read failed, disconnecting");
                locked.connected = false;
                locked.transport.disconnect();
                drop(locked);
                self.pending.fail_all();
                true
            }
        }
    }
}

fn dispatch(locked: &mut Locked, pending: &PendingTable, message: Message) {
    match message {
        Message::Response { msgid, error, result } => {
            pending.complete(msgid, error, result);
        }
        Message::Notification { method, params } => {
            if let Some(handler) = locked.event_handler.as_mut() {
                handler(&method, &params);
            }
        }
        Message::Request { msgid, method, .. } => {
            trace!(msgid, method = %method, "dropping inbound request frame, this client does not serve a server role");
        }
    }
}
