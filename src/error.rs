//! The error taxonomy used throughout the crate.
//!
//! Leaf I/O operations (the [transport layer](crate::transport)) report
//! `io::Result` in the same style as `interprocess`, the crate this one's
//! transport drivers are adapted from. Everything built on top of that layer
//! — framing, the value model, and the client — wraps those `io::Error`s into
//! the richer variants below so that callers can match on a cause rather than
//! sniff an `io::ErrorKind`.

use std::io;

use crate::value::Value;

/// Errors surfaced by the transport capability (`connect`, `read`, `write`).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the connection, or a read returned zero bytes.
    #[error("connection closed by peer")]
    ConnectionClosed,
    /// A read or connect did not complete within the configured timeout.
    #[error("operation timed out")]
    Timeout,
    /// The peer reset the pipe/socket out from under a write.
    #[error("broken pipe")]
    BrokenPipe,
    /// The requested transport is not available on this platform.
    #[error("transport not supported on this platform: {0}")]
    Unsupported(&'static str),
    /// Any other platform I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<&io::Error> for TransportError {
    fn from(e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::UnexpectedEof => {
                TransportError::ConnectionClosed
            }
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout,
            io::ErrorKind::BrokenPipe => TransportError::BrokenPipe,
            _ => TransportError::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl TransportError {
    pub(crate) fn from_io(e: io::Error) -> Self {
        TransportError::from(&e)
    }
}

/// Errors that can occur while constructing or connecting a [`Client`](crate::client::Client).
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// No transport option (or a contradictory combination) was given to
    /// [`ConnectionOptions`](crate::client::ConnectionOptions).
    #[error("no usable transport selected by the given connection options")]
    UnsupportedTransport,
    /// The combination of options given was internally inconsistent (e.g. a
    /// TCP address without a port).
    #[error("invalid connection options: {0}")]
    InvalidOptions(&'static str),
    /// `connect` was called on a client that is already connected.
    #[error("client is already connected")]
    AlreadyConnected,
    /// The transport failed to establish a connection.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The `nvim_get_api_info` handshake failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Errors from the MessagePack-RPC framing layer.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// The bytes on the wire did not form a well-formed MessagePack value, or
    /// the value did not have the shape of a Request/Response/Notification.
    #[error("malformed RPC frame: {0}")]
    Malformed(String),
    /// The first element of the frame array was an integer other than 0, 1, or 2.
    #[error("unexpected message type tag: {0}")]
    UnexpectedMessageType(i64),
}

/// Errors from the [value model](crate::value)'s typed accessors.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum ValueError {
    /// The value was not of the variant the accessor expected.
    #[error("expected a {0} value")]
    ExpectedType(&'static str),
    /// The value was of a numeric variant but did not fit in the requested width/signedness.
    #[error("numeric value does not fit in the requested type")]
    Overflow,
}

/// The `nvim_get_api_info` handshake did not have the shape the client requires.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ProtocolError {
    /// A required field of the handshake payload was absent or of the wrong type.
    #[error("handshake missing required field `{0}`")]
    MissingField(&'static str),
    /// The handshake's outer array did not have exactly two elements.
    #[error("malformed nvim_get_api_info response")]
    MalformedHandshake,
}

/// The top-level error returned by [`Client::request`](crate::client::Client::request).
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// `request`/`notify` was called before `connect` succeeded.
    #[error("client is not connected")]
    NotConnected,
    /// The peer completed the response with a non-nil `error` field. The
    /// connection is NOT invalidated by this — see `spec.md` §7.
    #[error("nvim returned an error response: {0:?}")]
    NvimError(Value),
    /// The underlying transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The peer sent a malformed frame.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
