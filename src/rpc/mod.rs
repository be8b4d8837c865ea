//! MessagePack-RPC framing: the `Message` model, the pure encoders, and the
//! streaming decoder, per `spec.md` §4.3.

mod decoder;
mod encoder;

pub use decoder::{DecodeOutcome, StreamDecoder};
pub use encoder::{encode_notification, encode_request, encode_response};

use crate::value::Value;

/// The three MessagePack-RPC frame shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `[0, msgid, method, params]`
    Request {
        /// Correlates this request with its eventual response.
        msgid: u32,
        /// The remote procedure name.
        method: String,
        /// Always an array at the wire level.
        params: Value,
    },
    /// `[1, msgid, error, result]`
    Response {
        /// The `msgid` of the request this response answers.
        msgid: u32,
        /// Non-nil when the call failed.
        error: Option<Value>,
        /// Non-nil when the call succeeded.
        result: Option<Value>,
    },
    /// `[2, method, params]`
    Notification {
        /// The remote procedure name.
        method: String,
        /// Always an array at the wire level.
        params: Value,
    },
}

const TYPE_REQUEST: i64 = 0;
const TYPE_RESPONSE: i64 = 1;
const TYPE_NOTIFICATION: i64 = 2;
