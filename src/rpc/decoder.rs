//! The streaming decoder: turns a growable byte buffer into `Message`s,
//! tolerating fragmentation, back-to-back frames, and 1-byte-at-a-time
//! partial reads (`spec.md` §4.3).

use crate::error::DecodeError;
use crate::rpc::{Message, TYPE_NOTIFICATION, TYPE_REQUEST, TYPE_RESPONSE};
use crate::value::{self, Value};

/// Outcome of a single [`StreamDecoder::poll`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// One complete frame was decoded and consumed from the front of the buffer.
    Message(Message),
    /// The buffer does not yet contain a complete frame; read more and retry.
    NeedMoreData,
}

/// Accumulates bytes from a transport and yields `Message`s as they complete.
///
/// Owns its buffer; the Client drives it by calling [`feed`](Self::feed)
/// after every successful `read` and [`poll`](Self::poll) until it reports
/// [`DecodeOutcome::NeedMoreData`].
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buf: Vec<u8>,
}

impl StreamDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends freshly read bytes to the internal buffer. A zero-length
    /// slice is a no-op — callers treat a zero-length read from the
    /// transport as "no progress; try again" per `spec.md` §4.3.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// The number of unconsumed bytes currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Attempts to decode and consume one frame from the front of the buffer.
    pub fn poll(&mut self) -> Result<DecodeOutcome, DecodeError> {
        let decoded = value::decode_value(&self.buf)?;
        let Some((value, consumed)) = decoded else {
            return Ok(DecodeOutcome::NeedMoreData);
        };
        let message = parse_message(value)?;
        self.buf.drain(..consumed);
        Ok(DecodeOutcome::Message(message))
    }
}

fn parse_message(value: Value) -> Result<Message, DecodeError> {
    let Value::Array(mut items) = value else {
        return Err(DecodeError::Malformed("top-level frame must be an array".into()));
    };
    if items.is_empty() {
        return Err(DecodeError::Malformed("empty frame array".into()));
    }
    let type_tag = value::expect_i64(&items[0]).map_err(|_| DecodeError::Malformed("frame type tag must be an integer".into()))?;

    match type_tag {
        TYPE_REQUEST => {
            if items.len() != 4 {
                return Err(DecodeError::Malformed("request frame must have 4 elements".into()));
            }
            let params = items.pop().unwrap();
            let method_val = items.pop().unwrap();
            let msgid_val = items.pop().unwrap();
            let method = value::expect_str(&method_val).map_err(|_| DecodeError::Malformed("request method must be a string".into()))?;
            let msgid = msgid_to_u32(&msgid_val)?;
            ensure_array_params(&params)?;
            Ok(Message::Request { msgid, method, params })
        }
        TYPE_RESPONSE => {
            if items.len() != 4 {
                return Err(DecodeError::Malformed("response frame must have 4 elements".into()));
            }
            let result = items.pop().unwrap();
            let error = items.pop().unwrap();
            let msgid_val = items.pop().unwrap();
            let msgid = msgid_to_u32(&msgid_val)?;
            Ok(Message::Response {
                msgid,
                error: if error.is_nil() { None } else { Some(error) },
                result: if result.is_nil() { None } else { Some(result) },
            })
        }
        TYPE_NOTIFICATION => {
            if items.len() != 3 {
                return Err(DecodeError::Malformed("notification frame must have 3 elements".into()));
            }
            let params = items.pop().unwrap();
            let method_val = items.pop().unwrap();
            let method = value::expect_str(&method_val).map_err(|_| DecodeError::Malformed("notification method must be a string".into()))?;
            ensure_array_params(&params)?;
            Ok(Message::Notification { method, params })
        }
        other => Err(DecodeError::UnexpectedMessageType(other)),
    }
}

fn msgid_to_u32(v: &Value) -> Result<u32, DecodeError> {
    let raw = value::expect_u64(v).map_err(|_| DecodeError::Malformed("msgid must be a non-negative integer".into()))?;
    u32::try_from(raw).map_err(|_| DecodeError::Malformed("msgid does not fit in u32".into()))
}

fn ensure_array_params(v: &Value) -> Result<(), DecodeError> {
    match v {
        Value::Array(_) => Ok(()),
        _ => Err(DecodeError::Malformed("params must be an array".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{encode_notification, encode_request, encode_response};

    #[test]
    fn one_byte_at_a_time_eventually_decodes() {
        let bytes = encode_request(7, "echo", &Value::Array(vec![Value::Int(1)]));
        let mut dec = StreamDecoder::new();
        let mut got = None;
        for i in 0..bytes.len() {
            dec.feed(&bytes[i..=i]);
            match dec.poll().unwrap() {
                DecodeOutcome::Message(m) => {
                    got = Some(m);
                    break;
                }
                DecodeOutcome::NeedMoreData => continue,
            }
        }
        assert!(matches!(got, Some(Message::Request { msgid: 7, .. })));
    }

    #[test]
    fn back_to_back_frames_in_one_read() {
        let mut bytes = encode_notification("a", &Value::Array(vec![]));
        bytes.extend(encode_notification("b", &Value::Array(vec![])));
        let mut dec = StreamDecoder::new();
        dec.feed(&bytes);
        let first = dec.poll().unwrap();
        let second = dec.poll().unwrap();
        let third = dec.poll().unwrap();
        assert!(matches!(first, DecodeOutcome::Message(Message::Notification { ref method, .. }) if method == "a"));
        assert!(matches!(second, DecodeOutcome::Message(Message::Notification { ref method, .. }) if method == "b"));
        assert_eq!(third, DecodeOutcome::NeedMoreData);
    }

    #[test]
    fn partial_prefix_strictly_shorter_needs_more_data() {
        let bytes = encode_response(5, None, Some(&Value::Int(2)));
        for len in 0..bytes.len() {
            let mut dec = StreamDecoder::new();
            dec.feed(&bytes[..len]);
            assert_eq!(dec.poll().unwrap(), DecodeOutcome::NeedMoreData, "len={len}");
        }
    }

    #[test]
    fn zero_length_feed_is_noop() {
        let mut dec = StreamDecoder::new();
        dec.feed(&[]);
        assert_eq!(dec.poll().unwrap(), DecodeOutcome::NeedMoreData);
    }
}
