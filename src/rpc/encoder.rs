//! Pure functions that turn the three message variants into wire bytes.
//!
//! Each function allocates its own output `Vec<u8>` and hands it back to the
//! caller, mirroring `spec.md` §4.3's "every helper allocates the output
//! buffer from the caller's allocator and transfers ownership out" — in Rust
//! this is just returning an owned `Vec<u8>`.

use super::{TYPE_NOTIFICATION, TYPE_REQUEST, TYPE_RESPONSE};
use crate::value::{encode_value, Value};

fn assert_array(params: &Value) {
    debug_assert!(matches!(params, Value::Array(_)), "RPC params must be an Array-typed Value");
}

/// Encodes `[0, msgid, method, params]`.
///
/// `params` MUST be `Value::Array`; this is a caller contract the encoder
/// does not attempt to coerce (`spec.md` §4.3), enforced here with a debug
/// assertion rather than a fallible check since misuse is a programming
/// error, not a runtime condition.
pub fn encode_request(msgid: u32, method: &str, params: &Value) -> Vec<u8> {
    assert_array(params);
    let mut buf = Vec::new();
    encode_value(&Value::Array(vec![Value::UInt(TYPE_REQUEST), Value::UInt(u64::from(msgid)), Value::from(method), params.clone()]), &mut buf)
        .expect("encoding into a Vec<u8> cannot fail");
    buf
}

/// Encodes `[1, msgid, error-or-nil, result-or-nil]`.
pub fn encode_response(msgid: u32, error: Option<&Value>, result: Option<&Value>) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(
        &Value::Array(vec![
            Value::UInt(TYPE_RESPONSE),
            Value::UInt(u64::from(msgid)),
            error.cloned().unwrap_or(Value::Nil),
            result.cloned().unwrap_or(Value::Nil),
        ]),
        &mut buf,
    )
    .expect("encoding into a Vec<u8> cannot fail");
    buf
}

/// Encodes `[2, method, params]`.
pub fn encode_notification(method: &str, params: &Value) -> Vec<u8> {
    assert_array(params);
    let mut buf = Vec::new();
    encode_value(&Value::Array(vec![Value::UInt(TYPE_NOTIFICATION), Value::from(method), params.clone()]), &mut buf)
        .expect("encoding into a Vec<u8> cannot fail");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{DecodeOutcome, StreamDecoder};
    use crate::value::Value;

    #[test]
    fn request_roundtrip() {
        let bytes = encode_request(42, "test_roundtrip", &Value::Array(vec![Value::UInt(123)]));
        let mut dec = StreamDecoder::new();
        dec.feed(&bytes);
        match dec.poll().unwrap() {
            DecodeOutcome::Message(crate::rpc::Message::Request { msgid, method, params }) => {
                assert_eq!(msgid, 42);
                assert_eq!(method, "test_roundtrip");
                assert_eq!(params, Value::Array(vec![Value::UInt(123)]));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn response_with_no_result_no_error() {
        let bytes = encode_response(11, None, None);
        let mut dec = StreamDecoder::new();
        dec.feed(&bytes);
        match dec.poll().unwrap() {
            DecodeOutcome::Message(crate::rpc::Message::Response { msgid, error, result }) => {
                assert_eq!(msgid, 11);
                assert_eq!(error, None);
                assert_eq!(result, None);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
