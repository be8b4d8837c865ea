//! Serializes a [`Value`] tree to the MessagePack wire format using `rmp`'s
//! low-level, buffer-oriented `encode` primitives — the same crate the
//! `nvim-rpc` client this module is grounded on depends on.
//!
//! `Value::Int` is written with `rmp::encode::write_sint`, which picks the
//! most compact marker for the magnitude — for a non-negative value that is
//! the same positive-fixint/unsigned-family marker `Value::UInt` would
//! produce. The wire format has no separate "signed" encoding for a
//! non-negative integer, so `decode(encode(Value::Int(n)))` for `n >= 0`
//! yields `Value::UInt(n as u64)`, not `Value::Int(n)`. The §8 round-trip
//! property (`decode(encode(F)) == F`) holds as stated for values the
//! decoder itself produced (which never holds a non-negative `Int`) and for
//! any `Int` that is actually negative; it does not hold bit-for-bit for a
//! hand-built non-negative `Int`.

use std::io;

use rmp::encode;

use crate::value::{Timestamp, Value};

/// Encodes `value` into `out`, appending to whatever is already there.
///
/// The "allocator" of `spec.md` §4.1 maps onto Rust's global allocator via
/// the caller-supplied `Vec<u8>`; ownership of the encoded bytes stays with
/// the caller the whole time, so there is nothing to transfer out
/// separately.
pub fn encode_value(value: &Value, out: &mut Vec<u8>) -> io::Result<()> {
    match value {
        Value::Nil => encode::write_nil(out).map_err(io_err),
        Value::Bool(b) => encode::write_bool(out, *b).map_err(io_err),
        Value::Int(i) => encode::write_sint(out, *i).map(|_| ()).map_err(io_err),
        Value::UInt(u) => encode::write_uint(out, *u).map(|_| ()).map_err(io_err),
        Value::Float(f) => encode::write_f64(out, *f).map_err(io_err),
        Value::Str(bytes) => {
            encode::write_str_len(out, len_u32(bytes.len())?).map_err(io_err)?;
            out.extend_from_slice(bytes);
            Ok(())
        }
        Value::Bin(bytes) => {
            encode::write_bin_len(out, len_u32(bytes.len())?).map_err(io_err)?;
            out.extend_from_slice(bytes);
            Ok(())
        }
        Value::Array(items) => {
            encode::write_array_len(out, len_u32(items.len())?).map_err(io_err)?;
            for item in items {
                encode_value(item, out)?;
            }
            Ok(())
        }
        Value::Map(map) => {
            encode::write_map_len(out, len_u32(map.len())?).map_err(io_err)?;
            for (key, val) in map.iter() {
                encode_value(&Value::from(key), out)?;
                encode_value(val, out)?;
            }
            Ok(())
        }
        Value::Ext { type_code, data } => {
            encode::write_ext_meta(out, len_u32(data.len())?, *type_code).map_err(io_err)?;
            out.extend_from_slice(data);
            Ok(())
        }
        Value::Timestamp(ts) => encode_timestamp(*ts, out),
    }
}

fn len_u32(len: usize) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "value too large to encode"))
}

fn io_err(e: encode::ValueWriteError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Encodes ext type -1 using the most compact of the three standard
/// timestamp formats (32/64/96-bit), per the canonical MessagePack spec.
fn encode_timestamp(ts: Timestamp, out: &mut Vec<u8>) -> io::Result<()> {
    const TIMESTAMP_TYPE: i8 = -1;
    if ts.nanoseconds == 0 && ts.seconds >= 0 && ts.seconds <= u32::MAX as i64 {
        encode::write_ext_meta(out, 4, TIMESTAMP_TYPE).map_err(io_err)?;
        out.extend_from_slice(&(ts.seconds as u32).to_be_bytes());
    } else if ts.seconds >= 0 && ts.seconds < (1i64 << 34) {
        encode::write_ext_meta(out, 8, TIMESTAMP_TYPE).map_err(io_err)?;
        let combined = (u64::from(ts.nanoseconds) << 34) | (ts.seconds as u64);
        out.extend_from_slice(&combined.to_be_bytes());
    } else {
        encode::write_ext_meta(out, 12, TIMESTAMP_TYPE).map_err(io_err)?;
        out.extend_from_slice(&ts.nanoseconds.to_be_bytes());
        out.extend_from_slice(&ts.seconds.to_be_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::decode_value;

    #[test]
    fn roundtrip_scalars() {
        for v in [
            Value::Nil,
            Value::Bool(true),
            Value::Int(-42),
            Value::UInt(42),
            Value::Float(1.5),
            Value::from("hello"),
            Value::Bin(vec![1, 2, 3]),
        ] {
            let mut buf = Vec::new();
            encode_value(&v, &mut buf).unwrap();
            let (decoded, consumed) = decode_value(&buf).unwrap().expect("full frame");
            assert_eq!(consumed, buf.len());
            assert_eq!(decoded, v);
        }
    }

    #[test]
    fn nonnegative_int_decodes_back_as_uint() {
        // See this module's docs: the wire format has no distinct signed
        // marker for a non-negative magnitude, so a hand-built `Value::Int`
        // holding 0 or a positive number normalizes to `Value::UInt` on the
        // way back, unlike a genuinely negative `Int`.
        for v in [Value::Int(0), Value::Int(5), Value::Int(127), Value::Int(128), Value::Int(i64::MAX)] {
            let mut buf = Vec::new();
            encode_value(&v, &mut buf).unwrap();
            let (decoded, consumed) = decode_value(&buf).unwrap().expect("full frame");
            assert_eq!(consumed, buf.len());
            let Value::Int(n) = v else { unreachable!() };
            assert_eq!(decoded, Value::UInt(n as u64));
        }
    }

    #[test]
    fn roundtrip_timestamp() {
        for ts in [
            Timestamp { seconds: 1_600_000_000, nanoseconds: 0 },
            Timestamp { seconds: 1_600_000_000, nanoseconds: 123_456_789 },
            Timestamp { seconds: -5, nanoseconds: 0 },
        ] {
            let mut buf = Vec::new();
            encode_value(&Value::Timestamp(ts), &mut buf).unwrap();
            let (decoded, _) = decode_value(&buf).unwrap().expect("full frame");
            assert_eq!(decoded, Value::Timestamp(ts));
        }
    }

    #[test]
    fn roundtrip_nested() {
        let v = Value::Array(vec![
            Value::from("a"),
            Value::Map({
                let mut m = crate::value::Map::new();
                m.put("x", Value::Int(1));
                m.put("y", Value::Bool(false));
                m
            }),
        ]);
        let mut buf = Vec::new();
        encode_value(&v, &mut buf).unwrap();
        let (decoded, consumed) = decode_value(&buf).unwrap().expect("full frame");
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, v);
    }
}
