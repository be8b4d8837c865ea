//! Deserializes a [`Value`] tree from the MessagePack wire format.
//!
//! This walks the raw format tags directly against a byte slice rather than
//! going through `rmp`'s `Read`-based decoder, because the one behavior this
//! decoder must get exactly right is distinguishing "not enough bytes yet"
//! from "malformed bytes" on a buffer that may be filled incrementally
//! (`spec.md` §4.3) — a plain bounds check against a slice makes that
//! distinction explicit at every step instead of inferring it from a nested
//! `io::Error` kind.

use crate::error::DecodeError;
use crate::value::{Map, Timestamp, Value};

/// Attempts to decode one [`Value`] from the front of `bytes`.
///
/// Returns `Ok(None)` if `bytes` does not yet contain a complete value
/// (the caller should read more and retry), `Ok(Some((value, consumed)))` on
/// success, or `Err` if the bytes present so far are not a well-formed
/// prefix of any MessagePack value.
pub fn decode_value(bytes: &[u8]) -> Result<Option<(Value, usize)>, DecodeError> {
    let mut pos = 0usize;
    match read_value(bytes, &mut pos) {
        Ok(Some(value)) => Ok(Some((value, pos))),
        Ok(None) => Ok(None),
        Err(e) => Err(e),
    }
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Option<&'a [u8]> {
    let end = pos.checked_add(n)?;
    let slice = bytes.get(*pos..end)?;
    *pos = end;
    Some(slice)
}

fn take_u8(bytes: &[u8], pos: &mut usize) -> Option<u8> {
    take(bytes, pos, 1).map(|s| s[0])
}

fn read_value(bytes: &[u8], pos: &mut usize) -> Result<Option<Value>, DecodeError> {
    let Some(tag) = take_u8(bytes, pos) else {
        return Ok(None);
    };
    match tag {
        0x00..=0x7f => Ok(Some(Value::UInt(tag as u64))),
        0xe0..=0xff => Ok(Some(Value::Int(tag as i8 as i64))),
        0xc0 => Ok(Some(Value::Nil)),
        0xc1 => Err(DecodeError::Malformed("reserved marker 0xc1".into())),
        0xc2 => Ok(Some(Value::Bool(false))),
        0xc3 => Ok(Some(Value::Bool(true))),
        0xc4 => read_bin(bytes, pos, 1),
        0xc5 => read_bin(bytes, pos, 2),
        0xc6 => read_bin(bytes, pos, 4),
        0xc7 => read_ext(bytes, pos, 1),
        0xc8 => read_ext(bytes, pos, 2),
        0xc9 => read_ext(bytes, pos, 4),
        0xca => read_f32(bytes, pos),
        0xcb => read_f64(bytes, pos),
        0xcc => read_uint(bytes, pos, 1),
        0xcd => read_uint(bytes, pos, 2),
        0xce => read_uint(bytes, pos, 4),
        0xcf => read_uint(bytes, pos, 8),
        0xd0 => read_int(bytes, pos, 1),
        0xd1 => read_int(bytes, pos, 2),
        0xd2 => read_int(bytes, pos, 4),
        0xd3 => read_int(bytes, pos, 8),
        0xd4 => read_fixext(bytes, pos, 1),
        0xd5 => read_fixext(bytes, pos, 2),
        0xd6 => read_fixext(bytes, pos, 4),
        0xd7 => read_fixext(bytes, pos, 8),
        0xd8 => read_fixext(bytes, pos, 16),
        0xd9 => read_str(bytes, pos, 1),
        0xda => read_str(bytes, pos, 2),
        0xdb => read_str(bytes, pos, 4),
        0xdc => read_array(bytes, pos, 2),
        0xdd => read_array(bytes, pos, 4),
        0xde => read_map(bytes, pos, 2),
        0xdf => read_map(bytes, pos, 4),
        0xa0..=0xbf => read_str_fixed(bytes, pos, (tag & 0x1f) as usize),
        0x90..=0x9f => read_array_fixed(bytes, pos, (tag & 0x0f) as usize),
        0x80..=0x8f => read_map_fixed(bytes, pos, (tag & 0x0f) as usize),
        _ => Err(DecodeError::Malformed(format!("unrecognized marker 0x{tag:02x}"))),
    }
}

fn read_len(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<usize>, DecodeError> {
    let Some(raw) = take(bytes, pos, width) else {
        return Ok(None);
    };
    let len = match width {
        1 => raw[0] as usize,
        2 => u16::from_be_bytes(raw.try_into().unwrap()) as usize,
        4 => u32::from_be_bytes(raw.try_into().unwrap()) as usize,
        _ => unreachable!(),
    };
    Ok(Some(len))
}

fn read_uint(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(raw) = take(bytes, pos, width) else { return Ok(None) };
    let v = match width {
        1 => raw[0] as u64,
        2 => u16::from_be_bytes(raw.try_into().unwrap()) as u64,
        4 => u32::from_be_bytes(raw.try_into().unwrap()) as u64,
        8 => u64::from_be_bytes(raw.try_into().unwrap()),
        _ => unreachable!(),
    };
    Ok(Some(Value::UInt(v)))
}

fn read_int(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(raw) = take(bytes, pos, width) else { return Ok(None) };
    let v = match width {
        1 => raw[0] as i8 as i64,
        2 => i16::from_be_bytes(raw.try_into().unwrap()) as i64,
        4 => i32::from_be_bytes(raw.try_into().unwrap()) as i64,
        8 => i64::from_be_bytes(raw.try_into().unwrap()),
        _ => unreachable!(),
    };
    Ok(Some(Value::Int(v)))
}

fn read_f32(bytes: &[u8], pos: &mut usize) -> Result<Option<Value>, DecodeError> {
    let Some(raw) = take(bytes, pos, 4) else { return Ok(None) };
    Ok(Some(Value::Float(f32::from_be_bytes(raw.try_into().unwrap()) as f64)))
}

fn read_f64(bytes: &[u8], pos: &mut usize) -> Result<Option<Value>, DecodeError> {
    let Some(raw) = take(bytes, pos, 8) else { return Ok(None) };
    Ok(Some(Value::Float(f64::from_be_bytes(raw.try_into().unwrap()))))
}

fn read_str(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(len) = read_len(bytes, pos, width)? else { return Ok(None) };
    read_str_fixed(bytes, pos, len)
}

fn read_str_fixed(bytes: &[u8], pos: &mut usize, len: usize) -> Result<Option<Value>, DecodeError> {
    let Some(raw) = take(bytes, pos, len) else { return Ok(None) };
    Ok(Some(Value::Str(raw.to_vec())))
}

fn read_bin(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(len) = read_len(bytes, pos, width)? else { return Ok(None) };
    let Some(raw) = take(bytes, pos, len) else { return Ok(None) };
    Ok(Some(Value::Bin(raw.to_vec())))
}

fn read_array(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(len) = read_len(bytes, pos, width)? else { return Ok(None) };
    read_array_fixed(bytes, pos, len)
}

fn read_array_fixed(bytes: &[u8], pos: &mut usize, len: usize) -> Result<Option<Value>, DecodeError> {
    let mut items = Vec::with_capacity(len.min(1024));
    for _ in 0..len {
        match read_value(bytes, pos)? {
            Some(v) => items.push(v),
            None => return Ok(None),
        }
    }
    Ok(Some(Value::Array(items)))
}

fn read_map(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(len) = read_len(bytes, pos, width)? else { return Ok(None) };
    read_map_fixed(bytes, pos, len)
}

fn read_map_fixed(bytes: &[u8], pos: &mut usize, len: usize) -> Result<Option<Value>, DecodeError> {
    let mut map = Map::new();
    for _ in 0..len {
        let Some(key) = read_value(bytes, pos)? else { return Ok(None) };
        let Some(val) = read_value(bytes, pos)? else { return Ok(None) };
        let key_str = match &key {
            Value::Str(b) => String::from_utf8_lossy(b).into_owned(),
            other => format!("{other:?}"),
        };
        map.put(key_str, val);
    }
    Ok(Some(Value::Map(map)))
}

fn read_ext(bytes: &[u8], pos: &mut usize, width: usize) -> Result<Option<Value>, DecodeError> {
    let Some(len) = read_len(bytes, pos, width)? else { return Ok(None) };
    read_ext_fixed(bytes, pos, len)
}

fn read_fixext(bytes: &[u8], pos: &mut usize, len: usize) -> Result<Option<Value>, DecodeError> {
    read_ext_fixed(bytes, pos, len)
}

const TIMESTAMP_TYPE: i8 = -1;

fn read_ext_fixed(bytes: &[u8], pos: &mut usize, len: usize) -> Result<Option<Value>, DecodeError> {
    let Some(type_code) = take_u8(bytes, pos) else { return Ok(None) };
    let type_code = type_code as i8;
    let Some(data) = take(bytes, pos, len) else { return Ok(None) };
    if type_code == TIMESTAMP_TYPE {
        decode_timestamp(data).map(Some)
    } else {
        Ok(Some(Value::Ext { type_code, data: data.to_vec() }))
    }
}

fn decode_timestamp(data: &[u8]) -> Result<Value, DecodeError> {
    let ts = match data.len() {
        4 => Timestamp { seconds: u32::from_be_bytes(data.try_into().unwrap()) as i64, nanoseconds: 0 },
        8 => {
            let combined = u64::from_be_bytes(data.try_into().unwrap());
            Timestamp { seconds: (combined & 0x3_ffff_ffff) as i64, nanoseconds: (combined >> 34) as u32 }
        }
        12 => {
            let nanoseconds = u32::from_be_bytes(data[0..4].try_into().unwrap());
            let seconds = i64::from_be_bytes(data[4..12].try_into().unwrap());
            Timestamp { seconds, nanoseconds }
        }
        other => return Err(DecodeError::Malformed(format!("invalid timestamp ext length {other}"))),
    };
    Ok(Value::Timestamp(ts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_more_data_on_truncated_array() {
        // fixarray of 2 elements, but only the marker is present.
        let bytes = [0x92u8];
        assert_eq!(decode_value(&bytes), Ok(None));
    }

    #[test]
    fn needs_more_data_on_truncated_str_len() {
        let bytes = [0xd9u8]; // str8, length byte missing
        assert_eq!(decode_value(&bytes), Ok(None));
    }

    #[test]
    fn rejects_reserved_marker() {
        let bytes = [0xc1u8];
        assert!(decode_value(&bytes).is_err());
    }

    #[test]
    fn decodes_fixint_family() {
        assert_eq!(decode_value(&[0x05]).unwrap(), Some((Value::UInt(5), 1)));
        assert_eq!(decode_value(&[0xff]).unwrap(), Some((Value::Int(-1), 1)));
    }
}
