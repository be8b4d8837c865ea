//! Typed accessors over [`Value`], in the two flavors `spec.md` §4.1 calls for:
//! `expect_*` (returns a typed `Result`) and `as_*` (returns a typed `Option`,
//! collapsing both "wrong variant" and "doesn't fit" into `None`).

use crate::error::ValueError;
use crate::value::{Map, Value};

macro_rules! expect_variant {
    ($name:ident, $variant:ident, $ty:ty, $tyname:literal) => {
        /// Returns the inner value if `v` is a
        #[doc = concat!("`Value::", stringify!($variant), "`")]
        /// , or `ExpectedType` otherwise.
        pub fn $name(v: &Value) -> Result<$ty, ValueError> {
            match v {
                Value::$variant(x) => Ok(x.clone()),
                _ => Err(ValueError::ExpectedType($tyname)),
            }
        }
    };
}

expect_variant!(expect_bool, Bool, bool, "bool");
expect_variant!(expect_str_bytes, Str, Vec<u8>, "str");
expect_variant!(expect_bin, Bin, Vec<u8>, "bin");
expect_variant!(expect_array, Array, Vec<Value>, "array");
expect_variant!(expect_map, Map, Map, "map");

/// Returns the inner `f64` if `v` is a `Value::Float`, widening is not
/// attempted from integers (MessagePack distinguishes the families).
pub fn expect_f64(v: &Value) -> Result<f64, ValueError> {
    match v {
        Value::Float(f) => Ok(*f),
        _ => Err(ValueError::ExpectedType("float")),
    }
}

/// Returns the value's UTF-8 string contents.
///
/// Decoded strings are kept as raw bytes (`spec.md` §4.1); this accessor is
/// where UTF-8 validation actually happens, producing `ExpectedType` if the
/// bytes are not valid UTF-8.
pub fn expect_str(v: &Value) -> Result<String, ValueError> {
    let bytes = expect_str_bytes(v)?;
    String::from_utf8(bytes).map_err(|_| ValueError::ExpectedType("str"))
}

/// Returns `v` as an `i64`.
///
/// A `Value::UInt` succeeds iff it fits in `i64` (i.e. is `<= i64::MAX`); a
/// `Value::Int` always succeeds.
pub fn expect_i64(v: &Value) -> Result<i64, ValueError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::UInt(u) => i64::try_from(*u).map_err(|_| ValueError::Overflow),
        _ => Err(ValueError::ExpectedType("int")),
    }
}

/// Returns `v` as a `u64`.
///
/// A `Value::Int` succeeds iff it is non-negative; a negative `Value::Int`
/// returns `Overflow`. A `Value::UInt` always succeeds.
pub fn expect_u64(v: &Value) -> Result<u64, ValueError> {
    match v {
        Value::UInt(u) => Ok(*u),
        Value::Int(i) => u64::try_from(*i).map_err(|_| ValueError::Overflow),
        _ => Err(ValueError::ExpectedType("uint")),
    }
}

/// Like [`expect_bool`] but returns `None` on mismatch.
pub fn as_bool(v: &Value) -> Option<bool> {
    expect_bool(v).ok()
}
/// Like [`expect_i64`] but returns `None` on mismatch or overflow.
pub fn as_i64(v: &Value) -> Option<i64> {
    expect_i64(v).ok()
}
/// Like [`expect_u64`] but returns `None` on mismatch or overflow.
pub fn as_u64(v: &Value) -> Option<u64> {
    expect_u64(v).ok()
}
/// Like [`expect_f64`] but returns `None` on mismatch.
pub fn as_f64(v: &Value) -> Option<f64> {
    expect_f64(v).ok()
}
/// Like [`expect_str`] but returns `None` on mismatch or invalid UTF-8.
pub fn as_str(v: &Value) -> Option<String> {
    expect_str(v).ok()
}
/// Like [`expect_bin`] but returns `None` on mismatch.
pub fn as_bin(v: &Value) -> Option<Vec<u8>> {
    expect_bin(v).ok()
}
/// Like [`expect_array`] but returns `None` on mismatch.
pub fn as_array(v: &Value) -> Option<Vec<Value>> {
    expect_array(v).ok()
}
/// Like [`expect_map`] but returns `None` on mismatch.
pub fn as_map(v: &Value) -> Option<Map> {
    expect_map(v).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_overflow_semantics() {
        assert_eq!(as_u64(&Value::Int(-1)), None);
        assert_eq!(expect_u64(&Value::Int(-1)), Err(ValueError::Overflow));
        assert_eq!(as_i64(&Value::UInt(u64::MAX)), None);
        assert_eq!(expect_i64(&Value::UInt(u64::MAX)), Err(ValueError::Overflow));
    }

    #[test]
    fn uint_fits_i64() {
        assert_eq!(expect_i64(&Value::UInt(42)), Ok(42));
        assert_eq!(expect_u64(&Value::Int(42)), Ok(42));
    }

    #[test]
    fn wrong_variant() {
        assert_eq!(expect_bool(&Value::Nil), Err(ValueError::ExpectedType("bool")));
        assert_eq!(as_bool(&Value::Nil), None);
    }

    #[test]
    fn str_requires_utf8() {
        let v = Value::Str(vec![0xff, 0xfe]);
        assert!(expect_str(&v).is_err());
        assert_eq!(as_str(&v), None);
    }
}
