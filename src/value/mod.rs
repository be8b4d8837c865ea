//! The MessagePack value model: construction, inspection, and (de)serialization
//! of the dynamically-typed payloads exchanged with a Neovim peer.
//!
//! Unlike `rmpv::Value`, which this module's shape is closest to, [`Value`]
//! keeps the `Map` variant insertion-ordered and has a dedicated
//! [`Value::Timestamp`] variant for ext type -1, matching `spec.md` §3.

mod accessors;
mod decode;
mod encode;

pub use accessors::*;
pub use decode::decode_value;
pub use encode::encode_value;

use std::time::{Duration, SystemTime};

/// The MessagePack payload type.
///
/// A `Value` owns its heap contents; dropping a container drops its children
/// recursively (this falls out of ordinary Rust ownership — there is no
/// separate manual free step needed, see [`free`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The MessagePack `nil` value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed integer, used for any negative integer and for positive
    /// integers that were encoded in a signed wire format.
    ///
    /// MessagePack's compact positive-fixint and larger unsigned-family
    /// markers are indistinguishable on the wire from their signed
    /// counterparts for the same non-negative magnitude; the decoder always
    /// produces [`Value::UInt`] for a non-negative integer, so a hand-built
    /// `Value::Int` holding a non-negative number round-trips as `UInt` of
    /// the same magnitude rather than itself (see `src/value/encode.rs`'s
    /// module docs).
    Int(i64),
    /// An unsigned integer, used for positive integers encoded in an
    /// unsigned wire format (notably `msgid` and other always-nonnegative
    /// fields), and for any non-negative [`Value::Int`] once it has passed
    /// through the wire.
    UInt(u64),
    /// A floating-point number (wire `float32` or `float64`).
    Float(f64),
    /// A MessagePack `str`. Kept as raw bytes — the decoder does not
    /// re-validate UTF-8 (`spec.md` §4.1).
    Str(Vec<u8>),
    /// A MessagePack `bin`.
    Bin(Vec<u8>),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// A mapping from string keys to values. Preserves insertion order;
    /// callers must look keys up rather than rely on position.
    Map(Map),
    /// A MessagePack extension type other than the timestamp type (-1).
    Ext {
        /// The application-defined type code.
        type_code: i8,
        /// The raw extension payload.
        data: Vec<u8>,
    },
    /// A MessagePack timestamp (ext type -1).
    Timestamp(Timestamp),
}

/// An insertion-order-preserving string-keyed map.
///
/// Modeled as a `Vec<(String, Value)>` rather than a `HashMap` because
/// `spec.md` §3 requires the key set to be preserved but not necessarily the
/// iteration order across a round trip — a `Vec` makes "insertion order" the
/// literal, obvious representation rather than an invariant to maintain by
/// hand over a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map(Vec<(String, Value)>);

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Map(Vec::new())
    }

    /// Inserts or replaces the value for `key`.
    ///
    /// If `key` already exists, its value is replaced in place (preserving
    /// its original position) rather than moved to the end.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.put(k, v);
        }
        map
    }
}

/// A MessagePack timestamp, as decoded from ext type -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Nanoseconds within the second (0..=999_999_999).
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Converts to a [`SystemTime`], saturating at the epoch for negative
    /// `seconds`.
    #[must_use]
    pub fn to_system_time(self) -> SystemTime {
        if self.seconds >= 0 {
            SystemTime::UNIX_EPOCH + Duration::new(self.seconds as u64, self.nanoseconds)
        } else {
            SystemTime::UNIX_EPOCH - Duration::new((-self.seconds) as u64, self.nanoseconds)
        }
    }
}

/// Constructs the `nil` value.
#[must_use]
pub fn nil() -> Value {
    Value::Nil
}

/// Constructs a boolean value.
#[must_use]
pub fn boolean(b: bool) -> Value {
    Value::Bool(b)
}

/// Constructs a signed-integer value.
#[must_use]
pub fn int(v: i64) -> Value {
    Value::Int(v)
}

/// Constructs an unsigned-integer value.
#[must_use]
pub fn uint(v: u64) -> Value {
    Value::UInt(v)
}

/// Constructs a floating-point value.
#[must_use]
pub fn float(v: f64) -> Value {
    Value::Float(v)
}

/// Constructs a string value from raw bytes (not required to be valid UTF-8).
#[must_use]
pub fn string(bytes: impl Into<Vec<u8>>) -> Value {
    Value::Str(bytes.into())
}

/// Constructs a binary value.
#[must_use]
pub fn binary(bytes: impl Into<Vec<u8>>) -> Value {
    Value::Bin(bytes.into())
}

/// Constructs an array value, taking ownership of the children.
#[must_use]
pub fn array(children: impl Into<Vec<Value>>) -> Value {
    Value::Array(children.into())
}

/// Constructs an empty map value.
#[must_use]
pub fn map() -> Value {
    Value::Map(Map::new())
}

/// Recursively releases a value's owned memory.
///
/// Rust frees container contents on drop already; this function exists to
/// give the value model the explicit `free` entry point `spec.md` §4.1
/// describes. Calling it is equivalent to, and no more necessary than,
/// letting `value` go out of scope — it is provided for API parity with
/// callers porting code that expects an explicit free call.
pub fn free(value: Value) {
    drop(value);
}

/// Projects a record of named fields into a [`Value::Map`].
///
/// This is the Rust shape of the "object helper" in `spec.md` §4.1: the only
/// failure mode that helper document calls out (freeing a nested payload if
/// the map insertion fails due to OOM) cannot arise here because `Map::put`
/// is infallible — insertion failure in this implementation can only be a
/// global allocator abort, which Rust already handles by aborting the
/// process before any leak-introducing partial state could be observed. The
/// builder closure pattern below still keeps each nested value's lifetime
/// scoped to a single `put` call, so nothing is held in a half-moved state
/// across fields.
pub fn object(fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut map = Map::new();
    for (key, value) in fields {
        map.put(key, value);
    }
    Value::Map(map)
}

impl Value {
    /// Returns the MessagePack type name, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bin(_) => "bin",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Ext { .. } => "ext",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// True for `Value::Nil`.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into_bytes())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}
