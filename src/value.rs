//! Host-side representation of values crossing the boundary.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use rustc_hash::FxHashMap;

use crate::obj_ref::ObjRef;
use crate::registry::{self, HostObject};

/// A host value that can be converted to or from a foreign object.
///
/// The conversion engine matches on this enum exhaustively; every host value
/// is first brought into one of these shapes (see [`crate::IntoValue`]).
#[derive(Default)]
pub enum Value {
    /// Absent value; converts to a null handle.
    #[default]
    Null,
    /// `Clownfish::Boolean`
    Bool(bool),
    /// `Clownfish::Integer`. Every host integer type is range-checked into this.
    Int(i64),
    /// `Clownfish::Float`, compared bit for bit.
    Float(f64),
    /// `Clownfish::String`
    Text(String),
    /// `Clownfish::Blob` (host to foreign), `Blob` or `ByteBuf` (foreign to host)
    Bytes(Vec<u8>),
    /// `Clownfish::Vector`: dense, zero-based, nullable elements
    Seq(Vec<Value>),
    /// `Clownfish::Hash`: iteration order is unspecified
    Map(FxHashMap<String, Value>),
    /// Any other foreign object, by reference
    Object(Box<dyn HostObject>),
}

impl Value {
    /// Get a human-readable name for this value's kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Byte-string value.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Wrap a foreign object, resolving its host wrapper through dispatch.
    pub fn object(obj: ObjRef) -> Self {
        Value::Object(registry::dispatch(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FxHashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&dyn HostObject> {
        match self {
            Value::Object(obj) => Some(obj.as_ref()),
            _ => None,
        }
    }
}

impl Clone for Value {
    /// Deep copy for native shapes. Objects are shared, not copied.
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::Text(s) => Value::Text(s.clone()),
            Value::Bytes(b) => Value::Bytes(b.clone()),
            Value::Seq(items) => Value::Seq(items.clone()),
            Value::Map(map) => Value::Map(map.clone()),
            Value::Object(obj) => Value::Object(obj.share()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Bitwise, so NaN payloads and signed zeros are distinguished.
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.obj_ref().same_object(b.obj_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x:?} / {:#018x})", x.to_bits()),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({b:?})"),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(obj).finish(),
        }
    }
}

// ============================================================================
// From implementations for already-representable host values
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<Box<dyn HostObject>> for Value {
    fn from(obj: Box<dyn HostObject>) -> Self {
        Value::Object(obj)
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Seq(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<S: BuildHasher> From<HashMap<String, Value, S>> for Value {
    fn from(map: HashMap<String, Value, S>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::from(0.5f32), Value::Float(0.5));
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::bytes(*b"ab").type_name(), "bytes");
        assert_eq!(Value::from(vec![Value::Int(1)]).type_name(), "seq");
    }

    #[test]
    fn option_maps_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn collect_into_map() {
        let value: Value = [("a", Value::Int(1)), ("b", Value::Null)]
            .into_iter()
            .collect();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], Value::Int(1));
    }

    #[test]
    fn clone_shares_objects() {
        let original = Value::from(crate::classes::Str::new("shared"));
        let copy = original.clone();
        assert_eq!(original, copy);
        assert_eq!(copy.as_object().unwrap().obj_ref().refcount(), 2);
    }
}
