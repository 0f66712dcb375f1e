//! Conversion traits between Rust types and [`Value`].
//!
//! ## Supported Types
//!
//! - Integers: `i8` to `i128`, `u8` to `u128`, `isize`, `usize`. Values
//!   outside the signed 64-bit range fail with [`RangeError`].
//! - Floats: `f32` (widened), `f64`
//! - `bool`, `&str`, `String`, `&[u8]` and `Box<[u8]>` (as bytes)
//! - `Option<T>`, `Vec<T>`, `HashMap<String, T>`, `BTreeMap<String, T>`
//! - [`ObjRef`] and boxed host wrappers, by reference
//!
//! `Vec<u8>` is a sequence of integers, not a byte string; use `&[u8]`,
//! `Box<[u8]>` or [`Value::bytes`] for bytes.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::{BridgeResult, ConversionError, RangeError};
use crate::obj_ref::ObjRef;
use crate::registry::HostObject;
use crate::value::Value;

/// Convert a Rust value into a [`Value`].
pub trait IntoValue {
    /// Fails only for integers outside the signed 64-bit range.
    fn into_value(self) -> Result<Value, RangeError>;
}

/// Extract a Rust value from a [`Value`].
pub trait FromValue: Sized {
    /// Returns a [`ConversionError`] for the wrong kind of value and a
    /// [`RangeError`] for integers that do not fit `Self`.
    fn from_value(value: &Value) -> BridgeResult<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: value.type_name(),
    }
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_into_value_lossless {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Result<Value, RangeError> {
                    Ok(Value::Int(i64::from(self)))
                }
            }
        )*
    };
}

impl_into_value_lossless!(i8, i16, i32, i64, u8, u16, u32);

// Wider or pointer-sized types are checked against the i64 range
macro_rules! impl_into_value_checked {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Result<Value, RangeError> {
                    i64::try_from(self)
                        .map(Value::Int)
                        .map_err(|_| RangeError::new(self, "i64"))
                }
            }
        )*
    };
}

impl_into_value_checked!(u64, u128, i128, usize, isize);

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> BridgeResult<Self> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v)
                            .map_err(|_| RangeError::new(*v, stringify!($ty)).into()),
                        _ => Err(mismatch("int", value).into()),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// ============================================================================
// Scalar implementations
// ============================================================================

impl IntoValue for f64 {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Float(self))
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Float(f64::from(self)))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        value
            .as_float()
            .ok_or_else(|| mismatch("float", value).into())
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        // Narrowing rounds to the nearest f32.
        f64::from_value(value).map(|x| x as f32)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Bool(self))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value).into())
    }
}

// ============================================================================
// Text and bytes
// ============================================================================

impl IntoValue for &str {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Text(self.to_owned()))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Text(self))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("text", value).into())
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Bytes(self.to_vec()))
    }
}

impl IntoValue for Box<[u8]> {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Bytes(self.into_vec()))
    }
}

impl FromValue for Box<[u8]> {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        value
            .as_bytes()
            .map(Box::from)
            .ok_or_else(|| mismatch("bytes", value).into())
    }
}

// ============================================================================
// Values and objects
// ============================================================================

impl IntoValue for Value {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(self)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        Ok(value.clone())
    }
}

impl IntoValue for ObjRef {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::object(self))
    }
}

impl FromValue for ObjRef {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        value
            .as_object()
            .map(|host| host.obj_ref().clone())
            .ok_or_else(|| mismatch("object", value).into())
    }
}

impl IntoValue for Box<dyn HostObject> {
    fn into_value(self) -> Result<Value, RangeError> {
        Ok(Value::Object(self))
    }
}

impl FromValue for Box<dyn HostObject> {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        value
            .as_object()
            .map(|host| host.share())
            .ok_or_else(|| mismatch("object", value).into())
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Result<Value, RangeError> {
        self.map_or(Ok(Value::Null), IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Result<Value, RangeError> {
        self.into_iter()
            .map(IntoValue::into_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Seq(items) => items.iter().map(T::from_value).collect(),
            _ => Err(mismatch("seq", value).into()),
        }
    }
}

impl<K: Into<String>, V: IntoValue, S: BuildHasher> IntoValue for HashMap<K, V, S> {
    fn into_value(self) -> Result<Value, RangeError> {
        self.into_iter()
            .map(|(k, v)| v.into_value().map(|v| (k.into(), v)))
            .collect::<Result<_, _>>()
            .map(Value::Map)
    }
}

impl<V: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, V, S> {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| V::from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => Err(mismatch("map", value).into()),
        }
    }
}

impl<K: Into<String>, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Result<Value, RangeError> {
        self.into_iter()
            .map(|(k, v)| v.into_value().map(|v| (k.into(), v)))
            .collect::<Result<_, _>>()
            .map(Value::Map)
    }
}

impl<V: FromValue> FromValue for BTreeMap<String, V> {
    fn from_value(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| V::from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => Err(mismatch("map", value).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeError;

    #[test]
    fn unsigned_max_is_rejected() {
        let err = u64::MAX.into_value().unwrap_err();
        assert_eq!(err, RangeError::new(u64::MAX, "i64"));
        assert_eq!(42u64.into_value().unwrap(), Value::Int(42));
        assert_eq!(
            (i64::MAX as u64).into_value().unwrap(),
            Value::Int(i64::MAX)
        );
    }

    #[test]
    fn wide_integers_are_checked() {
        assert!(i128::MIN.into_value().is_err());
        assert_eq!((-5i128).into_value().unwrap(), Value::Int(-5));
        assert!(u128::MAX.into_value().is_err());
    }

    #[test]
    fn narrowing_extraction() {
        assert_eq!(u8::from_value(&Value::Int(255)).unwrap(), 255);
        let err = u8::from_value(&Value::Int(256)).unwrap_err();
        assert!(matches!(err, BridgeError::Range(_)));
        let err = u64::from_value(&Value::Int(-1)).unwrap_err();
        assert!(matches!(err, BridgeError::Range(_)));
    }

    #[test]
    fn kind_mismatch() {
        let err = i32::from_value(&Value::from("7")).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected int, got text");
    }

    #[test]
    fn f32_widens() {
        assert_eq!(0.5f32.into_value().unwrap(), Value::Float(0.5));
        assert_eq!(f32::from_value(&Value::Float(0.5)).unwrap(), 0.5);
    }

    #[test]
    fn containers() {
        let value = vec![Some(1u32), None].into_value().unwrap();
        assert_eq!(value, Value::Seq(vec![Value::Int(1), Value::Null]));

        let back: Vec<Option<u32>> = Vec::from_value(&value).unwrap();
        assert_eq!(back, [Some(1), None]);

        let map: BTreeMap<&str, u64> = [("big", u64::MAX)].into_iter().collect();
        assert!(map.into_value().is_err());

        let map: HashMap<String, i64> = [("a".to_owned(), 1)].into_iter().collect();
        let value = map.clone().into_value().unwrap();
        let back: HashMap<String, i64> = HashMap::from_value(&value).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn bytes_slice_is_bytes() {
        let value = b"a\0".as_slice().into_value().unwrap();
        assert_eq!(value, Value::bytes(*b"a\0"));
    }

    #[test]
    fn boxed_bytes_extraction() {
        let value = Box::<[u8]>::from(&b"a\0b"[..]).into_value().unwrap();
        assert_eq!(value, Value::bytes(*b"a\0b"));
        assert_eq!(&*Box::<[u8]>::from_value(&value).unwrap(), b"a\0b");

        let err = Box::<[u8]>::from_value(&Value::Seq(vec![Value::Int(97)])).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected bytes, got seq");
    }
}
