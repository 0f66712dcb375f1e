//! Value Conversion Engine.
//!
//! - [`host_to_foreign`]: [`Value`] to a foreign object, checked against a
//!   required class
//! - [`foreign_to_host`]: foreign object to [`Value`], by copy for built-in
//!   classes and by dispatch for everything else
//! - [`IntoValue`] / [`FromValue`]: range-checked bridges between Rust types
//!   and [`Value`]
//!
//! ## Example
//!
//! ```
//! use clownfish::{Value, foreign_to_host, host_to_foreign};
//! use clownfish::runtime::class;
//!
//! let value = Value::from(vec![Value::Int(1), Value::Null, Value::from("z\0z")]);
//! let obj = host_to_foreign(&value, Some(&class::VECTOR), false).unwrap();
//! assert_eq!(foreign_to_host(obj.as_ref()), value);
//!
//! let err = host_to_foreign(&Value::Int(1), Some(&class::STRING), false).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "invalid type: expected Clownfish::String, found Clownfish::Integer"
//! );
//! ```

mod primitive;

pub use primitive::{FromValue, IntoValue};

use clownfish_core::{
    Class, ObjPtr, blob, boolean, bytebuf, class, float, hash, integer, string, vector,
};
use rustc_hash::FxHashMap;

use crate::error::{BridgeResult, ConversionError};
use crate::obj_ref::ObjRef;
use crate::registry;
use crate::value::Value;

fn adopt(ptr: ObjPtr) -> ObjRef {
    // SAFETY: only called on owned claims handed out by the runtime.
    unsafe { ObjRef::from_ptr(ptr) }
}

fn check_class(obj: &ObjRef, required: &Class) -> Result<(), ConversionError> {
    if obj.is_a(required) {
        Ok(())
    } else {
        Err(ConversionError::ClassMismatch {
            found: obj.class().name().to_owned(),
            required: required.name().to_owned(),
        })
    }
}

/// Convert a host value to a foreign object.
///
/// `class` is the required class; `None` accepts any object. A null value
/// yields `Ok(None)` when `nullable` is set and a [`ConversionError::Null`]
/// otherwise. Objects already held by the host are checked against the class
/// chain and shared. Native values are built fresh; sequence and map elements
/// are converted recursively with no class requirement and nulls allowed.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn host_to_foreign(
    value: &Value,
    class: Option<&Class>,
    nullable: bool,
) -> BridgeResult<Option<ObjRef>> {
    crate::init();
    let required = class.unwrap_or(&class::OBJ);
    let obj = match value {
        Value::Null if nullable => return Ok(None),
        Value::Null => {
            return Err(ConversionError::Null {
                required: required.name().to_owned(),
            }
            .into());
        }
        Value::Object(host) => {
            let obj = host.obj_ref();
            check_class(obj, required)?;
            return Ok(Some(obj.clone()));
        }
        Value::Bool(b) => adopt(boolean::singleton(*b)),
        Value::Int(i) => adopt(integer::new(*i)),
        Value::Float(x) => adopt(float::new(*x)),
        Value::Text(s) => adopt(string::new(s)),
        Value::Bytes(b) => adopt(blob::new(b)),
        Value::Seq(items) => seq_to_foreign(items)?,
        Value::Map(map) => map_to_foreign(map)?,
    };
    check_class(&obj, required)?;
    Ok(Some(obj))
}

fn seq_to_foreign(items: &[Value]) -> BridgeResult<ObjRef> {
    let vec = adopt(vector::new(items.len()));
    for item in items {
        let elem = host_to_foreign(item, None, true)?;
        // SAFETY: the element's claim moves into the vector.
        unsafe { vector::push(vec.as_ptr(), elem.map(ObjRef::into_ptr)) };
    }
    Ok(vec)
}

fn map_to_foreign(map: &FxHashMap<String, Value>) -> BridgeResult<ObjRef> {
    let hash = adopt(hash::new(map.len()));
    for (key, value) in map {
        let value = host_to_foreign(value, None, true)?;
        // SAFETY: the value's claim moves into the hash.
        unsafe { hash::store(hash.as_ptr(), key, value.map(ObjRef::into_ptr)) };
    }
    Ok(hash)
}

/// Convert any Rust value with an [`IntoValue`] impl to a foreign object.
///
/// Integers outside the signed 64-bit range fail with a
/// [`RangeError`](crate::RangeError) before anything is allocated.
pub fn to_foreign<T: IntoValue>(
    value: T,
    class: Option<&Class>,
    nullable: bool,
) -> BridgeResult<Option<ObjRef>> {
    let value = value.into_value()?;
    host_to_foreign(&value, class, nullable)
}

/// Convert a foreign object to a host value.
///
/// Null maps to [`Value::Null`]. Strings, blobs, byte buffers, vectors,
/// hashes, floats, booleans and integers (and their subclasses) are copied
/// into native values; hash keys always go through the text rule. Any other
/// object is handed to [`registry::dispatch`].
///
/// # Panics
///
/// Panics if dispatch finds no wrap function for the object's class.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn foreign_to_host(obj: Option<&ObjRef>) -> Value {
    let Some(obj) = obj else {
        return Value::Null;
    };
    let ptr = obj.as_ptr();
    if ptr.is_a(&class::STRING) {
        Value::Text(string::to_string(ptr))
    } else if ptr.is_a(&class::BLOB) {
        Value::Bytes(blob::to_vec(ptr))
    } else if ptr.is_a(&class::BYTEBUF) {
        Value::Bytes(bytebuf::to_vec(ptr))
    } else if ptr.is_a(&class::VECTOR) {
        let elems: Vec<Option<ObjRef>> = vector::elements(ptr)
            .into_iter()
            .map(|elem| elem.map(adopt))
            .collect();
        Value::Seq(elems.iter().map(|elem| foreign_to_host(elem.as_ref())).collect())
    } else if ptr.is_a(&class::HASH) {
        let entries: Vec<(ObjRef, Option<ObjRef>)> = hash::entries(ptr)
            .into_iter()
            .map(|(key, value)| (adopt(key), value.map(adopt)))
            .collect();
        Value::Map(
            entries
                .iter()
                .map(|(key, value)| {
                    (
                        string::to_string(key.as_ptr()),
                        foreign_to_host(value.as_ref()),
                    )
                })
                .collect(),
        )
    } else if ptr.is_a(&class::FLOAT) {
        Value::Float(float::value(ptr))
    } else if ptr.is_a(&class::BOOLEAN) {
        Value::Bool(boolean::value(ptr))
    } else if ptr.is_a(&class::INTEGER) {
        Value::Int(integer::value(ptr))
    } else {
        Value::Object(registry::dispatch(obj.clone()))
    }
}

/// Convert a foreign object straight to a Rust type.
pub fn from_foreign<T: FromValue>(obj: Option<&ObjRef>) -> BridgeResult<T> {
    T::from_value(&foreign_to_host(obj))
}
