//! Host wrappers for the built-in classes.
//!
//! [`register_builtins`] registers a wrap function for every built-in class
//! during [`crate::init`]. Values of the primitive-like classes normally cross
//! the boundary by copy through [`crate::foreign_to_host`]; these wrappers are
//! what [`crate::registry::dispatch`] produces when an object is asked for by
//! reference instead.

use clownfish_core::{
    Class, blob, boolean, bytebuf, class, err, float, hash, integer, string, vector,
};

use crate::convert::{foreign_to_host, host_to_foreign};
use crate::error::BridgeResult;
use crate::obj_ref::ObjRef;
use crate::registry::{self, WrapFn};
use crate::value::Value;

crate::host_object! {
    /// Any object, viewed through the universal base class.
    pub struct Object => &class::OBJ;
}

crate::host_object! {
    /// `Clownfish::String`.
    pub struct Str => &class::STRING;
}

crate::host_object! {
    /// `Clownfish::Blob`.
    pub struct Blob => &class::BLOB;
}

crate::host_object! {
    /// `Clownfish::ByteBuf`.
    pub struct ByteBuf => &class::BYTEBUF;
}

crate::host_object! {
    /// `Clownfish::Integer`.
    pub struct Integer => &class::INTEGER;
}

crate::host_object! {
    /// `Clownfish::Float`.
    pub struct Float => &class::FLOAT;
}

crate::host_object! {
    /// `Clownfish::Boolean`.
    pub struct Boolean => &class::BOOLEAN;
}

crate::host_object! {
    /// `Clownfish::Vector`.
    pub struct Vector => &class::VECTOR;
}

crate::host_object! {
    /// `Clownfish::Hash`.
    pub struct Hash => &class::HASH;
}

crate::host_object! {
    /// `Clownfish::Err`.
    pub struct ErrObj => &class::ERR;
}

/// Register wrap functions for every built-in class.
pub(crate) fn register_builtins() {
    let entries: [(&'static Class, WrapFn); 10] = [
        (Object::foreign_class(), Object::wrap_fn),
        (Str::foreign_class(), Str::wrap_fn),
        (Blob::foreign_class(), Blob::wrap_fn),
        (ByteBuf::foreign_class(), ByteBuf::wrap_fn),
        (Integer::foreign_class(), Integer::wrap_fn),
        (Float::foreign_class(), Float::wrap_fn),
        (Boolean::foreign_class(), Boolean::wrap_fn),
        (Vector::foreign_class(), Vector::wrap_fn),
        (Hash::foreign_class(), Hash::wrap_fn),
        (ErrObj::foreign_class(), ErrObj::wrap_fn),
    ];
    registry::register_wrap_fns(entries);
}

fn adopt(ptr: clownfish_core::ObjPtr) -> ObjRef {
    // SAFETY: every constructor below returns an owned claim.
    unsafe { ObjRef::from_ptr(ptr) }
}

impl Str {
    pub fn new(text: &str) -> Self {
        Self(adopt(string::new(text)))
    }

    pub fn as_str(&self) -> &str {
        self.0
            .certified_ivars::<string::StringIvars>(&class::STRING)
            .as_str()
    }
}

impl Blob {
    pub fn new(bytes: &[u8]) -> Self {
        Self(adopt(blob::new(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0
            .certified_ivars::<blob::BlobIvars>(&class::BLOB)
            .as_bytes()
    }
}

impl ByteBuf {
    pub fn new(bytes: &[u8]) -> Self {
        Self(adopt(bytebuf::new(bytes)))
    }

    pub fn cat(&self, bytes: &[u8]) {
        bytebuf::cat(self.0.as_ptr(), bytes);
    }

    pub fn to_vec(&self) -> Vec<u8> {
        bytebuf::to_vec(self.0.as_ptr())
    }

    pub fn len(&self) -> usize {
        bytebuf::size(self.0.as_ptr())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Integer {
    pub fn new(value: i64) -> Self {
        Self(adopt(integer::new(value)))
    }

    pub fn value(&self) -> i64 {
        integer::value(self.0.as_ptr())
    }
}

impl Float {
    pub fn new(value: f64) -> Self {
        Self(adopt(float::new(value)))
    }

    pub fn value(&self) -> f64 {
        float::value(self.0.as_ptr())
    }
}

impl Boolean {
    /// The shared TRUE or FALSE object.
    pub fn of(value: bool) -> Self {
        Self(adopt(boolean::singleton(value)))
    }

    pub fn value(&self) -> bool {
        boolean::value(self.0.as_ptr())
    }
}

impl Vector {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(adopt(vector::new(capacity)))
    }

    /// Append a host value, converting it to a foreign object first.
    pub fn push(&self, value: &Value) -> BridgeResult<()> {
        let elem = host_to_foreign(value, None, true)?;
        // SAFETY: the converted element's claim moves into the vector.
        unsafe { vector::push(self.0.as_ptr(), elem.map(ObjRef::into_ptr)) };
        Ok(())
    }

    /// Store a host value at `tick`, padding with nulls.
    pub fn store(&self, tick: usize, value: &Value) -> BridgeResult<()> {
        let elem = host_to_foreign(value, None, true)?;
        // SAFETY: the converted element's claim moves into the vector.
        unsafe { vector::store(self.0.as_ptr(), tick, elem.map(ObjRef::into_ptr)) };
        Ok(())
    }

    /// Element at `tick`, shared. `None` for nulls and out of range.
    pub fn fetch(&self, tick: usize) -> Option<ObjRef> {
        vector::fetch(self.0.as_ptr(), tick).map(adopt)
    }

    /// Element at `tick` converted to a host value.
    pub fn get(&self, tick: usize) -> Value {
        foreign_to_host(self.fetch(tick).as_ref())
    }

    pub fn len(&self) -> usize {
        vector::size(self.0.as_ptr())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Vector {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(adopt(hash::new(capacity)))
    }

    /// Store a host value under `key`, converting it first.
    pub fn store(&self, key: &str, value: &Value) -> BridgeResult<()> {
        let value = host_to_foreign(value, None, true)?;
        // SAFETY: the converted value's claim moves into the hash.
        unsafe { hash::store(self.0.as_ptr(), key, value.map(ObjRef::into_ptr)) };
        Ok(())
    }

    /// Value under `key`, shared. `None` for nulls and missing keys.
    pub fn fetch(&self, key: &str) -> Option<ObjRef> {
        hash::fetch(self.0.as_ptr(), key).map(adopt)
    }

    /// Value under `key` converted to a host value.
    pub fn get(&self, key: &str) -> Value {
        foreign_to_host(self.fetch(key).as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        hash::has_key(self.0.as_ptr(), key)
    }

    /// Remove `key`, returning its value converted to a host value.
    pub fn remove(&self, key: &str) -> Value {
        foreign_to_host(hash::delete(self.0.as_ptr(), key).map(adopt).as_ref())
    }

    pub fn len(&self) -> usize {
        hash::size(self.0.as_ptr())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrObj {
    pub fn new(message: impl Into<String>) -> Self {
        Self(adopt(err::new(message)))
    }

    pub fn message(&self) -> String {
        err::get_mess(self.0.as_ptr())
    }

    pub fn cat_mess(&self, message: &str) {
        err::cat_mess(self.0.as_ptr(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_borrows_foreign_text() {
        let s = Str::new("z\0z");
        assert_eq!(s.as_str(), "z\0z");
        assert_eq!(s.as_str().len(), 3);
    }

    #[test]
    fn incompatible_subclass_layout_raises() {
        let odd = Class::define::<u8>("Test::OddString", &class::STRING).unwrap();
        let obj = unsafe { ObjRef::from_ptr(clownfish_core::make_obj(odd, 0u8)) };
        let s = Str::try_from(obj).unwrap();
        let err = crate::run_trapped(|| s.as_str().len()).unwrap_err();
        assert_eq!(
            err.message(),
            "Test::OddString object has an incompatible layout for Clownfish::String"
        );

        let odd = Class::define::<u8>("Test::OddBlob", &class::BLOB).unwrap();
        let obj = unsafe { ObjRef::from_ptr(clownfish_core::make_obj(odd, 0u8)) };
        let b = Blob::try_from(obj).unwrap();
        assert!(crate::run_trapped(|| b.as_bytes().len()).is_err());
    }

    #[test]
    fn store_past_addressable_size_is_trapped() {
        let vec = Vector::new();
        let err = crate::run_trapped(|| vec.store(usize::MAX, &Value::Int(1))).unwrap_err();
        assert_eq!(err.message(), "Vector index overflow");
        assert!(vec.is_empty());
    }

    #[test]
    fn try_from_checks_class() {
        let obj = Integer::new(1).into_obj_ref();
        let err = Str::try_from(obj.clone()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid type: expected Clownfish::String, found Clownfish::Integer"
        );
        assert!(Object::try_from(obj).is_ok());
    }

    #[test]
    fn vector_converts_elements() {
        let vec = Vector::new();
        vec.push(&Value::from("a")).unwrap();
        vec.store(2, &Value::Int(3)).unwrap();
        assert_eq!(vec.len(), 3);
        assert_eq!(vec.get(0), Value::from("a"));
        assert_eq!(vec.get(1), Value::Null);
        assert_eq!(vec.get(2), Value::Int(3));
        assert!(vec.fetch(7).is_none());
    }

    #[test]
    fn hash_converts_values() {
        let hash = Hash::new();
        hash.store("n", &Value::Float(0.5)).unwrap();
        hash.store("nothing", &Value::Null).unwrap();
        assert!(hash.contains_key("nothing"));
        assert_eq!(hash.get("n"), Value::Float(0.5));
        assert_eq!(hash.remove("n"), Value::Float(0.5));
        assert_eq!(hash.len(), 1);
    }

    #[test]
    fn bytebuf_grows() {
        let buf = ByteBuf::new(b"");
        assert!(buf.is_empty());
        buf.cat(b"\0\x01");
        assert_eq!(buf.to_vec(), vec![0, 1]);
    }

    #[test]
    fn err_message() {
        let err = ErrObj::new("boom");
        err.cat_mess("!");
        assert_eq!(err.message(), "boom!");
    }

    #[test]
    fn booleans_are_shared() {
        let a = Boolean::of(true);
        let b = Boolean::of(true);
        assert!(a.obj().same_object(b.obj()));
        assert!(a.value());
        assert!(!Boolean::of(false).value());
    }
}
