//! Reference Bridge: host-side claims on foreign objects.
//!
//! An [`ObjRef`] holds exactly one reference-count claim on a foreign object.
//! It is created by adopting a claim the caller already owns ([`ObjRef::wrap`])
//! or by taking a new one ([`ObjRef::share`]), and gives the claim back exactly
//! once: through [`ObjRef::release`], [`ObjRef::into_raw`], or `Drop`.
//!
//! `release` consumes the wrapper, so releasing the same wrapper twice does
//! not compile:
//!
//! ```compile_fail
//! let obj = clownfish::classes::Str::new("once").into_obj_ref();
//! obj.clone().release();
//! obj.release();
//! obj.release();
//! ```
//!
//! # Deterministic release
//!
//! Rust drops wrappers at the end of their scope, but code that needs the
//! release to happen at a specific point should say so with
//! [`ObjRef::release`] or [`ObjRef::scoped`]. `Drop` is the last-resort
//! release for wrappers that were never given back explicitly, including
//! wrappers that were moved into long-lived containers.
//!
//! # Example
//!
//! ```
//! use clownfish::ObjRef;
//! use clownfish::runtime::string;
//!
//! clownfish::init();
//! let raw = string::new("hello").as_raw();
//!
//! let owner = unsafe { ObjRef::wrap(raw) }.unwrap();
//! let alias = unsafe { ObjRef::share(raw) }.unwrap();
//! assert_eq!(owner.refcount(), 2);
//!
//! assert_eq!(alias.release(), 1);
//! let len = owner.scoped(|obj| string::size(obj.as_ptr()));
//! assert_eq!(len, 5);
//! ```

use std::fmt;
use std::mem::ManuallyDrop;

use clownfish_core::{Class, Obj, ObjPtr, dec_refcount, inc_refcount};

use crate::error::{BridgeResult, ConversionError};
use crate::value::Value;

/// One reference-count claim on a foreign object.
pub struct ObjRef {
    ptr: ObjPtr,
}

impl ObjRef {
    /// Adopt the caller's claim on `raw` without incrementing.
    ///
    /// Fails with [`ConversionError::NullHandle`] if `raw` is null.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live object on which the caller owns a claim.
    /// That claim moves into the wrapper.
    pub unsafe fn wrap(raw: *mut Obj) -> BridgeResult<Self> {
        // SAFETY: forwarded from the caller.
        unsafe { Self::wrap_nullable(raw) }.ok_or_else(|| ConversionError::NullHandle.into())
    }

    /// [`ObjRef::wrap`] for contexts where null is permitted.
    ///
    /// # Safety
    ///
    /// Same as [`ObjRef::wrap`].
    pub unsafe fn wrap_nullable(raw: *mut Obj) -> Option<Self> {
        // SAFETY: forwarded from the caller.
        unsafe { ObjPtr::from_raw(raw) }.map(|ptr| unsafe { Self::from_ptr(ptr) })
    }

    /// Take a new claim on `raw` and hold it.
    ///
    /// Fails with [`ConversionError::NullHandle`] if `raw` is null.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live object that stays alive until the
    /// increment happens, i.e. the caller holds or borrows a claim on it.
    pub unsafe fn share(raw: *mut Obj) -> BridgeResult<Self> {
        // SAFETY: forwarded from the caller.
        match unsafe { ObjPtr::from_raw(raw) } {
            Some(ptr) => Ok(unsafe { Self::share_ptr(ptr) }),
            None => Err(ConversionError::NullHandle.into()),
        }
    }

    /// Adopt an owned claim on `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must own a claim on `ptr`; it moves into the wrapper.
    pub unsafe fn from_ptr(ptr: ObjPtr) -> Self {
        crate::init();
        Self { ptr }
    }

    /// Take a new claim on `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must hold or borrow a claim on `ptr`.
    pub unsafe fn share_ptr(ptr: ObjPtr) -> Self {
        // SAFETY: forwarded from the caller.
        unsafe { Self::from_ptr(inc_refcount(ptr)) }
    }

    /// Give back the claim now. Returns the remaining reference count.
    pub fn release(self) -> u32 {
        let ptr = ManuallyDrop::new(self).ptr;
        // SAFETY: the wrapper owned this claim and no longer exists.
        unsafe { dec_refcount(ptr) }
    }

    /// Run `f` with the wrapper, then release it on every exit path.
    pub fn scoped<R>(self, f: impl FnOnce(&ObjRef) -> R) -> R {
        // Unwinding out of `f` drops `self`, which releases.
        let result = f(&self);
        self.release();
        result
    }

    /// Hand the claim to the foreign side without releasing it.
    pub fn into_raw(self) -> *mut Obj {
        self.into_ptr().as_raw()
    }

    /// [`ObjRef::into_raw`] as an [`ObjPtr`].
    pub fn into_ptr(self) -> ObjPtr {
        ManuallyDrop::new(self).ptr
    }

    /// Borrow the handle. The wrapper keeps ownership of its claim.
    pub fn as_ptr(&self) -> ObjPtr {
        self.ptr
    }

    pub fn class(&self) -> &'static Class {
        self.ptr.class()
    }

    /// Whether the object's class is `class` or one of its descendants.
    pub fn is_a(&self, class: &Class) -> bool {
        self.ptr.is_a(class)
    }

    pub fn refcount(&self) -> u32 {
        self.ptr.refcount()
    }

    /// Whether both wrappers hold claims on the same object.
    pub fn same_object(&self, other: &ObjRef) -> bool {
        self.ptr == other.ptr
    }

    /// Instance variables of the object, if they are of type `T`.
    pub fn ivars<T: 'static>(&self) -> Option<&T> {
        self.ptr.ivars::<T>()
    }

    /// Instance variables of an object that must be a `class`. Raises a
    /// foreign exception otherwise.
    pub fn certified_ivars<T: 'static>(&self, class: &'static Class) -> &T {
        self.ptr.certified(class)
    }

    /// Convert the object to a host value. See [`crate::foreign_to_host`].
    pub fn to_host(&self) -> Value {
        crate::convert::foreign_to_host(Some(self))
    }
}

impl Clone for ObjRef {
    /// Share: the clone holds its own claim.
    fn clone(&self) -> Self {
        // SAFETY: `self` holds a claim for the duration of the increment.
        unsafe { Self::share_ptr(self.ptr) }
    }
}

impl Drop for ObjRef {
    fn drop(&mut self) {
        // SAFETY: the wrapper owned this claim.
        unsafe { dec_refcount(self.ptr) };
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjRef")
            .field("class", &self.class().name())
            .field("addr", &format_args!("{:#x}", self.ptr.addr()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clownfish_core::{class, integer, string};
    use std::ptr;

    #[test]
    fn wrap_null_fails() {
        let err = unsafe { ObjRef::wrap(ptr::null_mut()) }.unwrap_err();
        assert!(matches!(
            err,
            crate::BridgeError::Conversion(ConversionError::NullHandle)
        ));
        assert!(unsafe { ObjRef::wrap_nullable(ptr::null_mut()) }.is_none());
        assert!(unsafe { ObjRef::share(ptr::null_mut()) }.is_err());
    }

    #[test]
    fn wrap_adopts_and_share_increments() {
        let raw = integer::new(3).as_raw();
        let owner = unsafe { ObjRef::wrap(raw) }.unwrap();
        assert_eq!(owner.refcount(), 1);

        let alias = unsafe { ObjRef::share(raw) }.unwrap();
        assert_eq!(owner.refcount(), 2);
        assert!(alias.same_object(&owner));

        assert_eq!(alias.release(), 1);
        assert_eq!(owner.refcount(), 1);
    }

    #[test]
    fn clone_and_drop_balance() {
        let obj = unsafe { ObjRef::from_ptr(string::new("balance")) };
        {
            let _a = obj.clone();
            let _b = obj.clone();
            assert_eq!(obj.refcount(), 3);
        }
        assert_eq!(obj.refcount(), 1);
    }

    #[test]
    fn into_raw_keeps_claim() {
        let obj = unsafe { ObjRef::from_ptr(string::new("kept")) };
        let raw = obj.into_raw();
        let back = unsafe { ObjRef::wrap(raw) }.unwrap();
        assert_eq!(back.refcount(), 1);
    }

    #[test]
    fn scoped_releases_after_use() {
        let obj = unsafe { ObjRef::from_ptr(string::new("scoped")) };
        let alias = obj.clone();
        let class = alias.scoped(|inner| inner.class());
        assert!(ptr::eq(class, &class::STRING));
        assert_eq!(obj.refcount(), 1);
    }

    #[test]
    fn scoped_releases_on_unwind() {
        let obj = unsafe { ObjRef::from_ptr(string::new("unwind")) };
        let alias = obj.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            alias.scoped::<()>(|_| panic!("host defect"))
        }));
        assert!(result.is_err());
        assert_eq!(obj.refcount(), 1);
    }

    #[test]
    fn debug_names_class() {
        let obj = unsafe { ObjRef::from_ptr(integer::new(1)) };
        assert!(format!("{obj:?}").contains("Clownfish::Integer"));
    }
}
