//! Reference-counted object header and handles.
//!
//! Every foreign object is a heap allocation that starts with an [`Obj`]
//! header followed by the class's instance variables. The header carries the
//! class descriptor, an atomic reference count, and the destroy routine that
//! frees the allocation when the count reaches zero.
//!
//! # Ownership
//!
//! An [`ObjPtr`] is a plain copyable address. It does not own anything by
//! itself; ownership is tracked by the reference count. Functions in this crate
//! say in their docs whether they hand a claim to the caller ("returns an owned
//! claim"), take one from the caller ("consumes a claim"), or only borrow.
//!
//! # Example
//!
//! ```
//! use clownfish_core::{class, make_obj, dec_refcount, inc_refcount};
//!
//! let obj = make_obj(&class::OBJ, ());
//! assert_eq!(obj.refcount(), 1);
//!
//! unsafe {
//!     inc_refcount(obj);
//!     assert_eq!(dec_refcount(obj), 1);
//!     assert_eq!(dec_refcount(obj), 0);
//! }
//! ```

use std::any::TypeId;
use std::fmt;
use std::mem::size_of;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::class::{Class, ClassFlags};
use crate::err;

/// Header shared by every foreign object.
#[repr(C)]
pub struct Obj {
    klass: &'static Class,
    refcount: AtomicU32,
    ivars_type: TypeId,
    destroy: unsafe fn(ObjPtr),
}

/// Allocation layout: header first, then the class's instance variables.
#[repr(C)]
struct ObjBox<T> {
    header: Obj,
    ivars: T,
}

/// Allocation size of an object whose instance variables are `T`.
pub const fn alloc_size_of<T>() -> usize {
    size_of::<ObjBox<T>>()
}

/// Address of a live foreign object.
///
/// Equality and hashing are by address. Holding an `ObjPtr` does not keep the
/// object alive; see the module docs for the ownership rules.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjPtr(NonNull<Obj>);

// The header is atomically reference counted and all built-in ivars use
// interior locking.
unsafe impl Send for ObjPtr {}
unsafe impl Sync for ObjPtr {}

impl ObjPtr {
    /// Reinterpret a raw handle.
    ///
    /// Returns `None` for null.
    ///
    /// # Safety
    ///
    /// A non-null `raw` must point at a live object created by this runtime.
    pub unsafe fn from_raw(raw: *mut Obj) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    /// The raw handle.
    pub fn as_raw(self) -> *mut Obj {
        self.0.as_ptr()
    }

    /// Address of the object, for diagnostics and identity.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }

    fn header(&self) -> &Obj {
        // SAFETY: an ObjPtr always refers to a live object while the caller
        // holds or borrows a claim on it.
        unsafe { self.0.as_ref() }
    }

    /// Class descriptor of the object.
    pub fn class(self) -> &'static Class {
        self.header().klass
    }

    /// Whether the object's class is `class` or a descendant of it.
    pub fn is_a(self, class: &Class) -> bool {
        self.class().is_subclass_of(class)
    }

    /// Current reference count.
    pub fn refcount(self) -> u32 {
        if self.class().flags().contains(ClassFlags::IMMORTAL) {
            return 1;
        }
        self.header().refcount.load(Ordering::Acquire)
    }

    /// Instance variables, if they are of type `T`.
    pub fn ivars<T: 'static>(&self) -> Option<&T> {
        let header = self.header();
        if header.ivars_type != TypeId::of::<T>() {
            return None;
        }
        // SAFETY: the type tag matches the layout chosen by `make_obj::<T>`.
        let boxed = unsafe { &*self.0.as_ptr().cast::<ObjBox<T>>() };
        Some(&boxed.ivars)
    }

    /// Instance variables of an object that must be a `class`.
    ///
    /// Raises if the object is not a `class` or its ivars are not a `T`.
    pub fn certified<T: 'static>(&self, class: &'static Class) -> &T {
        certify(*self, class)
    }
}

impl fmt::Debug for ObjPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjPtr({:#x})", self.addr())
    }
}

/// Allocate a new object of `class` with the given instance variables.
///
/// Returns an owned claim: the new object's reference count is 1.
///
/// Raises a foreign exception if `class` was declared with an allocation size
/// that does not match `T`.
pub fn make_obj<T: Send + Sync + 'static>(class: &'static Class, ivars: T) -> ObjPtr {
    if class.obj_alloc_size() != alloc_size_of::<T>() {
        err::throw_mess(format!(
            "Class {} expects objects of {} bytes, got {}",
            class.name(),
            class.obj_alloc_size(),
            alloc_size_of::<T>()
        ));
    }
    let boxed = Box::new(ObjBox {
        header: Obj {
            klass: class,
            refcount: AtomicU32::new(1),
            ivars_type: TypeId::of::<T>(),
            destroy: destroy_box::<T>,
        },
        ivars,
    });
    ObjPtr(NonNull::from(Box::leak(boxed)).cast())
}

unsafe fn destroy_box<T>(obj: ObjPtr) {
    // SAFETY: only installed by `make_obj::<T>`, which leaked a Box<ObjBox<T>>.
    drop(unsafe { Box::from_raw(obj.0.as_ptr().cast::<ObjBox<T>>()) });
}

/// Add a claim on `obj`. Returns `obj` for chaining.
///
/// No-op for immortal classes.
///
/// # Safety
///
/// The caller must already hold or borrow a claim on `obj`.
pub unsafe fn inc_refcount(obj: ObjPtr) -> ObjPtr {
    if !obj.class().flags().contains(ClassFlags::IMMORTAL) {
        obj.header().refcount.fetch_add(1, Ordering::Relaxed);
    }
    obj
}

/// Give up one claim on `obj`, destroying it when no claims remain.
///
/// Returns the remaining count. Raises a foreign exception if the count is
/// already zero. No-op for immortal classes.
///
/// # Safety
///
/// The caller must own the claim being released and must not use `obj` again
/// unless it still holds another claim.
pub unsafe fn dec_refcount(obj: ObjPtr) -> u32 {
    let header = obj.header();
    if header.klass.flags().contains(ClassFlags::IMMORTAL) {
        return 1;
    }
    match header
        .refcount
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1))
    {
        Ok(1) => {
            let destroy = header.destroy;
            // SAFETY: that was the last claim.
            unsafe { destroy(obj) };
            0
        }
        Ok(previous) => previous - 1,
        Err(_) => err::throw_mess(format!(
            "Illegal refcount of 0 for {} object at {:#x}",
            header.klass.name(),
            obj.addr()
        )),
    }
}

/// Instance variables of `obj`, raising a foreign exception if it is not a
/// `class` object laid out as `T`.
///
/// The returned reference is only valid while the caller's claim is held.
pub(crate) fn certify<'a, T: 'static>(obj: ObjPtr, class: &'static Class) -> &'a T {
    if !obj.is_a(class) {
        err::throw_mess(format!(
            "Not a {}: got {}",
            class.name(),
            obj.class().name()
        ));
    }
    match obj.ivars::<T>() {
        // SAFETY: the object outlives the caller's use of its ivars.
        Some(ivars) => unsafe { &*(ivars as *const T) },
        None => err::throw_mess(format!(
            "{} object has an incompatible layout for {}",
            obj.class().name(),
            class.name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class;

    #[test]
    fn new_object_has_one_claim() {
        let obj = make_obj(&class::OBJ, ());
        assert_eq!(obj.refcount(), 1);
        assert!(std::ptr::eq(obj.class(), &class::OBJ));
        unsafe { dec_refcount(obj) };
    }

    #[test]
    fn ivars_checks_type() {
        let obj = make_obj(&class::INTEGER, crate::integer::IntegerIvars::new(7));
        assert!(obj.ivars::<crate::integer::IntegerIvars>().is_some());
        assert!(obj.ivars::<crate::float::FloatIvars>().is_none());
        unsafe { dec_refcount(obj) };
    }

    #[test]
    fn destroy_runs_once_at_zero() {
        use std::sync::Arc;
        use std::sync::atomic::AtomicUsize;

        struct Tracked(Arc<AtomicUsize>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let klass = Class::define::<Tracked>("Test::ObjTracked", &class::OBJ).unwrap();
        let obj = make_obj(klass, Tracked(Arc::clone(&drops)));
        unsafe {
            inc_refcount(obj);
            assert_eq!(dec_refcount(obj), 1);
            assert_eq!(drops.load(Ordering::SeqCst), 0);
            assert_eq!(dec_refcount(obj), 0);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn immortal_objects_ignore_refcounting() {
        let truth = crate::boolean::singleton(true);
        unsafe {
            inc_refcount(truth);
            assert_eq!(dec_refcount(truth), 1);
            assert_eq!(dec_refcount(truth), 1);
        }
        assert_eq!(truth.refcount(), 1);
        assert!(crate::boolean::value(truth));
    }

    #[test]
    #[should_panic(expected = "Class Test::SizeMismatch expects objects of")]
    fn layout_mismatch_raises() {
        let klass = Class::define::<()>("Test::SizeMismatch", &class::OBJ).unwrap();
        make_obj(klass, [0u8; 64]);
    }
}
