//! Clownfish core runtime.
//!
//! This crate is the foreign object system the `clownfish` bridge talks to:
//! intrusively reference-counted objects, single-inheritance class
//! descriptors, the built-in classes, and the raise/trap indirection table.
//!
//! The API is deliberately raw. Objects travel as [`ObjPtr`] handles whose
//! ownership is tracked by hand; application code should go through the
//! bridge instead.
//!
//! ## Layout
//!
//! ```text
//! obj       - object header, ObjPtr, make_obj, inc/dec_refcount
//! class     - Class descriptors, built-in class statics, name registry
//! err       - Err objects, ErrHooks, throw/trap
//! builtins  - String, Blob, ByteBuf, Integer, Float, Boolean, Vector, Hash
//! ```

pub mod builtins;
pub mod class;
pub mod err;
pub mod obj;

pub use builtins::{blob, boolean, bytebuf, float, hash, integer, string, vector};
pub use class::{Class, ClassError, ClassFlags, ClassId};
pub use err::ErrHooks;
pub use obj::{Obj, ObjPtr, alloc_size_of, dec_refcount, inc_refcount, make_obj};

/// Bring up the base class hierarchy.
///
/// Registers the built-in class names and creates the Boolean singletons.
/// Safe to call more than once.
pub fn bootstrap() {
    if !err::hooks_installed() {
        log::warn!("clownfish core bootstrapped before host hooks; raising will panic");
    }
    let registered = class::registered_count();
    boolean::singleton(false);
    log::debug!("clownfish core bootstrapped with {registered} class names");
}
