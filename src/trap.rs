//! Exception Trap: foreign exceptions as host error values and back.
//!
//! A foreign raise unwinds the host stack with a private payload type that
//! carries the Err object. [`run_trapped`] catches exactly that payload and
//! turns it into a [`TrappedError`]; every other panic is a host fault and is
//! resumed untouched. [`throw_foreign`] goes the other way, raising a host
//! error as a foreign exception.
//!
//! The same two functions back the runtime's [`ErrHooks`], which
//! [`crate::init`] installs before anything else can run.
//!
//! # Example
//!
//! ```
//! use clownfish::{run_trapped, throw_foreign};
//!
//! let ok = run_trapped(|| 42);
//! assert_eq!(ok.unwrap(), 42);
//!
//! let err = run_trapped(|| -> i32 { throw_foreign("boom") }).unwrap_err();
//! assert_eq!(err.message(), "boom");
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use clownfish_core::{ErrHooks, ObjPtr, err};

use crate::classes::ErrObj;
use crate::error::TrappedError;
use crate::obj_ref::ObjRef;

/// Unwind payload for a raised foreign exception.
struct ForeignUnwind {
    err: ErrObj,
}

fn raise(err: ObjPtr) -> ! {
    // SAFETY: the raise hook receives an owned claim on an Err.
    let err = unsafe { ObjRef::from_ptr(err) };
    let err = match ErrObj::try_from(err) {
        Ok(err) => err,
        Err(mismatch) => ErrObj::new(mismatch.to_string()),
    };
    panic::resume_unwind(Box::new(ForeignUnwind { err }))
}

fn trap(routine: &mut dyn FnMut()) -> Option<ObjPtr> {
    catch_foreign(routine)
        .err()
        .map(|err| err.into_obj_ref().into_ptr())
}

/// Hooks handed to the runtime during bootstrap.
pub(crate) fn hooks() -> ErrHooks {
    ErrHooks { raise, trap }
}

fn catch_foreign<T>(routine: impl FnOnce() -> T) -> Result<T, ErrObj> {
    log::trace!("entering trap boundary");
    match panic::catch_unwind(AssertUnwindSafe(routine)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<ForeignUnwind>() {
            Ok(unwind) => {
                log::trace!("trapped clownfish exception");
                Err(unwind.err)
            }
            Err(fault) => panic::resume_unwind(fault),
        },
    }
}

/// Run `routine`, converting a foreign exception it raises into an error.
///
/// The routine runs exactly once. Panics that are not foreign exceptions keep
/// unwinding past this call.
pub fn run_trapped<T>(routine: impl FnOnce() -> T) -> Result<T, TrappedError> {
    crate::init();
    catch_foreign(routine).map_err(TrappedError::new)
}

/// Raise `error` as a foreign exception.
///
/// Unwinds to the nearest trap boundary, whether that is [`run_trapped`] or a
/// trap set by foreign code.
pub fn throw_foreign(error: impl fmt::Display) -> ! {
    crate::init();
    err::throw_mess(error.to_string())
}

/// Raise an existing Err object.
pub fn throw_err(err: ErrObj) -> ! {
    crate::init();
    let ptr = err.into_obj_ref().into_ptr();
    // SAFETY: the claim moves into the raise.
    unsafe { err::throw(ptr) }
}
