//! Exception objects and the raise/trap indirection table.
//!
//! The runtime has no unwinding mechanism of its own. Raising and trapping are
//! delegated to the embedding host through [`ErrHooks`], installed once with
//! [`install_hooks`] before any foreign code runs. Raising before installation
//! is a host fault: it panics with an explanatory message instead of jumping
//! through an uninitialized table.

use std::sync::{OnceLock, PoisonError, RwLock};

use crate::class::ERR;
use crate::obj::{ObjPtr, certify, dec_refcount, make_obj};

/// Instance variables of `Clownfish::Err`.
#[derive(Debug)]
pub struct ErrIvars {
    mess: RwLock<String>,
}

impl ErrIvars {
    pub fn new(mess: impl Into<String>) -> Self {
        Self {
            mess: RwLock::new(mess.into()),
        }
    }

    pub fn mess(&self) -> String {
        self.mess
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cat_mess(&self, mess: &str) {
        self.mess
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(mess);
    }
}

/// Host functions the runtime calls to raise and trap exceptions.
#[derive(Debug, Clone, Copy)]
pub struct ErrHooks {
    /// Unwind to the nearest trap, carrying an owned claim on an Err object.
    pub raise: fn(ObjPtr) -> !,
    /// Run a routine, returning an owned claim on the Err it raised, if any.
    pub trap: fn(&mut dyn FnMut()) -> Option<ObjPtr>,
}

static HOOKS: OnceLock<ErrHooks> = OnceLock::new();

/// Install the host hooks.
///
/// Only the first call has any effect; returns whether this call installed
/// them.
pub fn install_hooks(hooks: ErrHooks) -> bool {
    let installed = HOOKS.set(hooks).is_ok();
    if installed {
        log::debug!("installed clownfish raise/trap hooks");
    }
    installed
}

pub fn hooks_installed() -> bool {
    HOOKS.get().is_some()
}

fn missing_hooks(action: &str, mess: &str) -> ! {
    log::error!("clownfish {action} before hooks were installed: {mess}");
    panic!("clownfish {action} before host hooks were installed: {mess}")
}

/// Create an Err object. Returns an owned claim.
pub fn new(mess: impl Into<String>) -> ObjPtr {
    make_obj(&ERR, ErrIvars::new(mess))
}

/// The message of an Err object.
pub fn get_mess(err: ObjPtr) -> String {
    certify::<ErrIvars>(err, &ERR).mess()
}

/// Append to the message of an Err object.
pub fn cat_mess(err: ObjPtr, mess: &str) {
    certify::<ErrIvars>(err, &ERR).cat_mess(mess);
}

/// Raise `err`.
///
/// # Safety
///
/// Consumes the caller's claim on `err`.
pub unsafe fn throw(err: ObjPtr) -> ! {
    let mess = get_mess(err);
    let raise = match HOOKS.get() {
        Some(hooks) => hooks.raise,
        None => {
            // SAFETY: the claim was handed to us and nothing will catch it.
            unsafe { dec_refcount(err) };
            missing_hooks("raise", &mess)
        }
    };
    log::trace!("raising clownfish exception: {mess}");
    raise(err)
}

/// Create an Err with `mess` and raise it.
pub fn throw_mess(mess: impl Into<String>) -> ! {
    let err = new(mess);
    // SAFETY: `err` is a fresh owned claim.
    unsafe { throw(err) }
}

/// Run `routine`, catching any exception it raises.
///
/// Returns an owned claim on the raised Err, or `None` if the routine
/// completed normally. Faults other than raised exceptions keep unwinding.
pub fn trap(routine: &mut dyn FnMut()) -> Option<ObjPtr> {
    match HOOKS.get() {
        Some(hooks) => (hooks.trap)(routine),
        None => missing_hooks("trap", "routine not run"),
    }
}

/// Report a non-fatal condition.
pub fn warn_mess(mess: &str) {
    log::warn!("{mess}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_accumulates() {
        let err = new("first");
        cat_mess(err, ", second");
        assert_eq!(get_mess(err), "first, second");
        assert!(err.is_a(&ERR));
        unsafe { dec_refcount(err) };
    }

    #[test]
    #[should_panic(expected = "clownfish raise before host hooks were installed: boom")]
    fn raise_without_hooks_panics() {
        assert!(!hooks_installed());
        throw_mess("boom");
    }

    #[test]
    #[should_panic(expected = "clownfish trap before host hooks were installed")]
    fn trap_without_hooks_panics() {
        trap(&mut || {});
    }
}
