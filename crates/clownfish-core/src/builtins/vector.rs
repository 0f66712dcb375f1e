//! `Clownfish::Vector`: dense, zero-based array of nullable elements.
//!
//! A Vector owns one claim on each non-null element. Functions that put an
//! element in consume the caller's claim; functions that hand one out return
//! a fresh owned claim.

use std::sync::{PoisonError, RwLock};

use crate::class::VECTOR;
use crate::err;
use crate::obj::{ObjPtr, certify, dec_refcount, inc_refcount, make_obj};

/// Largest element count whose storage fits in an allocation.
pub const MAX_VECTOR_SIZE: usize = isize::MAX as usize / size_of::<Option<ObjPtr>>();

#[derive(Debug, Default)]
pub struct VectorIvars {
    elems: RwLock<Vec<Option<ObjPtr>>>,
}

impl VectorIvars {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elems: RwLock::new(Vec::with_capacity(capacity)),
        }
    }
}

impl Drop for VectorIvars {
    fn drop(&mut self) {
        let elems = self.elems.get_mut().unwrap_or_else(PoisonError::into_inner);
        for elem in elems.drain(..).flatten() {
            // SAFETY: the vector owned this claim.
            unsafe { dec_refcount(elem) };
        }
    }
}

fn ivars<'a>(vec: ObjPtr) -> &'a VectorIvars {
    certify::<VectorIvars>(vec, &VECTOR)
}

fn overflow_error() -> ! {
    err::throw_mess("Vector index overflow")
}

/// Returns an owned claim on an empty Vector.
///
/// Raises "Vector index overflow" if `capacity` exceeds [`MAX_VECTOR_SIZE`].
pub fn new(capacity: usize) -> ObjPtr {
    if capacity > MAX_VECTOR_SIZE {
        overflow_error();
    }
    make_obj(&VECTOR, VectorIvars::with_capacity(capacity))
}

/// Append `elem`.
///
/// # Safety
///
/// Consumes the caller's claim on `elem`.
pub unsafe fn push(vec: ObjPtr, elem: Option<ObjPtr>) {
    ivars(vec)
        .elems
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(elem);
}

/// Store `elem` at `tick`, growing the vector with nulls as needed.
///
/// Raises "Vector index overflow" if the vector cannot grow to hold `tick`.
/// The claim on `elem` is released before raising.
///
/// # Safety
///
/// Consumes the caller's claim on `elem`.
pub unsafe fn store(vec: ObjPtr, tick: usize, elem: Option<ObjPtr>) {
    let discard = |elem: Option<ObjPtr>| -> ! {
        if let Some(elem) = elem {
            // SAFETY: the caller's claim is ours to release.
            unsafe { dec_refcount(elem) };
        }
        overflow_error()
    };
    let Some(min_size) = tick.checked_add(1).filter(|&n| n <= MAX_VECTOR_SIZE) else {
        discard(elem)
    };
    let replaced = {
        let mut elems = ivars(vec)
            .elems
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if min_size > elems.len() {
            let additional = min_size - elems.len();
            if elems.try_reserve(additional).is_err() {
                drop(elems);
                discard(elem);
            }
            elems.resize(min_size, None);
        }
        std::mem::replace(&mut elems[tick], elem)
    };
    if let Some(old) = replaced {
        // SAFETY: the vector owned this claim.
        unsafe { dec_refcount(old) };
    }
}

/// Element at `tick` as an owned claim. `None` for nulls and out of range.
pub fn fetch(vec: ObjPtr, tick: usize) -> Option<ObjPtr> {
    let elems = ivars(vec)
        .elems
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    // SAFETY: the vector's claim keeps the element alive under the lock.
    elems
        .get(tick)
        .copied()
        .flatten()
        .map(|elem| unsafe { inc_refcount(elem) })
}

pub fn size(vec: ObjPtr) -> usize {
    ivars(vec)
        .elems
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

/// Every element in order, each non-null one as an owned claim.
pub fn elements(vec: ObjPtr) -> Vec<Option<ObjPtr>> {
    let elems = ivars(vec)
        .elems
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    elems
        .iter()
        // SAFETY: the vector's claim keeps each element alive under the lock.
        .map(|elem| elem.map(|elem| unsafe { inc_refcount(elem) }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{integer, string};

    #[test]
    fn store_fills_gaps_with_null() {
        let vec = new(0);
        unsafe { store(vec, 2, Some(integer::new(9))) };
        assert_eq!(size(vec), 3);
        assert_eq!(fetch(vec, 0), None);
        assert_eq!(fetch(vec, 1), None);

        let elem = fetch(vec, 2).unwrap();
        assert_eq!(integer::value(elem), 9);
        assert_eq!(elem.refcount(), 2);
        unsafe {
            dec_refcount(elem);
            dec_refcount(vec);
        }
    }

    #[test]
    fn destroy_releases_elements() {
        let elem = string::new("kept");
        let vec = new(1);
        unsafe {
            inc_refcount(elem);
            push(vec, Some(elem));
            assert_eq!(elem.refcount(), 2);
            dec_refcount(vec);
            assert_eq!(elem.refcount(), 1);
            dec_refcount(elem);
        }
    }

    #[test]
    #[should_panic(expected = "Vector index overflow")]
    fn store_past_addressable_size_raises() {
        let vec = new(0);
        unsafe { store(vec, usize::MAX, None) };
    }

    #[test]
    #[should_panic(expected = "Vector index overflow")]
    fn store_beyond_allocatable_size_raises() {
        let vec = new(0);
        unsafe { store(vec, MAX_VECTOR_SIZE - 1, None) };
    }

    #[test]
    #[should_panic(expected = "Vector index overflow")]
    fn oversized_capacity_raises() {
        new(MAX_VECTOR_SIZE + 1);
    }

    #[test]
    fn store_releases_replaced_element() {
        let first = string::new("first");
        let vec = new(1);
        unsafe {
            inc_refcount(first);
            push(vec, Some(first));
            store(vec, 0, None);
            assert_eq!(first.refcount(), 1);
            dec_refcount(first);
            dec_refcount(vec);
        }
    }
}
