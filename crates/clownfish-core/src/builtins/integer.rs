//! `Clownfish::Integer`: signed 64-bit integers.

use crate::class::INTEGER;
use crate::obj::{ObjPtr, certify, make_obj};

#[derive(Debug, Clone, Copy)]
pub struct IntegerIvars {
    value: i64,
}

impl IntegerIvars {
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

/// Returns an owned claim.
pub fn new(value: i64) -> ObjPtr {
    make_obj(&INTEGER, IntegerIvars::new(value))
}

pub fn value(integer: ObjPtr) -> i64 {
    certify::<IntegerIvars>(integer, &INTEGER).value()
}
