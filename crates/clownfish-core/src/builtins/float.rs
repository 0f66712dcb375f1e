//! `Clownfish::Float`: IEEE-754 doubles, stored bit for bit.

use crate::class::FLOAT;
use crate::obj::{ObjPtr, certify, make_obj};

#[derive(Debug, Clone, Copy)]
pub struct FloatIvars {
    value: f64,
}

impl FloatIvars {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Returns an owned claim.
pub fn new(value: f64) -> ObjPtr {
    make_obj(&FLOAT, FloatIvars::new(value))
}

pub fn value(float: ObjPtr) -> f64 {
    certify::<FloatIvars>(float, &FLOAT).value()
}
