//! `Clownfish::Boolean`: the two immortal truth values.

use std::sync::OnceLock;

use crate::class::BOOLEAN;
use crate::obj::{ObjPtr, certify, make_obj};

#[derive(Debug, Clone, Copy)]
pub struct BooleanIvars {
    value: bool,
}

impl BooleanIvars {
    pub fn value(&self) -> bool {
        self.value
    }
}

static SINGLETONS: OnceLock<[ObjPtr; 2]> = OnceLock::new();

fn singletons() -> &'static [ObjPtr; 2] {
    SINGLETONS.get_or_init(|| {
        [
            make_obj(&BOOLEAN, BooleanIvars { value: false }),
            make_obj(&BOOLEAN, BooleanIvars { value: true }),
        ]
    })
}

/// The shared TRUE or FALSE object.
///
/// Boolean objects are immortal, so the returned handle may be treated as an
/// owned claim and released any number of times.
pub fn singleton(value: bool) -> ObjPtr {
    singletons()[usize::from(value)]
}

pub fn value(boolean: ObjPtr) -> bool {
    certify::<BooleanIvars>(boolean, &BOOLEAN).value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_shared() {
        assert_eq!(singleton(true), singleton(true));
        assert_ne!(singleton(true), singleton(false));
        assert!(value(singleton(true)));
        assert!(!value(singleton(false)));
    }
}
