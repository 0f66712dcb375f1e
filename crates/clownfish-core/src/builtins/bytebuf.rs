//! `Clownfish::ByteBuf`: growable bytes.

use std::sync::{PoisonError, RwLock};

use crate::class::BYTEBUF;
use crate::obj::{ObjPtr, certify, make_obj};

#[derive(Debug, Default)]
pub struct ByteBufIvars {
    bytes: RwLock<Vec<u8>>,
}

impl ByteBufIvars {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: RwLock::new(bytes.to_vec()),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cat(&self, bytes: &[u8]) {
        self.bytes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create a ByteBuf holding a copy of `bytes`. Returns an owned claim.
pub fn new(bytes: &[u8]) -> ObjPtr {
    make_obj(&BYTEBUF, ByteBufIvars::new(bytes))
}

pub fn to_vec(buf: ObjPtr) -> Vec<u8> {
    certify::<ByteBufIvars>(buf, &BYTEBUF).to_vec()
}

pub fn cat(buf: ObjPtr, bytes: &[u8]) {
    certify::<ByteBufIvars>(buf, &BYTEBUF).cat(bytes);
}

pub fn size(buf: ObjPtr) -> usize {
    certify::<ByteBufIvars>(buf, &BYTEBUF).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::dec_refcount;

    #[test]
    fn cat_appends() {
        let buf = new(b"ab");
        cat(buf, b"\0c");
        assert_eq!(to_vec(buf), b"ab\0c");
        assert_eq!(size(buf), 4);
        unsafe { dec_refcount(buf) };
    }
}
