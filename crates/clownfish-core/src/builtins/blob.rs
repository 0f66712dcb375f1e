//! `Clownfish::Blob`: immutable bytes.

use crate::class::BLOB;
use crate::obj::{ObjPtr, certify, make_obj};

#[derive(Debug)]
pub struct BlobIvars {
    bytes: Box<[u8]>,
}

impl BlobIvars {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Create a Blob holding a copy of `bytes`. Returns an owned claim.
pub fn new(bytes: &[u8]) -> ObjPtr {
    make_obj(&BLOB, BlobIvars::new(bytes))
}

pub fn to_vec(blob: ObjPtr) -> Vec<u8> {
    certify::<BlobIvars>(blob, &BLOB).as_bytes().to_vec()
}

pub fn size(blob: ObjPtr) -> usize {
    certify::<BlobIvars>(blob, &BLOB).as_bytes().len()
}
