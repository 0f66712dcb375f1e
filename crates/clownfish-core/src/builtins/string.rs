//! `Clownfish::String`: immutable UTF-8 text.

use xxhash_rust::xxh64::xxh64;

use crate::class::STRING;
use crate::obj::{ObjPtr, certify, make_obj};

#[derive(Debug)]
pub struct StringIvars {
    text: Box<str>,
}

impl StringIvars {
    pub fn new(text: &str) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Create a String holding a copy of `text`. Returns an owned claim.
///
/// The byte length is preserved exactly, embedded NULs included.
pub fn new(text: &str) -> ObjPtr {
    make_obj(&STRING, StringIvars::new(text))
}

pub fn to_string(string: ObjPtr) -> String {
    certify::<StringIvars>(string, &STRING).as_str().to_owned()
}

/// Length in bytes.
pub fn size(string: ObjPtr) -> usize {
    certify::<StringIvars>(string, &STRING).as_str().len()
}

pub fn equals_str(string: ObjPtr, other: &str) -> bool {
    certify::<StringIvars>(string, &STRING).as_str() == other
}

/// XXH64 hash of the UTF-8 bytes, used for Hash buckets.
pub fn hash_sum(string: ObjPtr) -> u64 {
    hash_str(certify::<StringIvars>(string, &STRING).as_str())
}

pub(crate) fn hash_str(text: &str) -> u64 {
    xxh64(text.as_bytes(), 0)
}
