//! `Clownfish::Hash`: String keys mapped to nullable values.
//!
//! Keys are copied into fresh String objects on insertion and bucketed by
//! their XXH64 hash sum. Iteration order is unspecified. Value ownership
//! follows the same rules as Vector.

use std::sync::{PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::class::HASH;
use crate::obj::{ObjPtr, certify, dec_refcount, inc_refcount, make_obj};
use crate::string;

#[derive(Debug)]
struct HashEntry {
    key: ObjPtr,
    value: Option<ObjPtr>,
}

#[derive(Debug, Default)]
pub struct HashIvars {
    buckets: RwLock<FxHashMap<u64, Vec<HashEntry>>>,
}

impl HashIvars {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }
}

impl Drop for HashIvars {
    fn drop(&mut self) {
        let buckets = self
            .buckets
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for entry in buckets.drain().flat_map(|(_, bucket)| bucket) {
            // SAFETY: the hash owned both claims.
            unsafe {
                dec_refcount(entry.key);
                if let Some(value) = entry.value {
                    dec_refcount(value);
                }
            }
        }
    }
}

fn ivars<'a>(hash: ObjPtr) -> &'a HashIvars {
    certify::<HashIvars>(hash, &HASH)
}

/// Returns an owned claim on an empty Hash.
pub fn new(capacity: usize) -> ObjPtr {
    make_obj(&HASH, HashIvars::with_capacity(capacity))
}

/// Store `value` under `key`, replacing any previous value.
///
/// # Safety
///
/// Consumes the caller's claim on `value`.
pub unsafe fn store(hash: ObjPtr, key: &str, value: Option<ObjPtr>) {
    let replaced = {
        let mut buckets = ivars(hash)
            .buckets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(string::hash_str(key)).or_default();
        match bucket
            .iter_mut()
            .find(|entry| string::equals_str(entry.key, key))
        {
            Some(entry) => std::mem::replace(&mut entry.value, value),
            None => {
                bucket.push(HashEntry {
                    key: string::new(key),
                    value,
                });
                None
            }
        }
    };
    if let Some(old) = replaced {
        // SAFETY: the hash owned this claim.
        unsafe { dec_refcount(old) };
    }
}

/// Value stored under `key` as an owned claim. `None` for null values and
/// missing keys.
pub fn fetch(hash: ObjPtr, key: &str) -> Option<ObjPtr> {
    let buckets = ivars(hash)
        .buckets
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    buckets
        .get(&string::hash_str(key))?
        .iter()
        .find(|entry| string::equals_str(entry.key, key))?
        .value
        // SAFETY: the hash's claim keeps the value alive under the lock.
        .map(|value| unsafe { inc_refcount(value) })
}

pub fn has_key(hash: ObjPtr, key: &str) -> bool {
    let buckets = ivars(hash)
        .buckets
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    buckets
        .get(&string::hash_str(key))
        .is_some_and(|bucket| bucket.iter().any(|entry| string::equals_str(entry.key, key)))
}

/// Remove `key`, returning its value as an owned claim.
pub fn delete(hash: ObjPtr, key: &str) -> Option<ObjPtr> {
    let removed = {
        let mut buckets = ivars(hash)
            .buckets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let sum = string::hash_str(key);
        let bucket = buckets.get_mut(&sum)?;
        let index = bucket
            .iter()
            .position(|entry| string::equals_str(entry.key, key))?;
        let removed = bucket.swap_remove(index);
        if bucket.is_empty() {
            buckets.remove(&sum);
        }
        removed
    };
    // SAFETY: the hash owned the key claim; the value claim moves to the caller.
    unsafe { dec_refcount(removed.key) };
    removed.value
}

pub fn size(hash: ObjPtr) -> usize {
    ivars(hash)
        .buckets
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .map(Vec::len)
        .sum()
}

/// Every key/value pair, as owned claims, in unspecified order.
pub fn entries(hash: ObjPtr) -> Vec<(ObjPtr, Option<ObjPtr>)> {
    let buckets = ivars(hash)
        .buckets
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    buckets
        .values()
        .flatten()
        // SAFETY: the hash's claims keep keys and values alive under the lock.
        .map(|entry| unsafe {
            (
                inc_refcount(entry.key),
                entry.value.map(|value| inc_refcount(value)),
            )
        })
        .collect()
}
