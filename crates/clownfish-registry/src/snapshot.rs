//! SnapshotRegistry - copy-on-write map with whole-map publication.
//!
//! # Publication Model
//!
//! Writers serialize on a single mutex. Each write copies the current map,
//! applies its insertions to the copy, and publishes the copy by swapping the
//! shared `Arc`. Readers clone the current `Arc` and then work against that
//! snapshot without holding any lock, so a reader sees either the map from
//! before a write or the map from after it, never a partially updated one.
//!
//! Writes are O(n) in the number of entries. Registries built on this type
//! are populated at startup and when extension modules initialize, and are
//! read on every lookup afterwards.
//!
//! # Example
//!
//! ```
//! use clownfish_registry::SnapshotRegistry;
//!
//! let registry: SnapshotRegistry<&str, u32> = SnapshotRegistry::new();
//! assert!(registry.register("Obj", 1));
//! assert!(!registry.register("Obj", 2));
//!
//! let before = registry.snapshot();
//! registry.insert("Obj", 3);
//!
//! assert_eq!(before.get("Obj"), Some(&1));
//! assert_eq!(registry.get(&"Obj"), Some(3));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rustc_hash::FxHashMap;

/// Map published as immutable snapshots.
pub struct SnapshotRegistry<K, V> {
    /// Serializes copy/insert/publish.
    writer: Mutex<()>,
    /// The most recently published complete map.
    current: RwLock<Arc<FxHashMap<K, V>>>,
}

impl<K, V> SnapshotRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(FxHashMap::default())),
        }
    }

    /// The current complete map.
    ///
    /// The returned snapshot never changes, even if writers publish newer
    /// maps while it is held.
    pub fn snapshot(&self) -> Arc<FxHashMap<K, V>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up a single entry in the current snapshot.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.snapshot().get(key).cloned()
    }

    /// Whether `key` is present in the current snapshot.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.snapshot().contains_key(key)
    }

    /// Number of entries in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Insert `value` under `key` only if `key` is absent.
    ///
    /// Returns `true` if the entry was added. An existing entry is left
    /// untouched and nothing is published.
    pub fn register(&self, key: K, value: V) -> bool {
        self.update(|map| {
            if map.contains_key(&key) {
                return false;
            }
            map.insert(key, value);
            true
        })
    }

    /// Insert `value` under `key`, replacing any existing entry.
    ///
    /// Returns the replaced value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.update(|map| map.insert(key, value))
    }

    /// Insert every entry of `entries` under a single publication.
    ///
    /// Later entries replace earlier ones with the same key. Returns the
    /// number of keys that were not present before.
    pub fn insert_all<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.update(|map| {
            let mut added = 0;
            for (key, value) in entries {
                if map.insert(key, value).is_none() {
                    added += 1;
                }
            }
            added
        })
    }

    /// Fetch the entry for `key`, creating it with `make` if absent.
    ///
    /// `make` runs at most once and only while the writer lock is held, so
    /// two racing callers always get back the same value.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        if let Some(existing) = self.get(&key) {
            return existing;
        }
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        if let Some(existing) = current.get(&key) {
            return existing.clone();
        }
        let value = make();
        let mut next = (*current).clone();
        next.insert(key, value.clone());
        self.publish(next);
        value
    }

    fn update<R>(&self, apply: impl FnOnce(&mut FxHashMap<K, V>) -> R) -> R {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (*self.snapshot()).clone();
        let result = apply(&mut next);
        self.publish(next);
        result
    }

    fn publish(&self, next: FxHashMap<K, V>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
    }
}

impl<K, V> Default for SnapshotRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for SnapshotRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotRegistry")
            .field("len", &self.len())
            .finish()
    }
}
