//! Clownfish Registry crate.
//!
//! Provides [`SnapshotRegistry`], the immutable-snapshot map shared by the
//! class-name registry in `clownfish-core` and the wrap dispatch table in
//! `clownfish`.

mod snapshot;

pub use snapshot::SnapshotRegistry;
