//! The [KeyValueStore] trait and the shared [Db] handle passed throughout the engine.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

/// The synchronous interface to the authenticated key-value store backing tries, account
/// code blobs, and validation sentinels.
///
/// Implementations must support arbitrary byte keys and values. Retrieved values are
/// treated as immutable by all readers.
pub trait KeyValueStore: fmt::Debug + Send + Sync {
    /// Fetches the value stored under `key`, or [None] on a miss.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]);

    /// Returns `true` if `key` is present in the store.
    fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Flushes pending writes for durability. In-memory stores treat this as a no-op.
    fn commit(&self);
}

/// A cheaply clonable handle to a [KeyValueStore].
///
/// Blocks, tries, and accounts all share one handle; two handles are considered equal
/// iff they point at the same underlying store, which is the identity check used when a
/// parent block is supplied during construction.
#[derive(Clone, Debug)]
pub struct Db(Arc<dyn KeyValueStore>);

impl Db {
    /// Wraps an existing store in a handle.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self(store)
    }

    /// Creates a handle over a fresh [MemoryDb].
    pub fn memory() -> Self {
        Self(Arc::new(MemoryDb::default()))
    }

    /// Fetches the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.get(key)
    }

    /// Stores `value` under `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) {
        self.0.put(key, value)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.0.contains(key)
    }

    /// Flushes the underlying store.
    pub fn commit(&self) {
        self.0.commit()
    }
}

impl PartialEq for Db {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Db {}

/// An in-memory [KeyValueStore] used for tests and ephemeral chains.
#[derive(Debug, Default)]
pub struct MemoryDb {
    inner: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl KeyValueStore for MemoryDb {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn put(&self, key: &[u8], value: &[u8]) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_vec(), value.to_vec());
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }

    fn commit(&self) {}
}
