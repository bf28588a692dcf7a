//! The [Trie] and [SecureTrie] views over a [Db].
//!
//! A [Trie] keeps its live entries in memory and commits to them with a Merkle-Patricia
//! root hash built by [HashBuilder]. Whenever a root is produced, the full entry set is
//! persisted in the store under that root, so any root a trie has ever reported can be
//! reopened later. Partially-built state left behind by a discarded block is harmless
//! for the same reason: snapshots are addressed by their own commitment.

use crate::{Db, TrieError, TrieResult};
use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::Decodable;
use alloy_trie::{HashBuilder, Nibbles};
use std::collections::BTreeMap;

pub use alloy_trie::EMPTY_ROOT_HASH;

/// A mutable, authenticated view over a set of key-value entries.
///
/// Keys index the trie raw; see [SecureTrie] for the keccak-keyed variant used for
/// account state and storage.
#[derive(Debug, Clone)]
pub struct Trie {
    db: Db,
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    root: B256,
    dirty: bool,
}

impl Trie {
    /// Creates an empty trie over `db`.
    pub fn empty(db: Db) -> Self {
        Self { db, data: BTreeMap::new(), root: EMPTY_ROOT_HASH, dirty: false }
    }

    /// Opens the trie persisted under `root`.
    ///
    /// ## Returns
    /// - `Ok(Trie)`: The trie with the entries committed to by `root`.
    /// - `Err(_)`: If `root` has no snapshot in the store or the snapshot is corrupt.
    pub fn new(db: Db, root: B256) -> TrieResult<Self> {
        if root == EMPTY_ROOT_HASH || root == B256::ZERO {
            return Ok(Self::empty(db));
        }
        let blob = db.get(root.as_slice()).ok_or(TrieError::RootNotFound(root))?;
        let items = Vec::<Bytes>::decode(&mut blob.as_slice())?;
        if items.len() % 2 != 0 {
            return Err(TrieError::CorruptSnapshot);
        }
        let data = items
            .chunks_exact(2)
            .map(|pair| (pair[0].to_vec(), pair[1].to_vec()))
            .collect::<BTreeMap<_, _>>();
        Ok(Self { db, data, root, dirty: false })
    }

    /// Fetches the value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Inserts or replaces the value stored under `key`.
    pub fn update(&mut self, key: &[u8], value: Vec<u8>) {
        self.data.insert(key.to_vec(), value);
        self.dirty = true;
    }

    /// Removes the value stored under `key`, if present.
    pub fn delete(&mut self, key: &[u8]) {
        if self.data.remove(key).is_some() {
            self.dirty = true;
        }
    }

    /// Computes the root hash of the current entries, persisting a snapshot under it.
    pub fn root_hash(&mut self) -> B256 {
        if self.dirty {
            self.root = self.compute_root();
            if !self.data.is_empty() {
                self.db.put(self.root.as_slice(), &self.snapshot_blob());
            }
            self.dirty = false;
        }
        self.root
    }

    /// Returns `true` if the current root's snapshot is present in the store.
    pub fn root_hash_valid(&mut self) -> bool {
        let root = self.root_hash();
        root == EMPTY_ROOT_HASH || self.db.contains(root.as_slice())
    }

    /// Returns a copy of the full entry set.
    pub fn to_dict(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.data.clone()
    }

    /// The number of entries in the trie.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the trie holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The shared store handle this trie persists into.
    pub const fn db(&self) -> &Db {
        &self.db
    }

    fn compute_root(&self) -> B256 {
        if self.data.is_empty() {
            return EMPTY_ROOT_HASH;
        }
        // BTreeMap iterates keys in byte-lexicographic order, which coincides with the
        // nibble order HashBuilder requires.
        let mut hb = HashBuilder::default();
        for (key, value) in &self.data {
            hb.add_leaf(Nibbles::unpack(key), value);
        }
        hb.root()
    }

    fn snapshot_blob(&self) -> Vec<u8> {
        let items = self
            .data
            .iter()
            .flat_map(|(k, v)| {
                [Bytes::copy_from_slice(k), Bytes::copy_from_slice(v)]
            })
            .collect::<Vec<_>>();
        alloy_rlp::encode(&items)
    }
}

/// A [Trie] that hashes keys with keccak-256 before indexing, as the account state and
/// storage tries do.
#[derive(Debug, Clone)]
pub struct SecureTrie(Trie);

impl SecureTrie {
    /// Creates an empty secure trie over `db`.
    pub fn empty(db: Db) -> Self {
        Self(Trie::empty(db))
    }

    /// Opens the secure trie persisted under `root`.
    pub fn new(db: Db, root: B256) -> TrieResult<Self> {
        Trie::new(db, root).map(Self)
    }

    /// Fetches the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.0.get(keccak256(key).as_slice())
    }

    /// Inserts or replaces the value stored under `key`.
    pub fn update(&mut self, key: &[u8], value: Vec<u8>) {
        self.0.update(keccak256(key).as_slice(), value)
    }

    /// Removes the value stored under `key`, if present.
    pub fn delete(&mut self, key: &[u8]) {
        self.0.delete(keccak256(key).as_slice())
    }

    /// Computes the root hash of the current entries, persisting a snapshot under it.
    pub fn root_hash(&mut self) -> B256 {
        self.0.root_hash()
    }

    /// Returns `true` if the current root's snapshot is present in the store.
    pub fn root_hash_valid(&mut self) -> bool {
        self.0.root_hash_valid()
    }

    /// Returns a copy of the full entry set, keyed by hashed key.
    pub fn to_dict(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.0.to_dict()
    }

    /// The number of entries in the trie.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the trie holds no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The shared store handle this trie persists into.
    pub const fn db(&self) -> &Db {
        self.0.db()
    }
}
