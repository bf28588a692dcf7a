//! The process-scoped engine context: the store handle, the external collaborators,
//! and the memoization caches shared across block constructions.

use crate::{cached::CachedBlock, Block, BlockError, BlockResult, TransactionExecutor};
use alloy_primitives::{hex, B256};
use cinder_primitives::{BlockHeader, Ethash, EthashCacheLru};
use cinder_trie::Db;
use lru::LruCache;
use std::{
    fmt,
    num::NonZeroUsize,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::warn;

/// Number of rehydrated blocks kept alive at once.
const BLOCK_CACHE_ENTRIES: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(n) => n,
    None => unreachable!(),
};

/// The engine context threaded through block construction.
///
/// Owns the shared store handle, the ethash implementation and its cache LRU, the
/// transaction executor driving the replay path, and the LRU of blocks rehydrated from
/// the store. One engine serves one store; blocks over independent stores need
/// independent engines.
pub struct Engine {
    db: Db,
    pow: Arc<dyn Ethash>,
    executor: Arc<dyn TransactionExecutor>,
    pow_caches: EthashCacheLru,
    blocks: Mutex<LruCache<B256, Arc<CachedBlock>>>,
}

impl Engine {
    /// Creates an engine over `db` with the given external collaborators.
    pub fn new(db: Db, pow: Arc<dyn Ethash>, executor: Arc<dyn TransactionExecutor>) -> Self {
        Self {
            db,
            pow,
            executor,
            pow_caches: EthashCacheLru::default(),
            blocks: Mutex::new(LruCache::new(BLOCK_CACHE_ENTRIES)),
        }
    }

    /// The shared store handle.
    pub const fn db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn pow(&self) -> &dyn Ethash {
        self.pow.as_ref()
    }

    pub(crate) const fn pow_caches(&self) -> &EthashCacheLru {
        &self.pow_caches
    }

    pub(crate) fn executor(&self) -> Arc<dyn TransactionExecutor> {
        self.executor.clone()
    }

    /// Loads the block stored under `hash`, memoized in the block LRU.
    ///
    /// Blocks rehydrated from the store are fully revalidated on decode (the
    /// `validated:` sentinel routes them through the trust path) and wrapped in an
    /// immutable [CachedBlock].
    pub fn get_block(&self, hash: B256) -> BlockResult<Arc<CachedBlock>> {
        {
            let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(block) = blocks.get(&hash) {
                return Ok(block.clone());
            }
        }
        let raw = self.db.get(hash.as_slice()).ok_or(BlockError::BlockNotFound(hash))?;
        let block = Block::decode_rlp(self, &raw)?;
        let cached = Arc::new(CachedBlock::new(block)?);
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(hash, cached.clone());
        Ok(cached)
    }

    /// Loads the header of the block stored under `hash`, without transactions or
    /// uncles.
    ///
    /// If the stored header reserializes to bytes whose hash differs from the lookup
    /// key, the key is pinned as canonical and a warning is logged.
    pub fn get_block_header(&self, hash: B256) -> BlockResult<BlockHeader> {
        let raw = self.db.get(hash.as_slice()).ok_or(BlockError::BlockNotFound(hash))?;
        let mut header = Block::header_from_block_rlp(&raw)?;
        if header.hash() != hash {
            warn!(
                target: "block_engine",
                block_hash = %hash,
                "stored header hash is broken; pinning the lookup key",
            );
            header.pin_hash(hash);
        }
        Ok(header)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("pow", &self.pow)
            .field("executor", &self.executor)
            .field("pow_caches", &self.pow_caches)
            .finish_non_exhaustive()
    }
}

/// The store key marking a block hash as fully validated.
pub(crate) fn validated_key(hash: B256) -> Vec<u8> {
    let mut key = b"validated:".to_vec();
    key.extend_from_slice(hash.as_slice());
    key
}

/// The store key holding a block's cumulative chain difficulty.
pub(crate) fn difficulty_key(hash: B256) -> Vec<u8> {
    format!("difficulty:{}", hex::encode(hash)).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{addr, store_block, test_engine, test_genesis};

    #[test]
    fn test_get_block_is_memoized() {
        let (engine, _) = test_engine();
        let mut genesis = test_genesis(&engine, &[(addr(1), 10)]).unwrap();
        let hash = store_block(&mut genesis).unwrap();

        let first = engine.get_block(hash).unwrap();
        let second = engine.get_block(hash).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.hash(), hash);
        assert_eq!(first.number(), 0);
        assert!(first.is_genesis());
    }

    #[test]
    fn test_get_block_miss() {
        let (engine, _) = test_engine();
        let missing = B256::repeat_byte(0x99);
        assert_eq!(engine.get_block(missing).unwrap_err(), crate::BlockError::BlockNotFound(missing));
    }

    #[test]
    fn test_get_block_header_pins_a_broken_lookup_key() {
        let (engine, _) = test_engine();
        let mut genesis = test_genesis(&engine, &[]).unwrap();
        let hash = store_block(&mut genesis).unwrap();

        // Stored under its true hash, the header round-trips unpinned.
        let header = engine.get_block_header(hash).unwrap();
        assert_eq!(header.hash(), hash);
        assert!(header.stored_hash.is_none());

        // Stored under a different key, the key becomes the canonical hash.
        let alias = B256::repeat_byte(0x42);
        let raw = engine.db().get(hash.as_slice()).unwrap();
        engine.db().put(alias.as_slice(), &raw);
        let pinned = engine.get_block_header(alias).unwrap();
        assert_eq!(pinned.hash(), alias);
        assert_eq!(pinned.stored_hash, Some(alias));
    }

    #[test]
    fn test_store_keys_are_prefixed() {
        let hash = B256::repeat_byte(0xcd);
        let validated = validated_key(hash);
        assert!(validated.starts_with(b"validated:"));
        assert_eq!(validated.len(), b"validated:".len() + 32);

        let difficulty = difficulty_key(hash);
        assert!(difficulty.starts_with(b"difficulty:"));
        // hex, not raw bytes, matching the persisted layout
        assert!(difficulty.ends_with(b"cdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd"));
    }
}
