//! The interface to the external ethash implementation, and the memoization of its
//! generated caches.

use alloy_primitives::B256;
use lru::LruCache;
use std::{
    fmt,
    num::NonZeroUsize,
    sync::{Arc, Mutex, PoisonError},
};

/// Number of ethash caches kept alive at once. Epochs are 30000 blocks, so a handful
/// covers validation around the chain head plus deep uncles.
const ETHASH_CACHE_ENTRIES: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

/// The output of one `hashimoto_light` evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowOutput {
    /// The mix digest, which must equal the header's mixhash.
    pub mix_digest: B256,
    /// The result, interpreted as a big-endian integer against the difficulty target.
    pub result: B256,
}

/// The synchronous interface to the ethash proof-of-work function.
pub trait Ethash: fmt::Debug + Send + Sync {
    /// The ethash cache size for the epoch of `number`.
    fn cache_size(&self, number: u64) -> u64;

    /// The full dataset size for the epoch of `number`.
    fn full_size(&self, number: u64) -> u64;

    /// Generates the ethash cache for `seed`, `size` bytes long.
    fn make_cache(&self, size: u64, seed: B256) -> Vec<u8>;

    /// Evaluates the light variant of hashimoto over `cache`.
    fn hashimoto_light(
        &self,
        full_size: u64,
        cache: &[u8],
        header_hash: B256,
        nonce: [u8; 8],
    ) -> PowOutput;
}

/// A process-scoped LRU over generated ethash caches, keyed by `(seed, cache_size)`.
///
/// Cache generation is expensive, so the lock is held across it; a second verifier
/// asking for the same epoch blocks until the first finishes rather than generating a
/// duplicate.
pub struct EthashCacheLru {
    inner: Mutex<LruCache<(B256, u64), Arc<Vec<u8>>>>,
}

impl EthashCacheLru {
    /// Creates an LRU holding `capacity` caches.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { inner: Mutex::new(LruCache::new(capacity)) }
    }

    /// Returns the memoized cache for `(seed, size)`, generating it with `pow` on a
    /// miss.
    pub fn get_or_create<E>(&self, pow: &E, seed: B256, size: u64) -> Arc<Vec<u8>>
    where
        E: Ethash + ?Sized,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cache) = inner.get(&(seed, size)) {
            return cache.clone();
        }
        let cache = Arc::new(pow.make_cache(size, seed));
        inner.put((seed, size), cache.clone());
        cache
    }

    /// The number of caches currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no caches are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EthashCacheLru {
    fn default() -> Self {
        Self::new(ETHASH_CACHE_ENTRIES)
    }
}

impl fmt::Debug for EthashCacheLru {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthashCacheLru").field("len", &self.len()).finish()
    }
}
