//! The 256-bit log bloom filter.
//!
//! Each bloomable byte string sets three bits of the filter, derived from byte pairs of
//! its keccak-256 hash. Blooms OR together, so a block's bloom is the union of its
//! receipts' blooms.

use alloy_primitives::{keccak256, Log, U256};

/// Inserts one bloomable byte string into `bloom`.
pub fn bloom_insert(bloom: U256, value: &[u8]) -> U256 {
    let hash = keccak256(value);
    let mut out = bloom;
    for i in [0usize, 10, 20] {
        let bit = (((hash[i] as usize) << 8) | hash[i + 1] as usize) % 256;
        out |= U256::ONE << bit;
    }
    out
}

/// Folds a list of bloomable byte strings into a single bloom.
pub fn bloom_from_list<I, T>(items: I) -> U256
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    items.into_iter().fold(U256::ZERO, |bloom, item| bloom_insert(bloom, item.as_ref()))
}

/// The bloomable byte strings of a log: its address and each of its topics.
pub fn bloomables(log: &Log) -> Vec<Vec<u8>> {
    let mut out = Vec::with_capacity(1 + log.data.topics().len());
    out.push(log.address.to_vec());
    out.extend(log.data.topics().iter().map(|topic| topic.to_vec()));
    out
}

/// The bloom of a set of logs.
pub fn logs_bloom<'a, I>(logs: I) -> U256
where
    I: IntoIterator<Item = &'a Log>,
{
    logs.into_iter().fold(U256::ZERO, |bloom, log| {
        bloomables(log).iter().fold(bloom, |bloom, item| bloom_insert(bloom, item))
    })
}
