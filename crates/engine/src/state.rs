//! The per-block account cache, its journal, and execution snapshots.
//!
//! The cache is a write-through scratchpad over the state trie, partitioned into one
//! map per account field plus one storage map per touched address. Every
//! distinct-valued write appends a journal entry recording the previous value, so a
//! partially-executed transaction can be unwound in LIFO order without touching the
//! trie.

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The journaling cache over account fields and storage slots.
///
/// Entries appear in a field map either because a read populated them (not journaled)
/// or because a write changed them (journaled). `touched` records every address with a
/// cached mutation and drives commit ordering.
#[derive(Debug, Default, Clone)]
pub(crate) struct StateCache {
    pub(crate) balance: HashMap<Address, U256>,
    pub(crate) nonce: HashMap<Address, U256>,
    pub(crate) code: HashMap<Address, Bytes>,
    pub(crate) storage_root: HashMap<Address, B256>,
    pub(crate) storage: HashMap<Address, BTreeMap<U256, U256>>,
    pub(crate) touched: BTreeSet<Address>,
}

impl StateCache {
    pub(crate) fn clear(&mut self) {
        self.balance.clear();
        self.nonce.clear();
        self.code.clear();
        self.storage_root.clear();
        self.storage.clear();
        self.touched.clear();
    }
}

/// One undo record. `prev` of [None] means the cache had no entry before the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JournalEntry {
    Balance { address: Address, prev: Option<U256> },
    Nonce { address: Address, prev: Option<U256> },
    Code { address: Address, prev: Option<Bytes> },
    StorageRoot { address: Address, prev: Option<B256> },
    Storage { address: Address, index: U256, prev: Option<U256> },
    Touched { address: Address },
}

impl JournalEntry {
    /// Restores the cache entry this record shadows.
    pub(crate) fn undo(self, cache: &mut StateCache) {
        match self {
            Self::Balance { address, prev } => restore(&mut cache.balance, address, prev),
            Self::Nonce { address, prev } => restore(&mut cache.nonce, address, prev),
            Self::Code { address, prev } => restore(&mut cache.code, address, prev),
            Self::StorageRoot { address, prev } => {
                restore(&mut cache.storage_root, address, prev)
            }
            Self::Storage { address, index, prev } => {
                if let Some(slots) = cache.storage.get_mut(&address) {
                    match prev {
                        Some(value) => slots.insert(index, value),
                        None => slots.remove(&index),
                    };
                }
            }
            Self::Touched { address } => {
                cache.touched.remove(&address);
            }
        }
    }
}

fn restore<V>(map: &mut HashMap<Address, V>, address: Address, prev: Option<V>) {
    match prev {
        Some(value) => {
            map.insert(address, value);
        }
        None => {
            map.remove(&address);
        }
    }
}

/// Journals and applies a write to a field map. A write of the currently-cached value
/// is a no-op.
pub(crate) fn set_and_journal<V, F>(
    map: &mut HashMap<Address, V>,
    journal: &mut Vec<JournalEntry>,
    address: Address,
    value: V,
    entry: F,
) where
    V: PartialEq,
    F: FnOnce(Option<V>) -> JournalEntry,
{
    match map.get(&address) {
        Some(current) if *current == value => {}
        _ => {
            let prev = map.insert(address, value);
            journal.push(entry(prev));
        }
    }
}

/// Journals and applies a write to one address's storage map, with the same
/// no-op-on-equal rule as [set_and_journal].
pub(crate) fn set_and_journal_slot(
    slots: &mut BTreeMap<U256, U256>,
    journal: &mut Vec<JournalEntry>,
    address: Address,
    index: U256,
    value: U256,
) {
    match slots.get(&index) {
        Some(current) if *current == value => {}
        _ => {
            let prev = slots.insert(index, value);
            journal.push(JournalEntry::Storage { address, index, prev });
        }
    }
}

/// `current + delta`, or [None] if the result would be negative. Wraps modulo 2^256.
pub(crate) fn apply_delta(current: U256, delta: I256) -> Option<U256> {
    let magnitude = delta.unsigned_abs();
    if delta.is_negative() {
        (magnitude <= current).then(|| current - magnitude)
    } else {
        Some(current.wrapping_add(magnitude))
    }
}

/// An opaque record of a block's execution state, used with [Block::revert] to unwind
/// everything a partial execution changed.
///
/// [Block::revert]: crate::Block::revert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) journal_len: usize,
    pub(crate) suicides_len: usize,
    pub(crate) logs_len: usize,
    pub(crate) refunds: u64,
    pub(crate) gas_used: u64,
    pub(crate) ether_delta: i128,
    pub(crate) transactions_root: B256,
    pub(crate) receipts_root: B256,
    pub(crate) transaction_count: u64,
    pub(crate) state_root: B256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta() {
        assert_eq!(apply_delta(U256::from(100), I256::unchecked_from(-60)), Some(U256::from(40)));
        assert_eq!(apply_delta(U256::from(100), I256::unchecked_from(-101)), None);
        assert_eq!(apply_delta(U256::from(100), I256::unchecked_from(-100)), Some(U256::ZERO));
        assert_eq!(apply_delta(U256::ZERO, I256::ONE), Some(U256::ONE));
        // additions wrap modulo 2^256
        assert_eq!(apply_delta(U256::MAX, I256::ONE), Some(U256::ZERO));
    }

    #[test]
    fn test_set_and_journal_skips_equal_values() {
        let mut map = HashMap::new();
        let mut journal = Vec::new();
        let address = Address::repeat_byte(1);

        set_and_journal(&mut map, &mut journal, address, U256::from(7), |prev| {
            JournalEntry::Balance { address, prev }
        });
        set_and_journal(&mut map, &mut journal, address, U256::from(7), |prev| {
            JournalEntry::Balance { address, prev }
        });
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0], JournalEntry::Balance { address, prev: None });

        set_and_journal(&mut map, &mut journal, address, U256::from(9), |prev| {
            JournalEntry::Balance { address, prev }
        });
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[1], JournalEntry::Balance { address, prev: Some(U256::from(7)) });
    }

    #[test]
    fn test_undo_restores_absent_entries() {
        let mut cache = StateCache::default();
        let address = Address::repeat_byte(2);
        cache.balance.insert(address, U256::from(5));

        JournalEntry::Balance { address, prev: None }.undo(&mut cache);
        assert!(!cache.balance.contains_key(&address));

        cache.touched.insert(address);
        JournalEntry::Touched { address }.undo(&mut cache);
        assert!(cache.touched.is_empty());
    }
}
