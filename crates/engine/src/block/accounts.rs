//! Account-state operations on a live [Block]: the executor-facing surface over the
//! journaled cache, and the snapshot/revert/commit machinery behind it.

use super::Block;
use crate::{
    state::{apply_delta, set_and_journal, set_and_journal_slot, JournalEntry},
    BlockError, BlockResult, Snapshot,
};
use alloy_primitives::{Address, Bytes, Log, B256, I256, U256};
use alloy_rlp::Decodable;
use cinder_primitives::{codec::storage_key, Account};
use cinder_trie::{SecureTrie, Trie, EMPTY_ROOT_HASH};
use tracing::trace;

impl Block {
    /// Loads an account from the state trie, bypassing the cache. Missing accounts
    /// come back blank.
    pub(crate) fn get_acct(&self, address: &Address) -> BlockResult<Account> {
        match self.state.get(address.as_slice()) {
            Some(encoded) => {
                Account::decode(&mut &encoded[..], self.db.clone()).map_err(BlockError::from)
            }
            None => Ok(Account::blank(self.db.clone())),
        }
    }

    fn touch(&mut self, address: Address) {
        if self.cache.touched.insert(address) {
            self.journal.push(JournalEntry::Touched { address });
        }
    }

    /// The balance of an account.
    pub fn get_balance(&mut self, address: Address) -> BlockResult<U256> {
        if let Some(balance) = self.cache.balance.get(&address) {
            return Ok(*balance);
        }
        let balance = self.get_acct(&address)?.balance;
        self.cache.balance.insert(address, balance);
        Ok(balance)
    }

    /// Sets the balance of an account.
    pub fn set_balance(&mut self, address: Address, value: U256) {
        set_and_journal(&mut self.cache.balance, &mut self.journal, address, value, |prev| {
            JournalEntry::Balance { address, prev }
        });
        self.touch(address);
    }

    /// Adds `delta` to an account's balance, wrapping modulo 2^256.
    ///
    /// ## Returns
    /// - `Ok(false)`: The result would have been negative; nothing was changed.
    /// - `Ok(true)`: The balance was updated.
    pub fn delta_balance(&mut self, address: Address, delta: I256) -> BlockResult<bool> {
        let current = self.get_balance(address)?;
        match apply_delta(current, delta) {
            Some(value) => {
                self.set_balance(address, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Transfers `value` from one account balance to another.
    ///
    /// ## Returns
    /// - `Ok(false)`: The sender cannot cover `value`; nothing was changed.
    /// - `Ok(true)`: Both balances were updated.
    pub fn transfer_value(
        &mut self,
        from_addr: Address,
        to_addr: Address,
        value: U256,
    ) -> BlockResult<bool> {
        let Ok(value) = I256::try_from(value) else { return Ok(false) };
        if self.delta_balance(from_addr, -value)? {
            self.delta_balance(to_addr, value)
        } else {
            Ok(false)
        }
    }

    /// The nonce of an account.
    pub fn get_nonce(&mut self, address: Address) -> BlockResult<U256> {
        if let Some(nonce) = self.cache.nonce.get(&address) {
            return Ok(*nonce);
        }
        let nonce = self.get_acct(&address)?.nonce;
        self.cache.nonce.insert(address, nonce);
        Ok(nonce)
    }

    /// Sets the nonce of an account.
    pub fn set_nonce(&mut self, address: Address, value: U256) {
        set_and_journal(&mut self.cache.nonce, &mut self.journal, address, value, |prev| {
            JournalEntry::Nonce { address, prev }
        });
        self.touch(address);
    }

    /// Increments the nonce of an account.
    pub fn increment_nonce(&mut self, address: Address) -> BlockResult<bool> {
        self.delta_nonce(address, I256::ONE)
    }

    /// Decrements the nonce of an account. Fails on a zero nonce.
    pub fn decrement_nonce(&mut self, address: Address) -> BlockResult<bool> {
        self.delta_nonce(address, I256::MINUS_ONE)
    }

    fn delta_nonce(&mut self, address: Address, delta: I256) -> BlockResult<bool> {
        let current = self.get_nonce(address)?;
        match apply_delta(current, delta) {
            Some(value) => {
                self.set_nonce(address, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The code of an account.
    pub fn get_code(&mut self, address: Address) -> BlockResult<Bytes> {
        if let Some(code) = self.cache.code.get(&address) {
            return Ok(code.clone());
        }
        let code = self.get_acct(&address)?.code();
        self.cache.code.insert(address, code.clone());
        Ok(code)
    }

    /// Sets the code of an account. The blob is written to the store at commit.
    pub fn set_code(&mut self, address: Address, value: Bytes) {
        set_and_journal(&mut self.cache.code, &mut self.journal, address, value, |prev| {
            JournalEntry::Code { address, prev }
        });
        self.touch(address);
    }

    fn storage_root_of(&mut self, address: Address) -> BlockResult<B256> {
        if let Some(root) = self.cache.storage_root.get(&address) {
            return Ok(*root);
        }
        let root = self.get_acct(&address)?.storage_root;
        self.cache.storage_root.insert(address, root);
        Ok(root)
    }

    fn set_storage_root(&mut self, address: Address, value: B256) {
        set_and_journal(&mut self.cache.storage_root, &mut self.journal, address, value, |prev| {
            JournalEntry::StorageRoot { address, prev }
        });
        self.touch(address);
    }

    /// The trie holding an account's storage, at its last committed root.
    pub fn get_storage(&mut self, address: Address) -> BlockResult<SecureTrie> {
        let root = self.storage_root_of(address)?;
        SecureTrie::new(self.db.clone(), root).map_err(BlockError::from)
    }

    /// A storage slot of an account. Unset slots read as zero.
    pub fn get_storage_data(&mut self, address: Address, index: U256) -> BlockResult<U256> {
        if let Some(value) = self.cache.storage.get(&address).and_then(|slots| slots.get(&index)) {
            return Ok(*value);
        }
        let storage = self.get_storage(address)?;
        match storage.get(&storage_key(index)) {
            Some(encoded) => {
                U256::decode(&mut &encoded[..]).map_err(BlockError::from)
            }
            None => Ok(U256::ZERO),
        }
    }

    /// Sets a storage slot of an account. Zero-valued slots are pruned from the trie
    /// at commit.
    pub fn set_storage_data(&mut self, address: Address, index: U256, value: U256) {
        if !self.cache.storage.contains_key(&address) {
            self.cache.storage.insert(address, Default::default());
            self.touch(address);
        }
        let slots = self
            .cache
            .storage
            .entry(address)
            .or_default();
        set_and_journal_slot(slots, &mut self.journal, address, index, value);
    }

    /// Resets an account's storage to the empty trie, zeroing every cached slot.
    pub fn reset_storage(&mut self, address: Address) {
        self.set_storage_root(address, EMPTY_ROOT_HASH);
        if let Some(slots) = self.cache.storage.get(&address) {
            let indices = slots.keys().copied().collect::<Vec<_>>();
            for index in indices {
                self.set_storage_data(address, index, U256::ZERO);
            }
        }
    }

    /// Whether an account exists in the state trie or has been touched in this block.
    pub fn account_exists(&mut self, address: Address) -> bool {
        self.state.get(address.as_slice()).map(|data| !data.is_empty()).unwrap_or_default() ||
            self.cache.touched.contains(&address)
    }

    /// Deletes an account from the state trie. Pending cache changes are committed
    /// first.
    pub fn del_account(&mut self, address: Address) -> BlockResult<()> {
        self.commit_state()?;
        self.state.delete(address.as_slice());
        Ok(())
    }

    /// Appends a log to the block's per-transaction log buffer.
    pub fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Clears the per-transaction log buffer; called by the executor at the start of
    /// each transaction.
    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    /// The current per-transaction log buffer.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Records an account scheduled for deletion at the end of the transaction.
    pub fn add_suicide(&mut self, address: Address) {
        self.suicides.push(address);
    }

    /// The accounts scheduled for deletion.
    pub fn suicides(&self) -> &[Address] {
        &self.suicides
    }

    /// Accrues gas refunds granted during execution.
    pub fn add_refund(&mut self, gas: u64) {
        self.refunds += gas;
    }

    /// The gas refunds accrued so far.
    pub const fn refunds(&self) -> u64 {
        self.refunds
    }

    /// Accrues gas spent by an executed transaction.
    pub fn add_gas_used(&mut self, gas: u64) {
        self.gas_used += gas;
    }

    /// Accrues ether created (positive) or destroyed (negative) in this block.
    pub fn add_ether_delta(&mut self, delta: i128) {
        self.ether_delta += delta;
    }

    /// Net ether created or destroyed in this block so far.
    pub const fn ether_delta(&self) -> i128 {
        self.ether_delta
    }

    /// Captures the block's execution state for a later [Self::revert].
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot {
            journal_len: self.journal.len(),
            suicides_len: self.suicides.len(),
            logs_len: self.logs.len(),
            refunds: self.refunds,
            gas_used: self.gas_used,
            ether_delta: self.ether_delta,
            transactions_root: self.transactions.root_hash(),
            receipts_root: self.receipts.root_hash(),
            transaction_count: self.transaction_count,
            state_root: self.state.root_hash(),
        }
    }

    /// Reverts to a previously captured [Snapshot], undoing journal entries in LIFO
    /// order and restoring every counter and trie root recorded in it.
    pub fn revert(&mut self, snapshot: &Snapshot) -> BlockResult<()> {
        trace!(target: "block_state", to_journal_len = snapshot.journal_len, "reverting");
        while self.journal.len() > snapshot.journal_len {
            if let Some(entry) = self.journal.pop() {
                entry.undo(&mut self.cache);
            }
        }
        self.suicides.truncate(snapshot.suicides_len);
        self.logs.truncate(snapshot.logs_len);
        self.refunds = snapshot.refunds;
        self.gas_used = snapshot.gas_used;
        self.ether_delta = snapshot.ether_delta;
        self.transactions = Trie::new(self.db.clone(), snapshot.transactions_root)?;
        self.receipts = Trie::new(self.db.clone(), snapshot.receipts_root)?;
        self.transaction_count = snapshot.transaction_count;
        self.state = SecureTrie::new(self.db.clone(), snapshot.state_root)?;
        Ok(())
    }

    /// Writes the account caches into the state trie and clears the cache and journal.
    ///
    /// Touched addresses are committed in ascending address order so the change log is
    /// deterministic; the trie itself is order-independent. A commit with an empty
    /// journal is a no-op, which also makes commits idempotent.
    pub fn commit_state(&mut self) -> BlockResult<()> {
        if self.journal.is_empty() {
            return Ok(());
        }
        let mut changes = 0usize;
        let addresses = self.cache.touched.iter().copied().collect::<Vec<_>>();
        for address in addresses {
            let mut account = self.get_acct(&address)?;
            if let Some(balance) = self.cache.balance.get(&address) {
                account.balance = *balance;
                changes += 1;
            }
            if let Some(nonce) = self.cache.nonce.get(&address) {
                account.nonce = *nonce;
                changes += 1;
            }
            if let Some(code) = self.cache.code.get(&address) {
                account.set_code(code.clone());
                changes += 1;
            }
            if let Some(root) = self.cache.storage_root.get(&address) {
                account.storage_root = *root;
                changes += 1;
            }

            let mut storage = SecureTrie::new(self.db.clone(), account.storage_root)?;
            if let Some(slots) = self.cache.storage.get(&address) {
                for (index, value) in slots {
                    let key = storage_key(*index);
                    if value.is_zero() {
                        storage.delete(&key);
                    } else {
                        storage.update(&key, alloy_rlp::encode(value));
                    }
                    changes += 1;
                }
            }
            account.storage_root = storage.root_hash();
            self.state.update(address.as_slice(), alloy_rlp::encode(&account));
        }
        trace!(target: "block_state", changes, "committed account caches");
        self.reset_cache();
        Ok(())
    }

    /// Drops the cache and journal without committing anything.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
        self.journal.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{addr, test_engine, test_genesis};
    use alloy_primitives::{Bytes, I256, U256};
    use cinder_trie::EMPTY_ROOT_HASH;
    use proptest::prelude::*;

    #[test]
    fn test_transfer_snapshot_revert() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[(addr(0xa), 100), (addr(0xb), 0)]).unwrap();

        let snapshot = block.snapshot();
        assert!(block.transfer_value(addr(0xa), addr(0xb), U256::from(60)).unwrap());
        assert_eq!(block.get_balance(addr(0xa)).unwrap(), U256::from(40));
        assert_eq!(block.get_balance(addr(0xb)).unwrap(), U256::from(60));

        block.revert(&snapshot).unwrap();
        assert_eq!(block.get_balance(addr(0xa)).unwrap(), U256::from(100));
        assert_eq!(block.get_balance(addr(0xb)).unwrap(), U256::from(0));
        assert_eq!(block.journal.len(), snapshot.journal_len);
    }

    #[test]
    fn test_delta_below_zero_leaves_balance_untouched() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[(addr(1), 100)]).unwrap();

        assert!(!block.delta_balance(addr(1), I256::unchecked_from(-101)).unwrap());
        assert_eq!(block.get_balance(addr(1)).unwrap(), U256::from(100));
        assert!(block.journal.is_empty());

        assert!(block.delta_balance(addr(1), I256::unchecked_from(-100)).unwrap());
        assert_eq!(block.get_balance(addr(1)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[(addr(1), 10)]).unwrap();
        assert!(!block.transfer_value(addr(1), addr(2), U256::from(11)).unwrap());
        assert_eq!(block.get_balance(addr(1)).unwrap(), U256::from(10));
        assert_eq!(block.get_balance(addr(2)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_nonce_round_trip() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[]).unwrap();
        assert_eq!(block.get_nonce(addr(3)).unwrap(), U256::ZERO);
        assert!(block.increment_nonce(addr(3)).unwrap());
        assert!(block.increment_nonce(addr(3)).unwrap());
        assert!(block.decrement_nonce(addr(3)).unwrap());
        assert_eq!(block.get_nonce(addr(3)).unwrap(), U256::ONE);
        // a zero nonce cannot go negative
        assert!(block.decrement_nonce(addr(3)).unwrap());
        assert!(!block.decrement_nonce(addr(3)).unwrap());
    }

    #[test]
    fn test_zero_storage_values_are_pruned_on_commit() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[]).unwrap();
        let owner = addr(7);

        block.set_storage_data(owner, U256::from(1), U256::from(42));
        block.commit_state().unwrap();
        let storage = block.get_storage(owner).unwrap();
        assert_eq!(storage.len(), 1);

        block.set_storage_data(owner, U256::from(1), U256::ZERO);
        block.commit_state().unwrap();
        let storage = block.get_storage(owner).unwrap();
        assert!(storage.is_empty());
        assert_eq!(block.get_storage_data(owner, U256::from(1)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_reset_storage() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[]).unwrap();
        let owner = addr(9);

        block.set_storage_data(owner, U256::from(1), U256::from(10));
        block.commit_state().unwrap();
        block.set_storage_data(owner, U256::from(2), U256::from(20));
        block.reset_storage(owner);
        block.commit_state().unwrap();

        let mut storage = block.get_storage(owner).unwrap();
        assert_eq!(storage.root_hash(), EMPTY_ROOT_HASH);
        assert_eq!(block.get_storage_data(owner, U256::from(1)).unwrap(), U256::ZERO);
        assert_eq!(block.get_storage_data(owner, U256::from(2)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_commit_is_idempotent() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[(addr(1), 50)]).unwrap();
        block.set_balance(addr(1), U256::from(75));
        block.commit_state().unwrap();
        let root = block.state_root().unwrap();

        block.commit_state().unwrap();
        assert_eq!(block.state_root().unwrap(), root);
        assert!(block.journal.is_empty());
    }

    #[test]
    fn test_code_round_trip() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[]).unwrap();
        let code = Bytes::from_static(&[0x60, 0x60, 0x52]);

        block.set_code(addr(4), code.clone());
        assert_eq!(block.get_code(addr(4)).unwrap(), code);
        block.commit_state().unwrap();
        assert_eq!(block.get_code(addr(4)).unwrap(), code);
        assert_eq!(block.get_acct(&addr(4)).unwrap().code(), code);
    }

    #[test]
    fn test_account_exists_and_delete() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[(addr(1), 5)]).unwrap();
        assert!(block.account_exists(addr(1)));
        assert!(!block.account_exists(addr(2)));

        // touched but uncommitted accounts exist too
        block.set_balance(addr(2), U256::from(1));
        assert!(block.account_exists(addr(2)));

        block.del_account(addr(1)).unwrap();
        assert!(!block.account_exists(addr(1)));
        assert_eq!(block.get_balance(addr(1)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_suicides_logs_and_refunds_revert() {
        let (engine, _) = test_engine();
        let mut block = test_genesis(&engine, &[]).unwrap();
        block.add_refund(5);
        let snapshot = block.snapshot();

        block.add_suicide(addr(1));
        block.add_refund(10);
        block.add_ether_delta(-3);
        assert_eq!(block.suicides().len(), 1);
        assert_eq!(block.refunds(), 15);

        block.revert(&snapshot).unwrap();
        assert!(block.suicides().is_empty());
        assert_eq!(block.refunds(), 5);
        assert_eq!(block.ether_delta(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        SetBalance(u8, u64),
        DeltaBalance(u8, i64),
        SetNonce(u8, u64),
        IncrementNonce(u8),
        SetStorage(u8, u8, u64),
        ResetStorage(u8),
        SetCode(u8, u8),
        Transfer(u8, u8, u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3u8, any::<u64>()).prop_map(|(a, v)| Op::SetBalance(a, v)),
            (0..3u8, any::<i64>()).prop_map(|(a, v)| Op::DeltaBalance(a, v)),
            (0..3u8, any::<u64>()).prop_map(|(a, v)| Op::SetNonce(a, v)),
            (0..3u8).prop_map(Op::IncrementNonce),
            (0..3u8, 0..4u8, any::<u64>()).prop_map(|(a, k, v)| Op::SetStorage(a, k, v)),
            (0..3u8).prop_map(Op::ResetStorage),
            (0..3u8, any::<u8>()).prop_map(|(a, b)| Op::SetCode(a, b)),
            (0..3u8, 0..3u8, 0..2_000u64).prop_map(|(a, b, v)| Op::Transfer(a, b, v)),
        ]
    }

    proptest! {
        /// For any sequence of cache mutations after a snapshot, revert restores every
        /// observable account value and every counter.
        #[test]
        fn test_journal_revert_is_exact(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let (engine, _) = test_engine();
            let mut block = test_genesis(
                &engine,
                &[(addr(0), 1_000), (addr(1), 1_000), (addr(2), 1_000)],
            ).unwrap();

            // Warm the cache so every later read hits entries captured by the journal.
            let mut observed = Vec::new();
            for a in 0..3u8 {
                observed.push((
                    block.get_balance(addr(a)).unwrap(),
                    block.get_nonce(addr(a)).unwrap(),
                    block.get_code(addr(a)).unwrap(),
                    (0..4u8)
                        .map(|k| block.get_storage_data(addr(a), U256::from(k)).unwrap())
                        .collect::<Vec<_>>(),
                ));
            }
            let snapshot = block.snapshot();

            for op in &ops {
                match *op {
                    Op::SetBalance(a, v) => block.set_balance(addr(a), U256::from(v)),
                    Op::DeltaBalance(a, v) => {
                        let _ = block.delta_balance(addr(a), I256::unchecked_from(v)).unwrap();
                    }
                    Op::SetNonce(a, v) => block.set_nonce(addr(a), U256::from(v)),
                    Op::IncrementNonce(a) => {
                        let _ = block.increment_nonce(addr(a)).unwrap();
                    }
                    Op::SetStorage(a, k, v) => {
                        block.set_storage_data(addr(a), U256::from(k), U256::from(v))
                    }
                    Op::ResetStorage(a) => block.reset_storage(addr(a)),
                    Op::SetCode(a, b) => block.set_code(addr(a), vec![b].into()),
                    Op::Transfer(a, b, v) => {
                        let _ = block.transfer_value(addr(a), addr(b), U256::from(v)).unwrap();
                    }
                }
            }

            block.revert(&snapshot).unwrap();

            prop_assert_eq!(block.journal.len(), snapshot.journal_len);
            prop_assert_eq!(block.snapshot(), snapshot);
            for a in 0..3u8 {
                let (balance, nonce, code, slots) = &observed[a as usize];
                prop_assert_eq!(&block.get_balance(addr(a)).unwrap(), balance);
                prop_assert_eq!(&block.get_nonce(addr(a)).unwrap(), nonce);
                prop_assert_eq!(&block.get_code(addr(a)).unwrap(), code);
                for (k, expected) in slots.iter().enumerate() {
                    prop_assert_eq!(
                        &block.get_storage_data(addr(a), U256::from(k)).unwrap(),
                        expected
                    );
                }
            }
        }
    }
}

