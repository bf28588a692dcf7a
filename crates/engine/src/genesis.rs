//! Genesis block construction.

use crate::{Block, BlockResult, Engine};
use alloy_primitives::{Address, Bytes, U256};
use cinder_primitives::{
    constants::{
        GENESIS_COINBASE, GENESIS_GAS_LIMIT, GENESIS_MIXHASH, GENESIS_NONCE, GENESIS_PREVHASH,
    },
    codec::keccak_rlp,
    BlockHeader,
};
use cinder_trie::EMPTY_ROOT_HASH;
use std::collections::BTreeMap;
use tracing::info;

/// The initial state of one account in the genesis allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenesisAccount {
    /// Initial balance, in wei.
    pub balance: U256,
    /// Initial nonce.
    pub nonce: U256,
    /// Initial code, if the account is a contract.
    pub code: Option<Bytes>,
    /// Initial storage slots.
    pub storage: BTreeMap<U256, U256>,
}

impl GenesisAccount {
    /// An allocation holding only a balance.
    pub fn with_balance(balance: U256) -> Self {
        Self { balance, ..Default::default() }
    }
}

/// Builds the genesis block over the engine's store, applies the initial allocation,
/// and commits the result durably.
pub fn genesis(
    engine: &Engine,
    alloc: &[(Address, GenesisAccount)],
    difficulty: U256,
) -> BlockResult<Block> {
    let header = BlockHeader {
        prev_hash: GENESIS_PREVHASH,
        uncles_hash: keccak_rlp(&Vec::<BlockHeader>::new()),
        coinbase: GENESIS_COINBASE,
        state_root: EMPTY_ROOT_HASH,
        tx_list_root: EMPTY_ROOT_HASH,
        receipts_root: EMPTY_ROOT_HASH,
        bloom: U256::ZERO,
        difficulty,
        number: 0,
        gas_limit: GENESIS_GAS_LIMIT,
        gas_used: 0,
        timestamp: 0,
        extra_data: Bytes::new(),
        mixhash: Bytes::copy_from_slice(GENESIS_MIXHASH.as_slice()),
        nonce: Bytes::copy_from_slice(&GENESIS_NONCE),
        stored_hash: None,
    };
    let mut block = Block::new(engine, header, Some(Vec::new()), Vec::new(), None, false)?;

    for (address, account) in alloc {
        if !account.balance.is_zero() {
            block.set_balance(*address, account.balance);
        }
        if !account.nonce.is_zero() {
            block.set_nonce(*address, account.nonce);
        }
        if let Some(code) = &account.code {
            block.set_code(*address, code.clone());
        }
        for (index, value) in &account.storage {
            block.set_storage_data(*address, *index, *value);
        }
    }
    block.commit_state()?;
    let state_root = block.state_root()?;
    engine.db().commit();

    info!(
        target: "block_engine",
        accounts = alloc.len(),
        %state_root,
        "built genesis block",
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{addr, test_engine};
    use alloy_primitives::U256;
    use cinder_primitives::{constants::GENESIS_DIFFICULTY, Account};
    use cinder_trie::{Db, SecureTrie};

    #[test]
    fn test_genesis_with_allocation() {
        let (engine, _) = test_engine();
        let alloc = [(addr(0xaa), GenesisAccount::with_balance(U256::from(1000)))];
        let mut block = genesis(&engine, &alloc, GENESIS_DIFFICULTY).unwrap();

        assert_eq!(block.number(), 0);
        assert_eq!(block.prev_hash(), GENESIS_PREVHASH);
        assert!(block.is_genesis());
        assert_eq!(block.get_balance(addr(0xaa)).unwrap(), U256::from(1000));

        // The state root is exactly the trie holding the single allocated account.
        let db = Db::memory();
        let mut expected = SecureTrie::empty(db.clone());
        let mut account = Account::blank(db);
        account.balance = U256::from(1000);
        expected.update(addr(0xaa).as_slice(), alloy_rlp::encode(&account));
        assert_eq!(block.state_root().unwrap(), expected.root_hash());
    }

    #[test]
    fn test_genesis_is_deterministic() {
        let (engine_a, _) = test_engine();
        let (engine_b, _) = test_engine();
        let alloc = [(addr(0xaa), GenesisAccount::with_balance(U256::from(7)))];
        let mut a = genesis(&engine_a, &alloc, GENESIS_DIFFICULTY).unwrap();
        let mut b = genesis(&engine_b, &alloc, GENESIS_DIFFICULTY).unwrap();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_genesis_full_allocation_fields() {
        let (engine, _) = test_engine();
        let code = Bytes::from_static(&[0x60, 0x00]);
        let account = GenesisAccount {
            balance: U256::from(10),
            nonce: U256::from(3),
            code: Some(code.clone()),
            storage: [(U256::from(1), U256::from(2))].into_iter().collect(),
        };
        let mut block = genesis(&engine, &[(addr(0x01), account)], GENESIS_DIFFICULTY).unwrap();

        assert_eq!(block.get_balance(addr(0x01)).unwrap(), U256::from(10));
        assert_eq!(block.get_nonce(addr(0x01)).unwrap(), U256::from(3));
        assert_eq!(block.get_code(addr(0x01)).unwrap(), code);
        assert_eq!(
            block.get_storage_data(addr(0x01), U256::from(1)).unwrap(),
            U256::from(2)
        );
    }

    #[test]
    fn test_genesis_has_no_parent() {
        let (engine, _) = test_engine();
        let block = genesis(&engine, &[], GENESIS_DIFFICULTY).unwrap();
        assert!(!block.has_parent(&engine));
        assert!(matches!(
            block.get_parent(&engine).unwrap_err(),
            crate::BlockError::UnknownParent(_)
        ));
    }
}
