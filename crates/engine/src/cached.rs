//! The immutable view of a block rehydrated from the store.

use crate::{block::chain_difficulty_of, Block, BlockResult, Engine};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use cinder_primitives::{BlockHeader, Receipt};

/// An immutable block loaded from the store.
///
/// Blocks rehydrated from their wire form are never manipulated, so the hash and the
/// wire header are computed once at load time and every accessor is `&self`. No
/// mutable access to the inner [Block] is exposed: the state setters, revert, and
/// commit are unreachable by construction.
#[derive(Debug)]
pub struct CachedBlock {
    block: Block,
    header: BlockHeader,
    hash: B256,
}

impl CachedBlock {
    /// Seals a fully-constructed block into its immutable form.
    pub(crate) fn new(mut block: Block) -> BlockResult<Self> {
        let header = block.wire_header()?;
        let hash = keccak256(alloy_rlp::encode(&header));
        Ok(Self { block, header, hash })
    }

    /// The memoized block hash.
    pub const fn hash(&self) -> B256 {
        self.hash
    }

    /// The block's wire header, with roots as committed.
    pub const fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The block's uncle headers.
    pub fn uncles(&self) -> &[BlockHeader] {
        self.block.uncles()
    }

    /// The block number.
    pub const fn number(&self) -> u64 {
        self.header.number
    }

    /// The parent block hash.
    pub const fn prev_hash(&self) -> B256 {
        self.header.prev_hash
    }

    /// The block difficulty.
    pub const fn difficulty(&self) -> U256 {
        self.header.difficulty
    }

    /// The block timestamp.
    pub const fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    /// The address that collected this block's rewards.
    pub const fn coinbase(&self) -> Address {
        self.header.coinbase
    }

    /// The committed state root.
    pub const fn state_root(&self) -> B256 {
        self.header.state_root
    }

    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.block.is_genesis()
    }

    /// The number of transactions in the block.
    pub const fn transaction_count(&self) -> u64 {
        self.block.transaction_count()
    }

    /// The `index`th raw transaction.
    pub fn get_transaction(&self, index: u64) -> BlockResult<Bytes> {
        self.block.get_transaction(index)
    }

    /// All raw transactions, in order.
    pub fn get_transactions(&self) -> BlockResult<Vec<Bytes>> {
        self.block.get_transactions()
    }

    /// The receipt of the `index`th transaction.
    pub fn get_receipt(&self, index: u64) -> BlockResult<Receipt> {
        self.block.get_receipt(index)
    }

    /// All receipts, in order.
    pub fn get_receipts(&self) -> BlockResult<Vec<Receipt>> {
        self.block.get_receipts()
    }

    /// The cumulative difficulty of the chain ending in this block.
    pub fn chain_difficulty(&self, engine: &Engine) -> BlockResult<U256> {
        chain_difficulty_of(engine, self.hash, self.difficulty(), self.is_genesis(), self.prev_hash())
    }
}

impl PartialEq for CachedBlock {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for CachedBlock {}
