//! Block assembly and validation.
//!
//! A block is constructed from `(header, transactions, uncles)` against an [Engine].
//! If the header's state is already trusted (a `validated:` sentinel is present, the
//! block is genesis, the state root is the empty root, or the block is a mining
//! template), the state trie is opened directly at the header's root. Otherwise the
//! transactions are replayed against the parent's state through the engine's
//! transaction executor, rewards are applied, and the caches are committed. Either
//! way, every root and counter the header claims is then checked against what the
//! block actually contains.

use crate::{
    cached::CachedBlock,
    engine::{difficulty_key, validated_key},
    rules::{calc_difficulty, calc_gaslimit, check_gaslimit, uncle_reward},
    state::{JournalEntry, StateCache},
    BlockError, BlockResult, Engine,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, I256, U256};
use alloy_rlp::{Decodable, Encodable};
use cinder_primitives::{
    codec::{decode_int_be, encode_index, encode_int_be, keccak_rlp, take_rlp_item},
    constants::{
        BLOCK_REWARD, GASLIMIT_ADJMAX_FACTOR, GENESIS_NONCE, GENESIS_PREVHASH,
        MAX_EXTRA_DATA_SIZE, MAX_UNCLES, MAX_UNCLE_DEPTH, NEPHEW_REWARD,
    },
    BlockHeader, Log, Receipt,
};
use cinder_trie::{Db, SecureTrie, Trie, EMPTY_ROOT_HASH};
use std::sync::Arc;
use tracing::{debug, info, warn};

mod accounts;

/// A block under construction or validation.
///
/// Owns its header (as received on the wire), its uncle headers, the transaction and
/// receipts tries, the state trie view, and the transient execution state: the
/// journaled account cache, the per-transaction log buffer, the suicide list, and the
/// gas/refund/ether accounting. Root accessors answer from the live tries, never from
/// the stored header.
#[derive(Debug)]
pub struct Block {
    pub(crate) db: Db,
    pub(crate) header: BlockHeader,
    pub(crate) uncles: Vec<BlockHeader>,
    pub(crate) transactions: Trie,
    pub(crate) receipts: Trie,
    pub(crate) state: SecureTrie,
    pub(crate) transaction_count: u64,
    pub(crate) gas_used: u64,
    pub(crate) bloom: U256,
    pub(crate) refunds: u64,
    pub(crate) suicides: Vec<Address>,
    pub(crate) logs: Vec<Log>,
    pub(crate) ether_delta: i128,
    pub(crate) cache: StateCache,
    pub(crate) journal: Vec<JournalEntry>,
    pub(crate) ancestors: Vec<Option<Arc<CachedBlock>>>,
}

impl Block {
    /// Constructs and validates a block.
    ///
    /// ## Takes
    /// - `engine`: The engine context (store, PoW, executor).
    /// - `header`: The block header as received.
    /// - `transactions`: The raw transactions; required when the state must be
    ///   replayed, optional on the trust path.
    /// - `uncles`: The uncle headers, at most [MAX_UNCLES].
    /// - `parent`: The parent block, if the caller holds it. Enables the parent
    ///   consistency checks and spares a store lookup on replay.
    /// - `making`: `true` when constructing a mining template from a parent; trusts
    ///   the header's state root and skips replay.
    pub fn new(
        engine: &Engine,
        header: BlockHeader,
        transactions: Option<Vec<Bytes>>,
        uncles: Vec<BlockHeader>,
        mut parent: Option<&mut Self>,
        making: bool,
    ) -> BlockResult<Self> {
        let db = engine.db().clone();

        let mut parent_header: Option<BlockHeader> = None;
        if let Some(parent) = parent.as_deref_mut() {
            if parent.db != db {
                return Err(BlockError::ParentMismatch { field: "database" });
            }
            if header.prev_hash != parent.hash()? {
                return Err(BlockError::ParentMismatch { field: "prev_hash" });
            }
            if header.number != parent.number() + 1 {
                return Err(BlockError::ParentMismatch { field: "number" });
            }
            if !check_gaslimit(&parent.header, header.gas_limit) {
                return Err(BlockError::ParentMismatch { field: "gas_limit" });
            }
            if header.difficulty != calc_difficulty(&parent.header, header.timestamp) {
                return Err(BlockError::ParentMismatch { field: "difficulty" });
            }
            parent_header = Some(parent.wire_header()?);
        }

        // What the wire header claims; compared against what construction produces.
        let original_gas_used = header.gas_used;
        let original_uncles_hash = header.uncles_hash;
        let original_bloom = header.bloom;

        let header_hash = keccak_rlp(&header);
        let replay = header.prev_hash != GENESIS_PREVHASH &&
            header.state_root != EMPTY_ROOT_HASH &&
            !db.contains(&validated_key(header_hash)) &&
            !making;

        if replay && transactions.is_none() {
            return Err(BlockError::Malformed("transaction list required to replay state"));
        }
        if replay && parent_header.is_none() {
            parent_header = Some(parent_header_of(engine, &header)?);
        }

        let state = match (&parent_header, replay) {
            (Some(parent_header), true) => SecureTrie::new(db.clone(), parent_header.state_root)?,
            _ => SecureTrie::new(db.clone(), header.state_root)?,
        };

        info!(
            target: "block_engine",
            number = header.number,
            gas_limit = header.gas_limit,
            tx_count = transactions.as_ref().map(Vec::len).unwrap_or_default(),
            replay,
            "constructing block",
        );

        let mut block = Self {
            transactions: Trie::empty(db.clone()),
            receipts: Trie::empty(db.clone()),
            state,
            transaction_count: 0,
            gas_used: if replay { 0 } else { header.gas_used },
            bloom: if replay { U256::ZERO } else { header.bloom },
            refunds: 0,
            suicides: Vec::new(),
            logs: Vec::new(),
            ether_delta: 0,
            cache: StateCache::default(),
            journal: Vec::new(),
            ancestors: Vec::new(),
            header,
            uncles,
            db,
        };

        if replay {
            let executor = engine.executor();
            for tx in transactions.iter().flatten() {
                executor.apply_transaction(&mut block, tx)?;
            }
            block.finalize()?;
        } else {
            for tx in transactions.iter().flatten() {
                block.add_transaction_to_list(tx.clone())?;
            }
            let tx_root = block.transactions.root_hash();
            if tx_root != block.header.tx_list_root {
                return Err(BlockError::verification(
                    "tx_list_root",
                    tx_root,
                    block.header.tx_list_root,
                ));
            }
            // The receipts rebuilt while adding transactions know nothing of the
            // intermediate states, so the trie the header commits to replaces them.
            block.receipts = Trie::new(block.db.clone(), block.header.receipts_root)?;
        }

        block.run_consensus_checks(parent_header.as_ref(), original_gas_used, original_uncles_hash, original_bloom)?;

        if block.header.extra_data.len() > MAX_EXTRA_DATA_SIZE {
            return Err(BlockError::Malformed("extra data exceeds 1024 bytes"));
        }
        block.check_fields()?;
        if !block.state.root_hash_valid() {
            return Err(BlockError::Malformed("state root not found in database"));
        }
        if !block.is_genesis() &&
            !block.header.nonce.is_empty() &&
            !block.header.check_pow(engine.pow(), engine.pow_caches(), None)?
        {
            return Err(BlockError::PowFailed);
        }

        block.db.put(&validated_key(header_hash), b"1");
        debug!(target: "block_engine", number = block.number(), block_hash = %header_hash, "block validated");
        Ok(block)
    }

    /// Creates a mining template on top of `parent`: no transactions, a placeholder
    /// PoW seal, and difficulty/gas limit derived from the parent.
    pub fn init_from_parent(
        engine: &Engine,
        parent: &mut Self,
        coinbase: Address,
        nonce: Bytes,
        extra_data: Bytes,
        timestamp: u64,
        uncles: Vec<BlockHeader>,
    ) -> BlockResult<Self> {
        let header = BlockHeader {
            prev_hash: parent.hash()?,
            uncles_hash: keccak_rlp(&uncles),
            coinbase,
            state_root: parent.state_root()?,
            tx_list_root: EMPTY_ROOT_HASH,
            receipts_root: EMPTY_ROOT_HASH,
            bloom: U256::ZERO,
            difficulty: calc_difficulty(&parent.header, timestamp),
            number: parent.number() + 1,
            gas_limit: calc_gaslimit(&parent.header),
            gas_used: 0,
            timestamp,
            extra_data,
            mixhash: Bytes::new(),
            nonce,
            stored_hash: None,
        };
        Self::new(engine, header, Some(Vec::new()), uncles, Some(parent), true)
    }

    /// Decodes and validates a block from its wire form `[header, transactions,
    /// uncles]`.
    pub fn decode_rlp(engine: &Engine, raw: &[u8]) -> BlockResult<Self> {
        let (header, transactions, uncles) = decode_parts(raw)?;
        Self::new(engine, header, Some(transactions), uncles, None, false)
    }

    /// Decodes only the header out of a block's wire form.
    pub fn header_from_block_rlp(raw: &[u8]) -> BlockResult<BlockHeader> {
        let mut buf = raw;
        let outer = alloy_rlp::Header::decode(&mut buf)?;
        if !outer.list {
            return Err(BlockError::Rlp(alloy_rlp::Error::UnexpectedString));
        }
        BlockHeader::decode(&mut buf).map_err(BlockError::from)
    }

    /// Serializes the block to its wire form, with the header rehydrated from the
    /// live tries.
    pub fn rlp_bytes(&mut self) -> BlockResult<Bytes> {
        let header = self.wire_header()?;
        let transactions = self.get_transactions()?;
        let tx_payload = transactions.iter().map(|b| b.0.len()).sum::<usize>();
        let mut tx_list = Vec::with_capacity(tx_payload + 4);
        alloy_rlp::Header { list: true, payload_length: tx_payload }.encode(&mut tx_list);
        for tx in &transactions {
            tx_list.extend_from_slice(tx);
        }

        let payload_length = header.length() + tx_list.len() + self.uncles.length();
        let mut out = Vec::with_capacity(payload_length + 4);
        alloy_rlp::Header { list: true, payload_length }.encode(&mut out);
        header.encode(&mut out);
        out.extend_from_slice(&tx_list);
        self.uncles.encode(&mut out);
        Ok(out.into())
    }

    /// A wire-form header carrying the block's live roots and counters.
    pub fn wire_header(&mut self) -> BlockResult<BlockHeader> {
        let mut header = self.header.clone();
        header.state_root = self.state_root()?;
        header.tx_list_root = self.transactions.root_hash();
        header.receipts_root = self.receipts.root_hash();
        header.bloom = self.bloom;
        header.gas_used = self.gas_used;
        header.stored_hash = None;
        Ok(header)
    }

    /// The block hash: `keccak256(rlp(wire_header))`. Committing pending state is part
    /// of answering this, hence `&mut`.
    pub fn hash(&mut self) -> BlockResult<B256> {
        Ok(keccak256(alloy_rlp::encode(self.wire_header()?)))
    }

    /// The hash mining operates on, excluding the PoW seal fields.
    pub fn mining_hash(&mut self) -> BlockResult<B256> {
        Ok(self.wire_header()?.mining_hash())
    }

    /// The root of the state trie, after committing pending cache changes.
    pub fn state_root(&mut self) -> BlockResult<B256> {
        self.commit_state()?;
        Ok(self.state.root_hash())
    }

    /// The root of the transaction trie.
    pub fn tx_list_root(&mut self) -> B256 {
        self.transactions.root_hash()
    }

    /// The root of the receipts trie.
    pub fn receipts_root(&mut self) -> B256 {
        self.receipts.root_hash()
    }

    /// `keccak256(rlp(uncles))` over the live uncle list.
    pub fn uncles_hash(&self) -> B256 {
        keccak_rlp(&self.uncles)
    }

    /// The block's uncle headers.
    pub fn uncles(&self) -> &[BlockHeader] {
        &self.uncles
    }

    /// The block number.
    pub const fn number(&self) -> u64 {
        self.header.number
    }

    /// The parent block hash.
    pub const fn prev_hash(&self) -> B256 {
        self.header.prev_hash
    }

    /// The address collecting this block's rewards.
    pub const fn coinbase(&self) -> Address {
        self.header.coinbase
    }

    /// The block difficulty.
    pub const fn difficulty(&self) -> U256 {
        self.header.difficulty
    }

    /// The block timestamp.
    pub const fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    /// The block gas limit.
    pub const fn gas_limit(&self) -> u64 {
        self.header.gas_limit
    }

    /// Gas used by the transactions applied so far.
    pub const fn gas_used(&self) -> u64 {
        self.gas_used
    }

    /// The accumulated bloom over the receipts added so far.
    pub const fn bloom(&self) -> U256 {
        self.bloom
    }

    /// The number of transactions in the block.
    pub const fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    /// The store this block lives in.
    pub const fn db(&self) -> &Db {
        &self.db
    }

    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.header.prev_hash == GENESIS_PREVHASH && self.header.nonce[..] == GENESIS_NONCE[..]
    }

    /// Appends a raw transaction to the transaction trie under `rlp(index)`, together
    /// with a receipt for the current execution state. Does not execute anything.
    pub fn add_transaction_to_list(&mut self, tx: Bytes) -> BlockResult<()> {
        let key = encode_index(self.transaction_count);
        self.transactions.update(&key, tx.to_vec());
        let receipt = self.mk_transaction_receipt()?;
        self.receipts.update(&key, alloy_rlp::encode(&receipt));
        self.bloom |= receipt.bloom;
        self.transaction_count += 1;
        Ok(())
    }

    /// A receipt capturing the current execution state: post-transaction state root,
    /// cumulative gas, and the per-transaction log buffer.
    pub fn mk_transaction_receipt(&mut self) -> BlockResult<Receipt> {
        Ok(Receipt::new(self.state_root()?, self.gas_used, self.logs.clone()))
    }

    /// The `index`th raw transaction.
    pub fn get_transaction(&self, index: u64) -> BlockResult<Bytes> {
        self.transactions
            .get(&encode_index(index))
            .map(Bytes::copy_from_slice)
            .ok_or(BlockError::IndexOutOfRange(index))
    }

    /// All raw transactions, in order.
    pub fn get_transactions(&self) -> BlockResult<Vec<Bytes>> {
        (0..self.transaction_count).map(|index| self.get_transaction(index)).collect()
    }

    /// The receipt of the `index`th transaction.
    pub fn get_receipt(&self, index: u64) -> BlockResult<Receipt> {
        let encoded = self
            .receipts
            .get(&encode_index(index))
            .ok_or(BlockError::IndexOutOfRange(index))?;
        Receipt::decode(&mut &encoded[..]).map_err(BlockError::from)
    }

    /// All receipts, in order.
    pub fn get_receipts(&self) -> BlockResult<Vec<Receipt>> {
        let mut receipts = Vec::new();
        for index in 0.. {
            match self.get_receipt(index) {
                Ok(receipt) => receipts.push(receipt),
                Err(BlockError::IndexOutOfRange(_)) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(receipts)
    }

    /// The parent of this block, loaded through the engine's block cache.
    pub fn get_parent(&self, engine: &Engine) -> BlockResult<Arc<CachedBlock>> {
        if self.number() == 0 {
            return Err(BlockError::UnknownParent(self.header.prev_hash));
        }
        engine.get_block(self.header.prev_hash).map_err(unknown_parent)
    }

    /// The parent header of this block.
    pub fn get_parent_header(&self, engine: &Engine) -> BlockResult<BlockHeader> {
        parent_header_of(engine, &self.header)
    }

    /// Whether this block's parent is known to the store.
    pub fn has_parent(&self, engine: &Engine) -> bool {
        self.get_parent(engine).is_ok()
    }

    /// The first `n` ancestors of this block, parent first, memoized across calls.
    /// Entries past genesis are [None].
    pub fn get_ancestor_list(
        &mut self,
        engine: &Engine,
        n: usize,
    ) -> BlockResult<Vec<Option<Arc<CachedBlock>>>> {
        if self.number() == 0 {
            return Ok(vec![None; n]);
        }
        while self.ancestors.len() < n {
            let next = match self.ancestors.last() {
                None => Some(self.get_parent(engine)?),
                Some(Some(prev)) if prev.number() > 0 => {
                    Some(engine.get_block(prev.prev_hash()).map_err(unknown_parent)?)
                }
                _ => None,
            };
            self.ancestors.push(next);
        }
        Ok(self.ancestors[..n].to_vec())
    }

    /// The `n`th ancestor of this block, if it exists.
    pub fn get_ancestor(
        &mut self,
        engine: &Engine,
        n: usize,
    ) -> BlockResult<Option<Arc<CachedBlock>>> {
        Ok(self.get_ancestor_list(engine, n)?.pop().flatten())
    }

    /// Validates the uncles of this block against its ancestor chain.
    ///
    /// An uncle must carry a valid PoW, descend from an ancestor at depth 2..=7, and
    /// be neither a direct ancestor nor an uncle already included by a recent
    /// ancestor, nor a duplicate within this block.
    pub fn validate_uncles(&mut self, engine: &Engine) -> BlockResult<bool> {
        if keccak_rlp(&self.uncles) != self.header.uncles_hash {
            return Ok(false);
        }
        if self.uncles.len() > MAX_UNCLES {
            return Ok(false);
        }
        for uncle in &self.uncles {
            if !self.db.contains(uncle.prev_hash.as_slice()) {
                warn!(target: "block_engine", "uncle's parent is not in the store");
                return Ok(false);
            }
            if uncle.number == self.number() {
                warn!(target: "block_engine", "uncle at the same height as the block");
                return Ok(false);
            }
        }

        let chain = self
            .get_ancestor_list(engine, (MAX_UNCLE_DEPTH + 1) as usize)?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        // Direct ancestors and uncles already included by them are ineligible.
        let mut ineligible = Vec::new();
        for ancestor in &chain {
            ineligible.extend(ancestor.uncles().iter().map(BlockHeader::hash));
        }
        ineligible.push(self.hash()?);
        ineligible.extend(chain.iter().map(|ancestor| ancestor.hash()));

        let eligible_ancestor_hashes =
            chain.iter().skip(1).map(|ancestor| ancestor.hash()).collect::<Vec<_>>();

        for uncle in self.uncles.clone() {
            if !uncle.check_pow(engine.pow(), engine.pow_caches(), None)? {
                return Ok(false);
            }
            if !eligible_ancestor_hashes.contains(&uncle.prev_hash) {
                warn!(
                    target: "block_engine",
                    uncle_prevhash = %uncle.prev_hash,
                    "uncle does not descend from an eligible ancestor",
                );
                return Ok(false);
            }
            let uncle_hash = uncle.hash();
            if ineligible.contains(&uncle_hash) {
                warn!(target: "block_engine", uncle = %uncle_hash, "duplicate uncle");
                return Ok(false);
            }
            ineligible.push(uncle_hash);
        }
        Ok(true)
    }

    /// Applies the block and uncle rewards and commits the account caches.
    pub fn finalize(&mut self) -> BlockResult<()> {
        let reward = BLOCK_REWARD + NEPHEW_REWARD * U256::from(self.uncles.len());
        let _ = self.delta_balance(self.coinbase(), to_signed(reward)?)?;
        self.ether_delta += reward.to::<u128>() as i128;

        for uncle in self.uncles.clone() {
            let reward = uncle_reward(self.number(), uncle.number);
            let _ = self.delta_balance(uncle.coinbase, to_signed(reward)?)?;
            self.ether_delta += reward.to::<u128>() as i128;
        }
        self.commit_state()
    }

    /// The cumulative difficulty of the chain ending in this block, memoized in the
    /// store.
    pub fn chain_difficulty(&mut self, engine: &Engine) -> BlockResult<U256> {
        let hash = self.hash()?;
        chain_difficulty_of(engine, hash, self.difficulty(), self.is_genesis(), self.prev_hash())
    }

    /// Checks that the header's values are well formed by round-tripping it through
    /// the codec.
    fn check_fields(&self) -> BlockResult<()> {
        let encoded = alloy_rlp::encode(&self.header);
        let decoded = BlockHeader::decode(&mut encoded.as_slice())
            .map_err(|_| BlockError::Malformed("header fields are not well formed"))?;
        if alloy_rlp::encode(&decoded) != encoded {
            return Err(BlockError::Malformed("header fields are not well formed"));
        }
        Ok(())
    }

    fn run_consensus_checks(
        &mut self,
        parent_header: Option<&BlockHeader>,
        original_gas_used: u64,
        original_uncles_hash: B256,
        original_bloom: U256,
    ) -> BlockResult<()> {
        if let Some(parent_header) = parent_header {
            if self.header.prev_hash != parent_header.hash() {
                return Err(BlockError::verification(
                    "prev_hash",
                    self.header.prev_hash,
                    parent_header.hash(),
                ));
            }
            let lower =
                parent_header.gas_limit * (GASLIMIT_ADJMAX_FACTOR - 1) / GASLIMIT_ADJMAX_FACTOR;
            let upper =
                parent_header.gas_limit * (GASLIMIT_ADJMAX_FACTOR + 1) / GASLIMIT_ADJMAX_FACTOR;
            if self.header.gas_limit < lower {
                return Err(BlockError::verification_op(
                    "gas_limit",
                    self.header.gas_limit,
                    ">=",
                    lower,
                ));
            }
            if self.header.gas_limit > upper {
                return Err(BlockError::verification_op(
                    "gas_limit",
                    self.header.gas_limit,
                    "<=",
                    upper,
                ));
            }
        }
        if self.gas_used != original_gas_used {
            return Err(BlockError::verification("gas_used", self.gas_used, original_gas_used));
        }
        let uncles_hash = keccak_rlp(&self.uncles);
        if uncles_hash != original_uncles_hash {
            return Err(BlockError::verification("uncles_hash", uncles_hash, original_uncles_hash));
        }
        let state_root = self.state_root()?;
        if state_root != self.header.state_root {
            return Err(BlockError::verification("state_root", state_root, self.header.state_root));
        }
        let tx_root = self.transactions.root_hash();
        if tx_root != self.header.tx_list_root {
            return Err(BlockError::verification(
                "tx_list_root",
                tx_root,
                self.header.tx_list_root,
            ));
        }
        let receipts_root = self.receipts.root_hash();
        if receipts_root != self.header.receipts_root {
            return Err(BlockError::verification(
                "receipts_root",
                receipts_root,
                self.header.receipts_root,
            ));
        }
        if self.bloom != original_bloom {
            return Err(BlockError::verification("bloom", self.bloom, original_bloom));
        }
        Ok(())
    }
}

/// Maps a missed block lookup to [BlockError::UnknownParent].
fn unknown_parent(err: BlockError) -> BlockError {
    match err {
        BlockError::BlockNotFound(hash) => BlockError::UnknownParent(hash),
        other => other,
    }
}

/// Converts an unsigned reward into the signed delta the balance ops take.
fn to_signed(value: U256) -> BlockResult<I256> {
    I256::try_from(value).map_err(|_| BlockError::Malformed("reward does not fit a signed delta"))
}

/// Fetches the parent header of `header` from the store.
pub(crate) fn parent_header_of(engine: &Engine, header: &BlockHeader) -> BlockResult<BlockHeader> {
    if header.number == 0 {
        return Err(BlockError::UnknownParent(header.prev_hash));
    }
    engine.get_block_header(header.prev_hash).map_err(unknown_parent)
}

/// The chain difficulty of the block identified by `hash`: its own difficulty plus its
/// parent's chain difficulty, memoized under `difficulty:<hex(hash)>`.
pub(crate) fn chain_difficulty_of(
    engine: &Engine,
    hash: B256,
    difficulty: U256,
    is_genesis: bool,
    prev_hash: B256,
) -> BlockResult<U256> {
    if is_genesis {
        return Ok(difficulty);
    }
    let key = difficulty_key(hash);
    if let Some(stored) = engine.db().get(&key) {
        return decode_int_be(&stored)
            .ok_or(BlockError::Malformed("stored chain difficulty is wider than 256 bits"));
    }
    let parent = engine.get_block(prev_hash).map_err(unknown_parent)?;
    let total = difficulty + parent.chain_difficulty(engine)?;
    engine.db().put(&key, &encode_int_be(total));
    Ok(total)
}

/// Splits a block's wire form into its header, raw transactions, and uncles.
fn decode_parts(raw: &[u8]) -> BlockResult<(BlockHeader, Vec<Bytes>, Vec<BlockHeader>)> {
    let mut buf = raw;
    let outer = alloy_rlp::Header::decode(&mut buf)?;
    if !outer.list {
        return Err(BlockError::Rlp(alloy_rlp::Error::UnexpectedString));
    }
    let header = BlockHeader::decode(&mut buf)?;

    let tx_list = alloy_rlp::Header::decode(&mut buf)?;
    if !tx_list.list {
        return Err(BlockError::Rlp(alloy_rlp::Error::UnexpectedString));
    }
    let mut remaining = tx_list.payload_length;
    let mut transactions = Vec::new();
    while remaining > 0 {
        let before = buf.len();
        let item = take_rlp_item(&mut buf)?;
        let consumed = before - buf.len();
        if consumed > remaining {
            return Err(BlockError::Rlp(alloy_rlp::Error::ListLengthMismatch {
                expected: tx_list.payload_length,
                got: tx_list.payload_length + consumed - remaining,
            }));
        }
        remaining -= consumed;
        transactions.push(Bytes::copy_from_slice(item));
    }

    let uncles = Vec::<BlockHeader>::decode(&mut buf)?;
    Ok((header, transactions, uncles))
}
