//! Deterministic doubles for the external collaborators, shared by the crate's tests.

use crate::{
    genesis, Block, BlockError, BlockResult, Engine, ExecutionOutcome, GenesisAccount,
    TransactionExecutor,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use cinder_primitives::{Ethash, Log, PowOutput};
use cinder_trie::Db;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A deterministic stand-in for ethash. The mix digest is a hash over the inputs, and
/// the result is all zeroes, so a correctly-sealed header always meets the target.
#[derive(Debug, Default)]
pub(crate) struct TestPow;

impl TestPow {
    /// The mix digest [Self::hashimoto_light] will produce, for sealing test headers.
    pub(crate) fn mix_digest(mining_hash: B256, nonce: [u8; 8]) -> B256 {
        let mut preimage = mining_hash.to_vec();
        preimage.extend_from_slice(&nonce);
        keccak256(preimage)
    }
}

impl Ethash for TestPow {
    fn cache_size(&self, _number: u64) -> u64 {
        64
    }

    fn full_size(&self, _number: u64) -> u64 {
        32 * 1024
    }

    fn make_cache(&self, size: u64, seed: B256) -> Vec<u8> {
        let mut cache = seed.to_vec();
        cache.resize(size as usize, 0);
        cache
    }

    fn hashimoto_light(
        &self,
        _full_size: u64,
        _cache: &[u8],
        header_hash: B256,
        nonce: [u8; 8],
    ) -> PowOutput {
        PowOutput { mix_digest: Self::mix_digest(header_hash, nonce), result: B256::ZERO }
    }
}

/// A value transfer, the only transaction kind the test executor understands.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub(crate) struct TransferTx {
    pub(crate) from: Address,
    pub(crate) to: Address,
    pub(crate) value: U256,
    pub(crate) gas: u64,
}

impl TransferTx {
    pub(crate) fn encoded(&self) -> Bytes {
        alloy_rlp::encode(self).into()
    }

    fn decode_raw(tx: &Bytes) -> BlockResult<Self> {
        <Self as alloy_rlp::Decodable>::decode(&mut tx.as_ref()).map_err(BlockError::from)
    }
}

/// A minimal transaction executor: decodes [TransferTx], moves value through the
/// block's cache, and emits one log per applied transfer. Counts invocations so tests
/// can assert the trust path never executes.
#[derive(Debug, Default)]
pub(crate) struct TransferExecutor {
    pub(crate) applied: AtomicUsize,
}

impl TransactionExecutor for TransferExecutor {
    fn apply_transaction(&self, block: &mut Block, tx: &Bytes) -> BlockResult<ExecutionOutcome> {
        self.applied.fetch_add(1, Ordering::SeqCst);
        let transfer = TransferTx::decode_raw(tx)?;

        block.clear_logs();
        let snapshot = block.snapshot();
        let _ = block.increment_nonce(transfer.from)?;
        if !block.transfer_value(transfer.from, transfer.to, transfer.value)? {
            block.revert(&snapshot)?;
            return Err(BlockError::Execution("insufficient balance for transfer".into()));
        }
        block.add_gas_used(transfer.gas);
        block.add_log(Log::new_unchecked(
            transfer.from,
            vec![transfer.to.into_word()],
            transfer.value.to_be_bytes_vec().into(),
        ));
        block.add_transaction_to_list(tx.clone())?;
        Ok(ExecutionOutcome { success: true, output: Bytes::new() })
    }
}

/// An engine over a fresh in-memory store, wired with [TestPow] and a
/// [TransferExecutor].
pub(crate) fn test_engine() -> (Engine, Arc<TransferExecutor>) {
    let executor = Arc::new(TransferExecutor::default());
    let engine = Engine::new(Db::memory(), Arc::new(TestPow), executor.clone());
    (engine, executor)
}

pub(crate) fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// A genesis block allocating `balance` wei to each of the given addresses.
pub(crate) fn test_genesis(engine: &Engine, accounts: &[(Address, u64)]) -> BlockResult<Block> {
    let alloc = accounts
        .iter()
        .map(|(address, balance)| (*address, GenesisAccount::with_balance(U256::from(*balance))))
        .collect::<Vec<_>>();
    genesis(engine, &alloc, cinder_primitives::constants::GENESIS_DIFFICULTY)
}

/// Persists a block under its hash so parent and ancestor lookups can find it.
pub(crate) fn store_block(block: &mut Block) -> BlockResult<B256> {
    let hash = block.hash()?;
    let encoded = block.rlp_bytes()?;
    block.db().put(hash.as_slice(), &encoded);
    Ok(hash)
}

/// A `(mixhash, nonce)` pair that passes [TestPow] verification for `block`'s current
/// mining hash.
pub(crate) fn seal_with_test_pow(block: &mut Block) -> BlockResult<(Bytes, Bytes)> {
    let nonce = [0u8, 0, 0, 0, 0, 0, 0, 7];
    let mining_hash = block.mining_hash()?;
    let mix = TestPow::mix_digest(mining_hash, nonce);
    Ok((Bytes::copy_from_slice(mix.as_slice()), Bytes::copy_from_slice(&nonce)))
}
