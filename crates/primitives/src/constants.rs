//! Protocol constants for the proof-of-work chain.

use alloy_primitives::{b256, Address, B256, U256};

/// Genesis block difficulty.
pub const GENESIS_DIFFICULTY: U256 = U256::from_limbs([131_072, 0, 0, 0]);

/// Genesis block gas limit.
pub const GENESIS_GAS_LIMIT: u64 = 3_141_592;

/// Genesis block previous-block hash.
pub const GENESIS_PREVHASH: B256 = B256::ZERO;

/// Genesis block coinbase address.
pub const GENESIS_COINBASE: Address = Address::ZERO;

/// Genesis block PoW nonce: 42 as a zero-padded 8-byte big-endian integer.
pub const GENESIS_NONCE: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 42];

/// Genesis block mixhash.
pub const GENESIS_MIXHASH: B256 = B256::ZERO;

/// Minimum gas limit of any block.
pub const MIN_GAS_LIMIT: u64 = 125_000;

/// Divisor of the gas-limit exponential moving average.
pub const GASLIMIT_EMA_FACTOR: u64 = 1024;

/// Divisor bounding the per-block gas-limit adjustment.
pub const GASLIMIT_ADJMAX_FACTOR: u64 = 1024;

/// Numerator of the gas-usage contribution to the gas-limit target.
pub const BLKLIM_FACTOR_NOM: u64 = 3;

/// Denominator of the gas-usage contribution to the gas-limit target.
pub const BLKLIM_FACTOR_DEN: u64 = 2;

/// Static block reward: 1500 finney, in wei.
pub const BLOCK_REWARD: U256 = U256::from_limbs([1_500_000_000_000_000_000, 0, 0, 0]);

/// Reward paid to a block's coinbase per included uncle: `BLOCK_REWARD / 32`.
pub const NEPHEW_REWARD: U256 = U256::from_limbs([46_875_000_000_000_000, 0, 0, 0]);

/// Divisor of the depth penalty applied to uncle rewards.
pub const UNCLE_DEPTH_PENALTY_FACTOR: u64 = 8;

/// Maximum `block.number - uncle.number` for an includable uncle.
pub const MAX_UNCLE_DEPTH: u64 = 6;

/// Maximum number of uncles per block.
pub const MAX_UNCLES: usize = 2;

/// Timestamp delta below which difficulty adjusts upward.
pub const DIFF_ADJUSTMENT_CUTOFF: u64 = 8;

/// Divisor of the per-block difficulty offset.
pub const BLOCK_DIFF_FACTOR: U256 = U256::from_limbs([2048, 0, 0, 0]);

/// Minimum difficulty of any block.
pub const MIN_DIFF: U256 = U256::from_limbs([131_072, 0, 0, 0]);

/// Number of blocks per ethash epoch.
pub const EPOCH_LENGTH: u64 = 30_000;

/// Maximum width of a header's extra data field.
pub const MAX_EXTRA_DATA_SIZE: usize = 1024;

/// `keccak256(rlp([]))`, the uncles hash of a block with no uncles.
pub const EMPTY_LIST_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// `keccak256([])`, the code hash of an account with no code.
pub const EMPTY_CODE_HASH: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Bytes};

    #[test]
    fn test_hash_constants() {
        assert_eq!(EMPTY_CODE_HASH, keccak256([]));
        assert_eq!(EMPTY_LIST_HASH, keccak256(alloy_rlp::encode(Vec::<Bytes>::new())));
    }

    #[test]
    fn test_nephew_reward_is_a_32nd_of_the_block_reward() {
        assert_eq!(NEPHEW_REWARD, BLOCK_REWARD / U256::from(32));
    }
}
