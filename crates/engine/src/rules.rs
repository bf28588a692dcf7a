//! Consensus rules: difficulty adjustment, gas-limit adjustment, and reward
//! computation.

use alloy_primitives::U256;
use cinder_primitives::{
    constants::{
        BLKLIM_FACTOR_DEN, BLKLIM_FACTOR_NOM, BLOCK_DIFF_FACTOR, BLOCK_REWARD,
        DIFF_ADJUSTMENT_CUTOFF, GASLIMIT_ADJMAX_FACTOR, GASLIMIT_EMA_FACTOR, GENESIS_GAS_LIMIT,
        MIN_DIFF, MIN_GAS_LIMIT, UNCLE_DEPTH_PENALTY_FACTOR,
    },
    BlockHeader,
};

/// The difficulty of a block mined at `timestamp` on top of `parent`.
///
/// The difficulty moves by `parent.difficulty / 2048`: up if the block came in under
/// the adjustment cutoff, down otherwise. The result is floored at the minimum
/// difficulty, unless the parent was already below it, in which case low-difficulty
/// chains are allowed to continue.
pub fn calc_difficulty(parent: &BlockHeader, timestamp: u64) -> U256 {
    let offset = parent.difficulty / BLOCK_DIFF_FACTOR;
    let fast = (timestamp as i128) - (parent.timestamp as i128) < DIFF_ADJUSTMENT_CUTOFF as i128;
    let candidate = if fast {
        parent.difficulty.saturating_add(offset)
    } else {
        parent.difficulty.saturating_sub(offset)
    };
    candidate.max(parent.difficulty.min(MIN_DIFF))
}

/// The gas-limit target of a block on top of `parent`: an exponential moving average
/// decaying toward 3/2 of the parent's gas usage, floored at the minimum gas limit and
/// pulled back up toward the genesis gas limit when below it.
pub fn calc_gaslimit(parent: &BlockHeader) -> u64 {
    let decay = parent.gas_limit / GASLIMIT_EMA_FACTOR;
    let contribution =
        parent.gas_used * BLKLIM_FACTOR_NOM / BLKLIM_FACTOR_DEN / GASLIMIT_EMA_FACTOR;
    let mut gas_limit = (parent.gas_limit - decay + contribution).max(MIN_GAS_LIMIT);
    if gas_limit < GENESIS_GAS_LIMIT {
        gas_limit = (parent.gas_limit + decay).min(GENESIS_GAS_LIMIT);
    }
    debug_assert!(check_gaslimit(parent, gas_limit));
    gas_limit
}

/// Whether `gas_limit` is within `parent.gas_limit / 1024` of the parent's gas limit
/// and at least the minimum gas limit.
pub const fn check_gaslimit(parent: &BlockHeader, gas_limit: u64) -> bool {
    gas_limit.abs_diff(parent.gas_limit) <= parent.gas_limit / GASLIMIT_ADJMAX_FACTOR &&
        gas_limit >= MIN_GAS_LIMIT
}

/// The reward of an uncle at `uncle_number` included by a block at `block_number`,
/// linearly penalized by depth and integer-truncated.
pub fn uncle_reward(block_number: u64, uncle_number: u64) -> U256 {
    let factor = (UNCLE_DEPTH_PENALTY_FACTOR + uncle_number).saturating_sub(block_number);
    BLOCK_REWARD * U256::from(factor) / U256::from(UNCLE_DEPTH_PENALTY_FACTOR)
}
