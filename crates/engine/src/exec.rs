//! The interface to the external EVM transaction executor.

use crate::{Block, BlockResult};
use alloy_primitives::Bytes;
use std::fmt;

/// The outcome of one applied transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Whether the transaction succeeded.
    pub success: bool,
    /// The return data of the transaction, if any.
    pub output: Bytes,
}

/// The synchronous interface to the EVM transaction executor.
///
/// The executor reads and writes the block's world exclusively through the block's
/// cache operations, appends logs with [Block::add_log], wraps sub-execution in
/// [Block::snapshot] / [Block::revert], and appends the transaction and its receipt
/// with [Block::add_transaction_to_list].
pub trait TransactionExecutor: fmt::Debug + Send + Sync {
    /// Applies one raw transaction to `block`.
    fn apply_transaction(&self, block: &mut Block, tx: &Bytes) -> BlockResult<ExecutionOutcome>;
}
