//! Errors for the `cinder-engine` crate.

use alloy_primitives::B256;
use cinder_primitives::{HeaderError, ReceiptError};
use cinder_trie::TrieError;
use std::fmt;

/// A [Result] type alias where the error is [BlockError].
pub type BlockResult<T> = Result<T, BlockError>;

/// The error type for block construction and validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlockError {
    /// A field or record is structurally invalid.
    #[error("malformed record: {0}")]
    Malformed(&'static str),
    /// A wire payload failed to decode.
    #[error("invalid rlp: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    /// The block is inconsistent with the parent it was constructed from.
    #[error("block's {field} is inconsistent with its parent")]
    ParentMismatch {
        /// The inconsistent field.
        field: &'static str,
    },
    /// A consensus equality check against the header failed.
    #[error("verification of {field} failed: {actual} {op} {expected}")]
    VerificationFailed {
        /// The header field that failed verification.
        field: &'static str,
        /// The value derived from the block's contents.
        actual: String,
        /// The relation that was expected to hold.
        op: &'static str,
        /// The value the header claims.
        expected: String,
    },
    /// The proof-of-work seal is invalid.
    #[error("proof-of-work check failed")]
    PowFailed,
    /// The block's parent is not known to the store.
    #[error("unknown parent {0}")]
    UnknownParent(B256),
    /// A block was requested by hash and is not in the store.
    #[error("block {0} not found in database")]
    BlockNotFound(B256),
    /// A supplied bloom disagrees with the one derived from logs.
    #[error("invalid bloom filter")]
    InvalidBloom(#[from] ReceiptError),
    /// A transaction or receipt index beyond the block's count.
    #[error("transaction or receipt index {0} out of range")]
    IndexOutOfRange(u64),
    /// A trie operation failed.
    #[error(transparent)]
    Trie(#[from] TrieError),
    /// A header operation failed.
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// The transaction executor rejected a transaction.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl BlockError {
    /// A failed equality check of `field` against the header.
    pub fn verification<A, E>(field: &'static str, actual: A, expected: E) -> Self
    where
        A: fmt::Display,
        E: fmt::Display,
    {
        Self::verification_op(field, actual, "==", expected)
    }

    /// A failed ordered check of `field` against the header.
    pub fn verification_op<A, E>(field: &'static str, actual: A, op: &'static str, expected: E) -> Self
    where
        A: fmt::Display,
        E: fmt::Display,
    {
        Self::VerificationFailed {
            field,
            actual: actual.to_string(),
            op,
            expected: expected.to_string(),
        }
    }
}
