//! Errors for the `cinder-trie` crate.

use alloy_primitives::B256;

/// A [Result] type alias where the error is [TrieError].
pub type TrieResult<T> = Result<T, TrieError>;

/// An error type for [Trie] operations.
///
/// [Trie]: crate::Trie
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrieError {
    /// The requested root has no snapshot in the backing store.
    #[error("trie root {0} not found in database")]
    RootNotFound(B256),
    /// A persisted snapshot failed to decode.
    #[error("failed to decode trie snapshot: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    /// A persisted snapshot does not hold key/value pairs.
    #[error("trie snapshot holds an odd number of elements")]
    CorruptSnapshot,
}
