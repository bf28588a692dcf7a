//! Errors for the `cinder-primitives` crate.

/// An error type for [BlockHeader] operations.
///
/// [BlockHeader]: crate::BlockHeader
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// The header's mixhash or nonce has the wrong width for a PoW check.
    #[error("bad mixhash or nonce length")]
    BadSeal,
}

/// An error type for [Receipt] construction.
///
/// [Receipt]: crate::Receipt
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptError {
    /// The supplied bloom disagrees with the bloom derived from the logs.
    #[error("invalid bloom filter")]
    BloomMismatch,
}
