//! Per-transaction receipts.

use crate::{
    bloom::logs_bloom,
    codec::{decode_u256_fixed, encode_u256_fixed, U256_FIXED_LENGTH},
    ReceiptError,
};
use alloy_primitives::{Log, B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable};

/// A transaction receipt: the state root after the transaction, the cumulative gas used
/// in the block up to and including it, the bloom over its logs, and the logs
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Root of the state trie after this transaction executed.
    pub state_root: B256,
    /// Cumulative gas used in the block up to and including this transaction.
    pub gas_used: u64,
    /// Bloom over the receipt's logs.
    pub bloom: U256,
    /// Logs emitted by the transaction.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Constructs a receipt, deriving the bloom from `logs`.
    pub fn new(state_root: B256, gas_used: u64, logs: Vec<Log>) -> Self {
        let bloom = logs_bloom(&logs);
        Self { state_root, gas_used, bloom, logs }
    }

    /// Constructs a receipt and checks a caller-supplied bloom against the derived one.
    pub fn with_expected_bloom(
        state_root: B256,
        gas_used: u64,
        logs: Vec<Log>,
        bloom: U256,
    ) -> Result<Self, ReceiptError> {
        let receipt = Self::new(state_root, gas_used, logs);
        if receipt.bloom != bloom {
            return Err(ReceiptError::BloomMismatch);
        }
        Ok(receipt)
    }

    fn payload_length(&self) -> usize {
        self.state_root.length() +
            self.gas_used.length() +
            U256_FIXED_LENGTH +
            self.logs.length()
    }
}

impl Encodable for Receipt {
    fn encode(&self, out: &mut dyn BufMut) {
        let payload_length = self.payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.state_root.encode(out);
        self.gas_used.encode(out);
        encode_u256_fixed(self.bloom, out);
        self.logs.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for Receipt {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = alloy_rlp::Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let state_root = B256::decode(buf)?;
        let gas_used = u64::decode(buf)?;
        let bloom = decode_u256_fixed(buf)?;
        let logs = Vec::<Log>::decode(buf)?;
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Self::with_expected_bloom(state_root, gas_used, logs, bloom)
            .map_err(|_| alloy_rlp::Error::Custom("receipt bloom does not match logs"))
    }
}
