//! The account record stored in the state trie.

use crate::constants::EMPTY_CODE_HASH;
use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable};
use cinder_trie::{Db, EMPTY_ROOT_HASH};

/// An account: the four-field tuple committed into the state trie, plus a handle to the
/// store its code blob lives in.
///
/// Code is not part of the trie-encoded record. It is stored in the backing store keyed
/// by `keccak256(code)`, and the record only carries that hash.
#[derive(Debug, Clone)]
pub struct Account {
    /// The number of transactions sent from this account.
    pub nonce: U256,
    /// The account balance, in wei.
    pub balance: U256,
    /// The root of the account's storage trie.
    pub storage_root: B256,
    /// `keccak256` of the account's code.
    pub code_hash: B256,
    db: Db,
}

impl Account {
    /// Constructs an account from its four trie fields and a store handle.
    pub const fn new(
        nonce: U256,
        balance: U256,
        storage_root: B256,
        code_hash: B256,
        db: Db,
    ) -> Self {
        Self { nonce, balance, storage_root, code_hash, db }
    }

    /// Creates a blank account: zero nonce and balance, an empty storage trie, and
    /// empty code. The empty code blob is written into the store.
    pub fn blank(db: Db) -> Self {
        db.put(EMPTY_CODE_HASH.as_slice(), &[]);
        Self::new(U256::ZERO, U256::ZERO, EMPTY_ROOT_HASH, EMPTY_CODE_HASH, db)
    }

    /// The account's code, read from the store under [Self::code_hash].
    pub fn code(&self) -> Bytes {
        self.db.get(self.code_hash.as_slice()).map(Into::into).unwrap_or_default()
    }

    /// Replaces the account's code, updating [Self::code_hash] and writing the blob
    /// into the store.
    pub fn set_code(&mut self, code: Bytes) {
        self.code_hash = keccak256(&code);
        self.db.put(self.code_hash.as_slice(), &code);
    }

    /// Decodes the four-field record, binding it to `db` for code access.
    pub fn decode(buf: &mut &[u8], db: Db) -> alloy_rlp::Result<Self> {
        let header = alloy_rlp::Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let this = Self::new(
            U256::decode(buf)?,
            U256::decode(buf)?,
            B256::decode(buf)?,
            B256::decode(buf)?,
            db,
        );
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(this)
    }

    fn payload_length(&self) -> usize {
        self.nonce.length() +
            self.balance.length() +
            self.storage_root.length() +
            self.code_hash.length()
    }
}

impl Encodable for Account {
    fn encode(&self, out: &mut dyn BufMut) {
        let payload_length = self.payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.nonce.encode(out);
        self.balance.encode(out);
        self.storage_root.encode(out);
        self.code_hash.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.nonce == other.nonce &&
            self.balance == other.balance &&
            self.storage_root == other.storage_root &&
            self.code_hash == other.code_hash
    }
}

impl Eq for Account {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_account() {
        let db = Db::memory();
        let account = Account::blank(db.clone());
        assert_eq!(account.nonce, U256::ZERO);
        assert_eq!(account.balance, U256::ZERO);
        assert_eq!(account.storage_root, EMPTY_ROOT_HASH);
        assert_eq!(account.code_hash, EMPTY_CODE_HASH);
        assert_eq!(account.code(), Bytes::new());
        assert_eq!(db.get(EMPTY_CODE_HASH.as_slice()), Some(vec![]));
    }

    #[test]
    fn test_set_code_round_trips_through_store() {
        let db = Db::memory();
        let mut account = Account::blank(db.clone());
        let code = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00]);
        account.set_code(code.clone());
        assert_eq!(account.code_hash, keccak256(&code));
        assert_eq!(db.get(keccak256(&code).as_slice()), Some(code.to_vec()));
        assert_eq!(account.code(), code);
    }

    #[test]
    fn test_rlp_round_trip() {
        let db = Db::memory();
        let mut account = Account::blank(db.clone());
        account.nonce = U256::from(3u64);
        account.balance = U256::from(1_000_000u64);
        let encoded = alloy_rlp::encode(&account);
        let decoded = Account::decode(&mut encoded.as_slice(), db).unwrap();
        assert_eq!(decoded, account);
    }
}
