//! The 15-field block header.

use crate::{
    codec::{decode_u256_fixed, encode_u256_fixed, U256_FIXED_LENGTH},
    constants::{
        EMPTY_LIST_HASH, EPOCH_LENGTH, GENESIS_COINBASE, GENESIS_DIFFICULTY, GENESIS_GAS_LIMIT,
        GENESIS_MIXHASH, GENESIS_PREVHASH, MAX_EXTRA_DATA_SIZE,
    },
    pow::{Ethash, EthashCacheLru},
    HeaderError,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256, U512};
use alloy_rlp::{BufMut, Decodable, Encodable};
use cinder_trie::EMPTY_ROOT_HASH;

/// A block header.
///
/// This is the wire snapshot of a block's metadata: the trie root fields hold whatever
/// the header carried on the wire. A live block answers root queries from its own
/// tries and rehydrates a header of this type on demand, so no back-reference from
/// header to block exists.
///
/// The PoW nonce is 8 bytes once sealed, and empty while a block is under
/// construction; the mixhash likewise may be empty until the block is sealed.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    /// Hash of the parent block.
    pub prev_hash: B256,
    /// `keccak256(rlp(uncle_headers))`.
    pub uncles_hash: B256,
    /// Address collecting the block reward.
    pub coinbase: Address,
    /// Root of the state trie.
    pub state_root: B256,
    /// Root of the transaction trie.
    pub tx_list_root: B256,
    /// Root of the receipts trie.
    pub receipts_root: B256,
    /// Union of the blooms of all receipts in the block.
    pub bloom: U256,
    /// The block's difficulty.
    pub difficulty: U256,
    /// Number of ancestors of this block; zero for genesis.
    pub number: u64,
    /// The block's gas limit.
    pub gas_limit: u64,
    /// Total gas used by all transactions in the block.
    pub gas_used: u64,
    /// UNIX timestamp of the block.
    pub timestamp: u64,
    /// Up to 1024 bytes of free-form data.
    pub extra_data: Bytes,
    /// The ethash mix digest; 32 bytes once sealed.
    pub mixhash: Bytes,
    /// The proof-of-work nonce; 8 bytes once sealed.
    pub nonce: Bytes,
    /// The hash this header was stored under, when it disagrees with the hash of the
    /// reserialized header. Pinned by the loader via [Self::pin_hash]; preferred by
    /// [Self::hash]. Not part of the wire encoding.
    pub stored_hash: Option<B256>,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            prev_hash: GENESIS_PREVHASH,
            uncles_hash: EMPTY_LIST_HASH,
            coinbase: GENESIS_COINBASE,
            state_root: EMPTY_ROOT_HASH,
            tx_list_root: EMPTY_ROOT_HASH,
            receipts_root: EMPTY_ROOT_HASH,
            bloom: U256::ZERO,
            difficulty: GENESIS_DIFFICULTY,
            number: 0,
            gas_limit: GENESIS_GAS_LIMIT,
            gas_used: 0,
            timestamp: 0,
            extra_data: Bytes::new(),
            mixhash: Bytes::copy_from_slice(GENESIS_MIXHASH.as_slice()),
            nonce: Bytes::new(),
            stored_hash: None,
        }
    }
}

impl BlockHeader {
    /// The header hash: `keccak256(rlp(header))`, unless a stored hash was pinned with
    /// [Self::pin_hash], which is then preferred.
    pub fn hash(&self) -> B256 {
        self.stored_hash.unwrap_or_else(|| keccak256(alloy_rlp::encode(self)))
    }

    /// Pins the hash this header was stored under as its canonical hash.
    ///
    /// Some persisted headers reserialize to bytes whose hash differs from their
    /// lookup key; the key wins.
    pub fn pin_hash(&mut self, hash: B256) {
        self.stored_hash = Some(hash);
    }

    /// The hash the proof-of-work is run over: `keccak256` of the header serialized
    /// without its mixhash and nonce.
    pub fn mining_hash(&self) -> B256 {
        let payload_length = self.mining_payload_length();
        let mut out = Vec::with_capacity(payload_length + 3);
        alloy_rlp::Header { list: true, payload_length }.encode(&mut out);
        self.encode_mining_fields(&mut out);
        keccak256(out)
    }

    /// The ethash seed of this block's epoch: 32 zero bytes hashed once per elapsed
    /// epoch.
    pub fn seed(&self) -> B256 {
        let mut seed = B256::ZERO;
        for _ in 0..self.number / EPOCH_LENGTH {
            seed = keccak256(seed);
        }
        seed
    }

    /// Checks the block's proof-of-work.
    ///
    /// ## Takes
    /// - `pow`: The ethash implementation.
    /// - `caches`: The memoized ethash caches.
    /// - `nonce`: If given, evaluated in place of the header's own nonce.
    ///
    /// ## Returns
    /// - `Ok(true)`: The mix digest matches and the result meets the difficulty target.
    /// - `Ok(false)`: The proof-of-work is invalid.
    /// - `Err(_)`: The header's mixhash or nonce has the wrong width.
    pub fn check_pow<E>(
        &self,
        pow: &E,
        caches: &EthashCacheLru,
        nonce: Option<&[u8]>,
    ) -> Result<bool, HeaderError>
    where
        E: Ethash + ?Sized,
    {
        if self.mixhash.len() != 32 || self.nonce.len() != 8 {
            return Err(HeaderError::BadSeal);
        }
        let nonce: [u8; 8] =
            nonce.unwrap_or(&self.nonce).try_into().map_err(|_| HeaderError::BadSeal)?;

        let header_hash = self.mining_hash();
        let cache = caches.get_or_create(pow, self.seed(), pow.cache_size(self.number));
        let output = pow.hashimoto_light(pow.full_size(self.number), &cache, header_hash, nonce);

        if output.mix_digest.as_slice() != &self.mixhash[..] {
            return Ok(false);
        }
        let result = U256::from_be_bytes(output.result.0);
        let difficulty = if self.difficulty.is_zero() { U256::ONE } else { self.difficulty };
        Ok(result.to::<U512>() * difficulty.to::<U512>() <= U512::ONE << 256)
    }

    fn encode_mining_fields(&self, out: &mut dyn BufMut) {
        self.prev_hash.encode(out);
        self.uncles_hash.encode(out);
        self.coinbase.encode(out);
        self.state_root.encode(out);
        self.tx_list_root.encode(out);
        self.receipts_root.encode(out);
        encode_u256_fixed(self.bloom, out);
        self.difficulty.encode(out);
        self.number.encode(out);
        self.gas_limit.encode(out);
        self.gas_used.encode(out);
        self.timestamp.encode(out);
        self.extra_data.encode(out);
    }

    fn mining_payload_length(&self) -> usize {
        self.prev_hash.length() +
            self.uncles_hash.length() +
            self.coinbase.length() +
            self.state_root.length() +
            self.tx_list_root.length() +
            self.receipts_root.length() +
            U256_FIXED_LENGTH +
            self.difficulty.length() +
            self.number.length() +
            self.gas_limit.length() +
            self.gas_used.length() +
            self.timestamp.length() +
            self.extra_data.length()
    }

    fn payload_length(&self) -> usize {
        self.mining_payload_length() + self.mixhash.length() + self.nonce.length()
    }
}

impl Encodable for BlockHeader {
    fn encode(&self, out: &mut dyn BufMut) {
        let payload_length = self.payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.encode_mining_fields(out);
        self.mixhash.encode(out);
        self.nonce.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for BlockHeader {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = alloy_rlp::Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let this = Self {
            prev_hash: B256::decode(buf)?,
            uncles_hash: B256::decode(buf)?,
            coinbase: Address::decode(buf)?,
            state_root: B256::decode(buf)?,
            tx_list_root: B256::decode(buf)?,
            receipts_root: B256::decode(buf)?,
            bloom: decode_u256_fixed(buf)?,
            difficulty: U256::decode(buf)?,
            number: u64::decode(buf)?,
            gas_limit: u64::decode(buf)?,
            gas_used: u64::decode(buf)?,
            timestamp: u64::decode(buf)?,
            extra_data: Bytes::decode(buf)?,
            mixhash: Bytes::decode(buf)?,
            nonce: Bytes::decode(buf)?,
            stored_hash: None,
        };
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        if this.extra_data.len() > MAX_EXTRA_DATA_SIZE {
            return Err(alloy_rlp::Error::Custom("extra data exceeds 1024 bytes"));
        }
        if !matches!(this.mixhash.len(), 0 | 32) {
            return Err(alloy_rlp::Error::Custom("mixhash must be empty or 32 bytes"));
        }
        if !matches!(this.nonce.len(), 0 | 8) {
            return Err(alloy_rlp::Error::Custom("nonce must be empty or 8 bytes"));
        }
        Ok(this)
    }
}

/// Two headers are equal iff they have the same hash.
impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for BlockHeader {}
