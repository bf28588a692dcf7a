//! Thin adapters over the external RLP codec and keccak-256 hash.
//!
//! Integers go on the wire as minimal big-endian byte strings (zero is the empty
//! string) except where a field is declared fixed-width, in which case it is
//! zero-padded to its declared width and length-checked on decode.

use alloy_primitives::{keccak256, B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable};

/// `keccak256(rlp(value))`.
pub fn keccak_rlp<T: Encodable + ?Sized>(value: &T) -> B256 {
    keccak256(alloy_rlp::encode(value))
}

/// The RLP encoding of a transaction or receipt index, used as a trie key.
pub fn encode_index(index: u64) -> Vec<u8> {
    alloy_rlp::encode(index)
}

/// A storage slot index as a zero-padded 32-byte big-endian key.
pub fn storage_key(index: U256) -> [u8; 32] {
    index.to_be_bytes::<32>()
}

/// A big integer as minimal big-endian bytes; zero is the empty string.
pub fn encode_int_be(value: U256) -> Vec<u8> {
    value.to_be_bytes_trimmed_vec()
}

/// Decodes minimal big-endian bytes into a big integer. [None] if wider than 256 bits.
pub fn decode_int_be(bytes: &[u8]) -> Option<U256> {
    (bytes.len() <= 32).then(|| U256::from_be_slice(bytes))
}

/// Encodes a 256-bit integer as a fixed-width 32-byte string, the serialization used
/// for bloom fields.
pub fn encode_u256_fixed(value: U256, out: &mut dyn BufMut) {
    B256::from(value).encode(out)
}

/// Decodes a fixed-width 32-byte string into a 256-bit integer, rejecting any other
/// width.
pub fn decode_u256_fixed(buf: &mut &[u8]) -> alloy_rlp::Result<U256> {
    Ok(B256::decode(buf)?.into())
}

/// The encoded length of a fixed-width 256-bit integer field.
pub(crate) const U256_FIXED_LENGTH: usize = 33;

/// Splits one complete RLP item (header and payload) off the front of `buf` and
/// returns it raw.
pub fn take_rlp_item<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<&'a [u8]> {
    let start = *buf;
    let header = alloy_rlp::Header::decode(buf)?;
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    *buf = &buf[header.payload_length..];
    let consumed = start.len() - buf.len();
    Ok(&start[..consumed])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;

    #[test]
    fn test_encode_index_matches_int_encoding() {
        assert_eq!(encode_index(0), vec![0x80]);
        assert_eq!(encode_index(1), vec![0x01]);
        assert_eq!(encode_index(128), vec![0x81, 0x80]);
    }

    #[test]
    fn test_storage_key_zero_pads() {
        let key = storage_key(U256::from(0xabcdu64));
        assert_eq!(&key[..30], &[0u8; 30]);
        assert_eq!(&key[30..], &[0xab, 0xcd]);
    }

    #[test]
    fn test_int_be_round_trip() {
        assert_eq!(encode_int_be(U256::ZERO), Vec::<u8>::new());
        assert_eq!(decode_int_be(&[]), Some(U256::ZERO));
        let v = U256::from(1_000_000u64);
        assert_eq!(decode_int_be(&encode_int_be(v)), Some(v));
        assert_eq!(decode_int_be(&[0u8; 33]), None);
    }

    #[test]
    fn test_u256_fixed_is_32_bytes() {
        let mut out = Vec::new();
        encode_u256_fixed(U256::from(5u64), &mut out);
        assert_eq!(out.len(), U256_FIXED_LENGTH);
        assert_eq!(decode_u256_fixed(&mut out.as_slice()).unwrap(), U256::from(5u64));
    }

    #[test]
    fn test_take_rlp_item() {
        let mut buf = Vec::new();
        Bytes::from_static(b"dog").encode(&mut buf);
        Bytes::from_static(b"cat").encode(&mut buf);
        let mut slice = buf.as_slice();
        let first = take_rlp_item(&mut slice).unwrap();
        assert_eq!(first, &buf[..4]);
        let second = take_rlp_item(&mut slice).unwrap();
        assert_eq!(second, &buf[4..]);
        assert!(slice.is_empty());
    }
}
