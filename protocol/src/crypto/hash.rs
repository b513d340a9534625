//! # Hashing Utilities
//!
//! The hash functions the parcel system uses, and nothing else:
//!
//! - **Keccak-256**: the default commitment hash. Wallets and front-ends
//!   built for EVM escrows already produce `keccak256(secret)`, so their
//!   commitments open here unchanged.
//!
//! - **SHA-256**: an alternative commitment scheme.
//!
//! - **BLAKE3**: internal identifiers: address derivation and domain
//!   separation. Also offered as an alternative commitment scheme for
//!   deployments that control both ends.
//!
//! All produce 32-byte digests.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use parcel_protocol::crypto::sha256;
///
/// let hash = sha256(b"parcel");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the Keccak-256 hash (the pre-standard SHA-3 padding used by EVM
/// chains, not FIPS-202 `SHA3-256`).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use parcel_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"parcel");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// `domain_separated_hash("a", x)` and `domain_separated_hash("b", x)` never
/// collide: the context string selects a different internal IV.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Hash multiple byte slices together without concatenating them first.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash, expected);
    }

    #[test]
    fn test_sha256_array_matches_vec() {
        let vec_result = sha256(b"test data");
        let arr_result = sha256_array(b"test data");
        assert_eq!(vec_result.as_slice(), arr_result.as_slice());
    }

    #[test]
    fn blake3_deterministic() {
        let a = blake3_hash(b"parcel");
        let b = blake3_hash(b"parcel");
        assert_eq!(a, b);
        assert_ne!(a, blake3_hash(b"Parcel"));
    }

    #[test]
    fn test_domain_separation() {
        let data = b"same data";
        let hash_a = domain_separated_hash("context-a", data);
        let hash_b = domain_separated_hash("context-b", data);
        assert_ne!(hash_a, hash_b);
        assert_ne!(hash_a, blake3_hash(data));
    }

    #[test]
    fn test_blake3_hash_multi() {
        let multi = blake3_hash_multi(&[b"hello", b" world"]);
        let single = blake3_hash(b"hello world");
        assert_eq!(multi, single);
    }
}
