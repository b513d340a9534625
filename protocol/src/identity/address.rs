// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Addresses
//!
//! Every account and every contract in the parcel system is identified by a
//! 32-byte [`Address`]. Accounts get theirs from a label (test fixtures, CLI
//! users); contracts get theirs from the deployer and a nonce, the same way
//! CREATE derives contract addresses on EVM chains.
//!
//! The human-readable form is `0x` followed by 64 lowercase hex digits.
//! Parsing accepts the prefix or its absence, and either case.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ACCOUNT_ADDRESS_CONTEXT, ADDRESS_LENGTH, CONTRACT_ADDRESS_CONTEXT};
use crate::crypto::hash::{blake3_hash_multi, domain_separated_hash};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when parsing an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string is not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(String),

    /// The decoded bytes have the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Never derived from a label or a deployment, so
    /// it is safe to use as a "nobody" sentinel (e.g. a renounced owner).
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Derives a deterministic account address from a human label.
    ///
    /// `Address::from_label("alice")` is the same on every machine, which is
    /// what makes it useful for fixtures and for naming CLI accounts.
    pub fn from_label(label: &str) -> Self {
        Self(domain_separated_hash(
            ACCOUNT_ADDRESS_CONTEXT,
            label.as_bytes(),
        ))
    }

    /// Derives the address of the `nonce`-th contract deployed by `deployer`.
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        Self(blake3_hash_multi(&[
            CONTRACT_ADDRESS_CONTEXT.as_bytes(),
            deployer.as_bytes(),
            &nonce.to_be_bytes(),
        ]))
    }

    /// Returns `true` for [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Returns the `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses the hex form, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        decode_hex32(s).map(Self)
    }
}

/// Decodes an optionally `0x`-prefixed hex string into exactly 32 bytes.
pub(crate) fn decode_hex32(s: &str) -> Result<[u8; 32], AddressError> {
    let trimmed = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(AddressError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines and assertion output readable.
        write!(f, "Address(0x{}..)", &hex::encode(self.0)[..10])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != ADDRESS_LENGTH {
                return Err(serde::de::Error::custom(format!(
                    "expected {}-byte address, got {}",
                    ADDRESS_LENGTH,
                    bytes.len()
                )));
            }
            let mut out = [0u8; ADDRESS_LENGTH];
            out.copy_from_slice(&bytes);
            Ok(Address(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn labels_are_deterministic_and_distinct() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn contract_addresses_depend_on_nonce_and_deployer() {
        let deployer = Address::from_label("factory");
        let a = Address::derive_contract(&deployer, 0);
        let b = Address::derive_contract(&deployer, 1);
        let c = Address::derive_contract(&Address::from_label("other"), 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hex_parsing_accepts_prefix_and_case() {
        let addr = Address::from_label("carol");
        let hex_form = addr.to_hex();
        assert!(hex_form.starts_with("0x"));
        assert_eq!(hex_form.len(), 66);

        assert_eq!(Address::from_hex(&hex_form).unwrap(), addr);
        assert_eq!(Address::from_hex(&hex_form[2..]).unwrap(), addr);
        assert_eq!(
            Address::from_hex(&hex_form.to_uppercase().replacen("0X", "0x", 1)).unwrap(),
            addr
        );
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(
            Address::from_hex("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
        assert_eq!(
            Address::from_hex("0xabcd"),
            Err(AddressError::InvalidLength {
                expected: 32,
                got: 2
            })
        );
    }

    #[test]
    fn serializes_as_hex_string_and_works_as_map_key() {
        let addr = Address::from_label("dave");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));

        let mut map = HashMap::new();
        map.insert(addr, 7u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: HashMap<Address, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&addr), Some(&7));
    }
}
