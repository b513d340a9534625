// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Secret Commitments
//!
//! A parcel never stores its secret, only a [`SecretHash`] of it. Whoever
//! later presents a preimage that hashes to the stored value may open the
//! parcel. The comparison runs in constant time so a guesser learns nothing
//! from how long a rejection takes.
//!
//! Which hash function produced a commitment is recorded separately as a
//! [`HashScheme`]. Parcels get theirs from the factory template, so one
//! deployment never mixes schemes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

use super::hash::{blake3_hash, keccak256, sha256_array};
use crate::identity::address::{decode_hex32, AddressError};

// ---------------------------------------------------------------------------
// HashScheme
// ---------------------------------------------------------------------------

/// The one-way function used to turn a secret into its commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// Keccak-256, as produced by EVM tooling's `keccak256(secret)`.
    #[default]
    Keccak256,
    /// SHA-256.
    Sha256,
    /// BLAKE3.
    Blake3,
}

impl HashScheme {
    /// Hashes `secret` under this scheme.
    pub fn digest(&self, secret: &[u8]) -> [u8; 32] {
        match self {
            HashScheme::Keccak256 => keccak256(secret),
            HashScheme::Sha256 => sha256_array(secret),
            HashScheme::Blake3 => blake3_hash(secret),
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashScheme::Keccak256 => write!(f, "keccak256"),
            HashScheme::Sha256 => write!(f, "sha256"),
            HashScheme::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for HashScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak-256" | "keccak" => Ok(HashScheme::Keccak256),
            "sha256" | "sha-256" => Ok(HashScheme::Sha256),
            "blake3" => Ok(HashScheme::Blake3),
            other => Err(format!("unknown hash scheme: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// SecretHash
// ---------------------------------------------------------------------------

/// A 32-byte commitment to a parcel secret.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecretHash([u8; 32]);

impl SecretHash {
    /// Wraps a precomputed digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Computes the commitment to `secret` under `scheme`.
    ///
    /// # Example
    ///
    /// ```
    /// use parcel_protocol::crypto::{HashScheme, SecretHash};
    ///
    /// let commitment = SecretHash::commit(HashScheme::Sha256, b"s1");
    /// assert!(commitment.matches(HashScheme::Sha256, b"s1"));
    /// assert!(!commitment.matches(HashScheme::Sha256, b"s2"));
    /// ```
    pub fn commit(scheme: HashScheme, secret: &[u8]) -> Self {
        Self(scheme.digest(secret))
    }

    /// Returns `true` when `secret` hashes to this commitment.
    ///
    /// Constant-time in the digest comparison.
    pub fn matches(&self, scheme: HashScheme, secret: &[u8]) -> bool {
        let computed = scheme.digest(secret);
        computed.as_slice().ct_eq(self.0.as_slice()).into()
    }

    /// Returns the raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses the hex form, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        decode_hex32(s).map(Self)
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretHash(0x{}..)", &hex::encode(self.0)[..10])
    }
}

impl FromStr for SecretHash {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for SecretHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SecretHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SecretHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
