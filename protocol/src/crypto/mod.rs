//! # Cryptographic Primitives
//!
//! Everything hash-shaped in the parcel system flows through here:
//!
//! - **hash**: thin wrappers around SHA-256 and BLAKE3.
//! - **commitment**: secret commitments and their constant-time check.
//!
//! No signatures, no encryption. Caller authentication belongs to the
//! execution platform, and parcels only ever compare digests.

pub mod commitment;
pub mod hash;

pub use commitment::{HashScheme, SecretHash};
pub use hash::{blake3_hash, domain_separated_hash, keccak256, sha256, sha256_array};
