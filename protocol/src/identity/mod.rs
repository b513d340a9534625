//! # Identity Module
//!
//! Caller identity for the parcel system. The execution environment hands
//! every entrypoint the [`Address`] of whoever invoked it; contracts compare
//! that address against the roles they store (sender, owner) and never see
//! key material.
//!
//! Signature verification is the platform's job, not ours. By the time an
//! address reaches a contract it is trusted.

pub mod address;

pub use address::{Address, AddressError};
