// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Parcel Protocol: Core Library
//!
//! The ground the parcel contracts stand on: who is calling, how secrets are
//! committed, and where assets actually live.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants and defaults.
//! - **crypto**: SHA-256/BLAKE3 wrappers and secret commitments.
//! - **identity**: 32-byte addresses for accounts and contracts.
//! - **vault**: Native currency, fungible tokens, NFT collections, and the
//!   atomic [`Ledgers`](vault::Ledgers) bundle that holds them.
//!
//! ## Design Philosophy
//!
//! 1. Assets move only through checked, fallible operations.
//! 2. A failed operation leaves every ledger exactly as it found it.
//! 3. If it touches money, it has tests.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod vault;
