// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Parcel Contracts
//!
//! Single-use escrow parcels and the factory that produces them:
//!
//! - **Parcel**: a sealed container of native currency, tokens and NFTs,
//!   released in one atomic payout to whoever presents the committed secret.
//! - **Asset Custody**: the parcel's own record of what it holds.
//! - **Parcel Factory**: cheap parcel production from a shared template,
//!   behind an owner-controlled pause switch.
//! - **Runtime**: the in-process host that supplies caller identity,
//!   serializes calls per instance, and keeps the event log.
//!
//! ## Design Principles
//!
//! 1. Every custody counter uses checked arithmetic.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. An entrypoint that returns an error moves no assets and emits no
//!    events. Only a wrong secret is remembered, as a failed-attempt count.
//! 4. Ledger entries are zeroed before assets leave a parcel.

pub mod access;
pub mod custody;
pub mod error;
pub mod events;
pub mod parcel;
pub mod parcel_factory;
pub mod runtime;
pub mod template;

pub use access::AdminGate;
pub use custody::{AssetCustody, NftHolding};
pub use error::{ContractError, InvalidState};
pub use events::{ContractEvent, EventRecord};
pub use parcel::{Parcel, ParcelState, ParcelSummary, TokenBalance};
pub use parcel_factory::ParcelFactory;
pub use runtime::Runtime;
pub use template::ParcelTemplate;
