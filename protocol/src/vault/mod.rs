//! # Vault Module: Asset Ledgers
//!
//! The vault is where assets live outside of any parcel. Parcels hold a
//! *record* of what they custody; the assets themselves sit in these
//! ledgers under the parcel's address.
//!
//! ## Architecture
//!
//! ```text
//! balance.rs  Per-holder balance sheet (native currency, token balances)
//! token.rs    Fungible token: balances, allowances, transfer-on-behalf
//! nft.rs      NFT collection: ownership, approvals, safe-transfer hook
//! ledgers.rs  The bundle of all of the above, with atomic checkpoints
//! ```
//!
//! ## Design Principles
//!
//! 1. **All amounts are `u64` base units.** No floating point, no implicit
//!    decimals. `decimals` on a token is display metadata.
//! 2. **Checked arithmetic everywhere.** Overflow is an error, never a wrap.
//! 3. **Failed operations leave no trace.** Every method validates before it
//!    mutates, and [`Ledgers::atomically`] covers multi-step flows.
//! 4. **Serializable state.** Everything derives `Serialize`/`Deserialize`
//!    so an environment can be snapshotted.

pub mod balance;
pub mod ledgers;
pub mod nft;
pub mod token;

pub use balance::{BalanceError, BalanceSheet};
pub use ledgers::{LedgerError, Ledgers};
pub use nft::{NftCollection, NftError, NftReceiver, SafeTransferError};
pub use token::{FungibleToken, TokenError};
