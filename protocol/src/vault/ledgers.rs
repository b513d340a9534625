//! # Ledgers
//!
//! [`Ledgers`] bundles every asset the execution environment knows about:
//! the native currency balance sheet plus each deployed token and NFT
//! collection, keyed by address. Contracts never own this state. They get
//! `&mut Ledgers` for the duration of one entrypoint and move assets through
//! it.
//!
//! [`Ledgers::atomically`] is the transactional boundary. It checkpoints the
//! whole bundle, runs a closure, and restores the checkpoint if the closure
//! fails. A multi-asset payout either lands completely or not at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::balance::{BalanceError, BalanceSheet};
use super::nft::{NftCollection, NftError};
use super::token::{FungibleToken, TokenError};
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A downstream asset movement failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Nothing is deployed at this address.
    #[error("no asset contract at {0}")]
    UnknownAsset(Address),

    /// An asset contract already lives at this address.
    #[error("an asset contract is already deployed at {0}")]
    AlreadyDeployed(Address),

    /// Native currency movement failed.
    #[error("native transfer failed: {0}")]
    Native(#[from] BalanceError),

    /// Fungible token movement failed.
    #[error("token transfer failed: {0}")]
    Token(#[from] TokenError),

    /// NFT movement failed.
    #[error("nft transfer failed: {0}")]
    Nft(#[from] NftError),
}

// ---------------------------------------------------------------------------
// Ledgers
// ---------------------------------------------------------------------------

/// All asset state of one execution environment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledgers {
    native: BalanceSheet,
    tokens: HashMap<Address, FungibleToken>,
    collections: HashMap<Address, NftCollection>,
}

impl Ledgers {
    pub fn new() -> Self {
        Self::default()
    }

    // -- native currency ---------------------------------------------------

    pub fn native(&self) -> &BalanceSheet {
        &self.native
    }

    /// Faucet for native currency.
    pub fn mint_native(&mut self, to: &Address, amount: u64) -> Result<u64, LedgerError> {
        Ok(self.native.credit(to, amount)?)
    }

    pub fn native_balance(&self, holder: &Address) -> u64 {
        self.native.balance_of(holder)
    }

    pub fn transfer_native(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        Ok(self.native.transfer(from, to, amount)?)
    }

    // -- deployment --------------------------------------------------------

    /// Returns `true` if a token or collection lives at `address`.
    pub fn is_asset(&self, address: &Address) -> bool {
        self.tokens.contains_key(address) || self.collections.contains_key(address)
    }

    pub fn deploy_token(&mut self, token: FungibleToken) -> Result<Address, LedgerError> {
        let address = *token.address();
        if self.is_asset(&address) {
            return Err(LedgerError::AlreadyDeployed(address));
        }
        self.tokens.insert(address, token);
        Ok(address)
    }

    pub fn deploy_collection(&mut self, collection: NftCollection) -> Result<Address, LedgerError> {
        let address = *collection.address();
        if self.is_asset(&address) {
            return Err(LedgerError::AlreadyDeployed(address));
        }
        self.collections.insert(address, collection);
        Ok(address)
    }

    // -- lookups -----------------------------------------------------------

    pub fn token(&self, address: &Address) -> Result<&FungibleToken, LedgerError> {
        self.tokens
            .get(address)
            .ok_or(LedgerError::UnknownAsset(*address))
    }

    pub fn token_mut(&mut self, address: &Address) -> Result<&mut FungibleToken, LedgerError> {
        self.tokens
            .get_mut(address)
            .ok_or(LedgerError::UnknownAsset(*address))
    }

    pub fn collection(&self, address: &Address) -> Result<&NftCollection, LedgerError> {
        self.collections
            .get(address)
            .ok_or(LedgerError::UnknownAsset(*address))
    }

    pub fn collection_mut(&mut self, address: &Address) -> Result<&mut NftCollection, LedgerError> {
        self.collections
            .get_mut(address)
            .ok_or(LedgerError::UnknownAsset(*address))
    }

    pub fn token_addresses(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.tokens.keys().copied().collect();
        out.sort();
        out
    }

    pub fn collection_addresses(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.collections.keys().copied().collect();
        out.sort();
        out
    }

    // -- transactions ------------------------------------------------------

    /// Runs `f` against these ledgers; if it fails, every change it made is
    /// discarded.
    ///
    /// The checkpoint is a full clone, so cost scales with ledger size. The
    /// in-process runtime keeps ledgers small enough for that to be noise.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Ledgers) -> Result<T, E>,
    ) -> Result<T, E> {
        let checkpoint = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = checkpoint;
        }
        result
    }
}
