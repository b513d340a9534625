//! # Fungible Tokens
//!
//! An ERC-20-shaped ledger: balances, allowances, and the transfer-on-behalf
//! primitive ([`FungibleToken::transfer_from`]) that parcels use to pull
//! deposits out of a depositor's wallet.
//!
//! Tokens can be frozen. A frozen token refuses every balance movement,
//! which is how an issuer halts an asset and how tests make a downstream
//! transfer fail on demand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::balance::{BalanceError, BalanceSheet};
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// A balance operation failed (insufficient funds, overflow).
    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// The spender's allowance does not cover the transfer.
    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}'s tokens, requested {requested}")]
    InsufficientAllowance {
        /// The token holder.
        owner: Address,
        /// The account trying to spend.
        spender: Address,
        /// Remaining allowance.
        allowance: u64,
        /// Amount the spender tried to move.
        requested: u64,
    },

    /// The token is frozen and refuses movements.
    #[error("token {token} is frozen: {reason}")]
    Frozen {
        /// The frozen token.
        token: Address,
        /// Why it was frozen.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// FungibleToken
// ---------------------------------------------------------------------------

/// A fungible token deployed at `address`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FungibleToken {
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    balances: BalanceSheet,
    /// `owner -> (spender -> remaining allowance)`.
    allowances: HashMap<Address, HashMap<Address, u64>>,
    frozen: Option<String>,
}

impl FungibleToken {
    /// Creates a token with zero supply.
    pub fn new(address: Address, name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            balances: BalanceSheet::new(),
            allowances: HashMap::new(),
            frozen: None,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u64 {
        self.balances.total()
    }

    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.balances.balance_of(holder)
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Creates `amount` new tokens for `to`. This is the faucet; issuance
    /// policy is not modelled.
    pub fn mint(&mut self, to: &Address, amount: u64) -> Result<u64, TokenError> {
        Ok(self.balances.credit(to, amount)?)
    }

    /// Sets (not increments) the allowance of `spender` over `owner`'s tokens.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u64) {
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
    }

    /// Moves the caller's own tokens.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), TokenError> {
        self.ensure_not_frozen()?;
        self.balances.transfer(from, to, amount)?;
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// The allowance is only consumed once the balance transfer has
    /// succeeded, so a failed pull leaves both untouched.
    ///
    /// # Errors
    ///
    /// [`TokenError::Frozen`], [`TokenError::InsufficientAllowance`], or a
    /// wrapped [`BalanceError`].
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        self.ensure_not_frozen()?;

        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                allowance,
                requested: amount,
            });
        }

        self.balances.transfer(from, to, amount)?;
        self.approve(from, spender, allowance - amount);
        Ok(())
    }

    /// Halts all movements until [`unfreeze`](Self::unfreeze).
    pub fn freeze(&mut self, reason: &str) {
        self.frozen = Some(reason.to_string());
    }

    pub fn unfreeze(&mut self) {
        self.frozen = None;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    fn ensure_not_frozen(&self) -> Result<(), TokenError> {
        match &self.frozen {
            Some(reason) => Err(TokenError::Frozen {
                token: self.address,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}
