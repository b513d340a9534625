//! # Asset Custody
//!
//! The record a parcel keeps of what it holds. The assets themselves sit in
//! the [`Ledgers`](parcel_protocol::vault::Ledgers) under the parcel's
//! address. This ledger is the parcel's own accounting of them.
//!
//! Three asset classes are tracked separately:
//!
//! - native currency, a single accumulator;
//! - fungible tokens, one balance per token address;
//! - NFTs, an ordered list of `(collection, token_id)` holdings.
//!
//! Every credit is checked. Draining is all-at-once through
//! [`AssetCustody::take_all`], which leaves the custody zeroed before any
//! asset leaves the parcel.

use std::collections::BTreeMap;

use parcel_protocol::identity::Address;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// One NFT held in custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NftHolding {
    pub collection: Address,
    pub token_id: u64,
}

/// Per-parcel balances across the three asset classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCustody {
    native: u64,
    tokens: BTreeMap<Address, u64>,
    nfts: Vec<NftHolding>,
}

impl AssetCustody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn native_balance(&self) -> u64 {
        self.native
    }

    /// Recorded balance of `token`; zero if never deposited.
    pub fn token_balance(&self, token: &Address) -> u64 {
        self.tokens.get(token).copied().unwrap_or(0)
    }

    /// All recorded token balances, ordered by token address.
    pub fn token_balances(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.tokens.iter()
    }

    /// Number of distinct tokens with a record.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// NFT holdings in deposit order.
    pub fn nfts(&self) -> &[NftHolding] {
        &self.nfts
    }

    pub fn nft_count(&self) -> usize {
        self.nfts.len()
    }

    /// True when nothing of value is recorded.
    pub fn is_empty(&self) -> bool {
        self.native == 0 && self.tokens.values().all(|v| *v == 0) && self.nfts.is_empty()
    }

    /// Fails with `AmountOverflow` if `amount` more native units cannot be
    /// recorded. Does not mutate.
    pub fn check_native_credit(&self, amount: u64) -> Result<u64, ContractError> {
        self.native
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)
    }

    /// Same as [`check_native_credit`](Self::check_native_credit) for a token.
    pub fn check_token_credit(&self, token: &Address, amount: u64) -> Result<u64, ContractError> {
        self.token_balance(token)
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)
    }

    pub fn credit_native(&mut self, amount: u64) -> Result<u64, ContractError> {
        self.native = self.check_native_credit(amount)?;
        Ok(self.native)
    }

    pub fn credit_tokens(&mut self, token: &Address, amount: u64) -> Result<u64, ContractError> {
        let updated = self.check_token_credit(token, amount)?;
        self.tokens.insert(*token, updated);
        Ok(updated)
    }

    pub fn record_nft(&mut self, collection: &Address, token_id: u64) {
        self.nfts.push(NftHolding {
            collection: *collection,
            token_id,
        });
    }

    /// Zeroes every entry and returns what was recorded.
    pub fn take_all(&mut self) -> AssetCustody {
        std::mem::take(self)
    }

    /// Puts back a record previously returned by [`take_all`](Self::take_all).
    pub fn restore(&mut self, drained: AssetCustody) {
        *self = drained;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Address {
        Address::from_label("tkn")
    }

    #[test]
    fn fresh_custody_is_empty() {
        let c = AssetCustody::new();
        assert!(c.is_empty());
        assert_eq!(c.native_balance(), 0);
        assert_eq!(c.token_balance(&token()), 0);
        assert_eq!(c.nft_count(), 0);
    }

    #[test]
    fn credits_accumulate_per_class() {
        let mut c = AssetCustody::new();
        c.credit_native(3).unwrap();
        c.credit_native(4).unwrap();
        c.credit_tokens(&token(), 10).unwrap();
        c.credit_tokens(&token(), 5).unwrap();
        c.record_nft(&Address::from_label("nft"), 1);

        assert_eq!(c.native_balance(), 7);
        assert_eq!(c.token_balance(&token()), 15);
        assert_eq!(c.token_count(), 1);
        assert_eq!(c.nft_count(), c.nfts().len());
        assert!(!c.is_empty());
    }

    #[test]
    fn overflow_rejected_without_mutation() {
        let mut c = AssetCustody::new();
        c.credit_native(u64::MAX).unwrap();
        assert_eq!(c.credit_native(1), Err(ContractError::AmountOverflow));
        assert_eq!(c.native_balance(), u64::MAX);

        c.credit_tokens(&token(), u64::MAX).unwrap();
        assert_eq!(
            c.credit_tokens(&token(), 1),
            Err(ContractError::AmountOverflow)
        );
        assert_eq!(c.token_balance(&token()), u64::MAX);
    }

    #[test]
    fn take_all_zeroes_and_restore_undoes() {
        let mut c = AssetCustody::new();
        c.credit_native(9).unwrap();
        c.record_nft(&Address::from_label("nft"), 2);
        let before = c.clone();

        let drained = c.take_all();
        assert!(c.is_empty());
        assert_eq!(drained, before);

        c.restore(drained);
        assert_eq!(c, before);
    }
}
