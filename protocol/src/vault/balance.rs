//! # Balance Sheets
//!
//! A [`BalanceSheet`] maps holder addresses to `u64` amounts. The native
//! currency ledger is one balance sheet; every fungible token owns another.
//! The sheet enforces the two rules that make it a ledger: nobody goes
//! below zero, and nobody wraps past `u64::MAX`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during balance operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// Attempted to debit more than the available balance.
    #[error("insufficient balance for {holder}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The holder being debited.
        holder: Address,
        /// The current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// Arithmetic overflow during a credit operation.
    #[error("balance overflow for {holder}: current {current}, credit {credit}")]
    Overflow {
        /// The holder being credited.
        holder: Address,
        /// The balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

// ---------------------------------------------------------------------------
// BalanceSheet
// ---------------------------------------------------------------------------

/// Per-holder balances of a single asset.
///
/// Holders with a zero balance may or may not have an entry; callers must
/// not read meaning into presence. Thread safety is the owner's problem.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    balances: HashMap<Address, u64>,
    total: u64,
}

impl BalanceSheet {
    /// Creates an empty balance sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of `holder`, zero if unknown.
    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Sum of every balance on the sheet.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of holders with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| **b > 0).count()
    }

    /// Adds `amount` to `holder`, creating the sheet's supply.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::Overflow`] if either the holder's balance or
    /// the sheet total would exceed `u64::MAX`.
    pub fn credit(&mut self, holder: &Address, amount: u64) -> Result<u64, BalanceError> {
        let current = self.balance_of(holder);
        let overflow = BalanceError::Overflow {
            holder: *holder,
            current,
            credit: amount,
        };
        let new_amount = current.checked_add(amount).ok_or(overflow.clone())?;
        let new_total = self.total.checked_add(amount).ok_or(overflow)?;

        self.balances.insert(*holder, new_amount);
        self.total = new_total;
        Ok(new_amount)
    }

    /// Removes `amount` from `holder`, destroying that much supply.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::InsufficientBalance`] if the holder has less
    /// than `amount`.
    pub fn debit(&mut self, holder: &Address, amount: u64) -> Result<u64, BalanceError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(BalanceError::InsufficientBalance {
                holder: *holder,
                available,
                requested: amount,
            });
        }

        let remaining = available - amount;
        self.balances.insert(*holder, remaining);
        self.total -= amount;
        Ok(remaining)
    }

    /// Moves `amount` from one holder to another.
    ///
    /// Supply is unchanged. A self-transfer still requires the balance to be
    /// present, so it fails the same way a real transfer would.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), BalanceError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(BalanceError::InsufficientBalance {
                holder: *from,
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let receiving = self.balance_of(to);
        let credited = receiving
            .checked_add(amount)
            .ok_or(BalanceError::Overflow {
                holder: *to,
                current: receiving,
                credit: amount,
            })?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    #[test]
    fn credit_accumulates() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), 500).unwrap();
        sheet.credit(&alice(), 300).unwrap();
        assert_eq!(sheet.balance_of(&alice()), 800);
        assert_eq!(sheet.total(), 800);
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), u64::MAX).unwrap();
        let result = sheet.credit(&alice(), 1);
        assert!(matches!(result, Err(BalanceError::Overflow { .. })));
        assert_eq!(sheet.balance_of(&alice()), u64::MAX);
    }

    #[test]
    fn debit_insufficient_balance_rejected() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), 100).unwrap();
        let result = sheet.debit(&alice(), 200);
        assert!(matches!(
            result,
            Err(BalanceError::InsufficientBalance {
                available: 100,
                requested: 200,
                ..
            })
        ));
    }

    #[test]
    fn transfer_moves_funds_and_keeps_total() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), 1_000).unwrap();
        sheet.transfer(&alice(), &bob(), 400).unwrap();

        assert_eq!(sheet.balance_of(&alice()), 600);
        assert_eq!(sheet.balance_of(&bob()), 400);
        assert_eq!(sheet.total(), 1_000);
        assert_eq!(sheet.holder_count(), 2);
    }

    #[test]
    fn transfer_without_funds_leaves_sheet_untouched() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), 10).unwrap();
        assert!(sheet.transfer(&alice(), &bob(), 11).is_err());
        assert_eq!(sheet.balance_of(&alice()), 10);
        assert_eq!(sheet.balance_of(&bob()), 0);
    }

    #[test]
    fn self_transfer_is_a_checked_noop() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), 10).unwrap();
        sheet.transfer(&alice(), &alice(), 10).unwrap();
        assert_eq!(sheet.balance_of(&alice()), 10);
        assert!(sheet.transfer(&alice(), &alice(), 11).is_err());
    }

    #[test]
    fn balance_sheet_serialization_roundtrip() {
        let mut sheet = BalanceSheet::new();
        sheet.credit(&alice(), 42).unwrap();

        let json = serde_json::to_string(&sheet).expect("serialize");
        let recovered: BalanceSheet = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.balance_of(&alice()), 42);
        assert_eq!(recovered.total(), 42);
    }
}
