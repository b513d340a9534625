//! # Parcel Contract
//!
//! A single-use escrow. The sender fills it with native currency, tokens
//! and NFTs, seals it, and hands a secret to someone off-chain. Whoever
//! presents a secret matching the stored commitment receives everything.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──initialize──▶ Open ──lock──▶ Locked ──open(secret)──▶ Emptied
//! ```
//!
//! Transitions only move forward. `Emptied` is terminal but still
//! queryable.
//!
//! ## Authorization
//!
//! | Call                                  | State  | Caller                      |
//! |---------------------------------------|--------|-----------------------------|
//! | `initialize`                          | Uninit | anyone, once                |
//! | deposits (native, tokens, NFT hook)   | Open   | sender, or anyone if communal |
//! | `lock`, `make_communal`, `update_hashed_secret` | Open | sender             |
//! | `open`                                | Locked | anyone holding the secret   |
//!
//! State is checked before the caller, so every call on an emptied parcel
//! fails with `ParcelIsEmptied` no matter who makes it.
//!
//! ## Release
//!
//! [`Parcel::open`] zeroes the custody record before any asset moves, then
//! pays out inside [`Ledgers::atomically`]. If any transfer fails the
//! ledgers are restored, the custody record is put back, and the parcel
//! stays `Locked`.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parcel_protocol::crypto::SecretHash;
use parcel_protocol::identity::Address;
use parcel_protocol::vault::{LedgerError, Ledgers, NftReceiver};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::custody::{AssetCustody, NftHolding};
use crate::error::{ContractError, InvalidState};
use crate::events::ContractEvent;
use crate::template::ParcelTemplate;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle state of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParcelState {
    Uninitialized,
    Open,
    Locked,
    Emptied,
}

impl fmt::Display for ParcelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParcelState::Uninitialized => write!(f, "Uninitialized"),
            ParcelState::Open => write!(f, "Open"),
            ParcelState::Locked => write!(f, "Locked"),
            ParcelState::Emptied => write!(f, "Emptied"),
        }
    }
}

/// Serializable snapshot of a parcel, for views and the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelSummary {
    pub address: Address,
    pub state: ParcelState,
    pub sender: Option<Address>,
    pub communal: bool,
    pub hashed_secret: Option<SecretHash>,
    pub template: String,
    pub native_balance: u64,
    pub tokens: Vec<TokenBalance>,
    pub nfts: Vec<NftHolding>,
    pub nft_count: usize,
    pub failed_open_attempts: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token: Address,
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// Parcel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Parcel {
    address: Address,
    template: Arc<ParcelTemplate>,
    state: ParcelState,
    sender: Option<Address>,
    hashed_secret: Option<SecretHash>,
    communal: bool,
    custody: AssetCustody,
    failed_open_attempts: u64,
    created_at: DateTime<Utc>,
    pending_events: Vec<ContractEvent>,
}

impl Parcel {
    /// A freshly deployed, uninitialized parcel at `address`.
    pub fn new(address: Address, template: Arc<ParcelTemplate>) -> Self {
        Self {
            address,
            template,
            state: ParcelState::Uninitialized,
            sender: None,
            hashed_secret: None,
            communal: false,
            custody: AssetCustody::new(),
            failed_open_attempts: 0,
            created_at: Utc::now(),
            pending_events: Vec::new(),
        }
    }

    // -- entrypoints -------------------------------------------------------

    /// Sets sender and commitment and opens the parcel. Callable once.
    pub fn initialize(
        &mut self,
        hashed_secret: SecretHash,
        sender: Address,
    ) -> Result<(), ContractError> {
        if self.state != ParcelState::Uninitialized {
            return Err(ContractError::AlreadyInitialized);
        }

        self.sender = Some(sender);
        self.hashed_secret = Some(hashed_secret);
        self.communal = self.template.communal_by_default;
        self.state = ParcelState::Open;
        self.pending_events.push(ContractEvent::Initialized { sender });

        info!(parcel = %self.address, sender = %sender, "parcel initialized");
        Ok(())
    }

    /// Moves `amount` native units from `caller` into the parcel.
    ///
    /// Returns the parcel's new native balance.
    pub fn deposit_native(
        &mut self,
        caller: &Address,
        amount: u64,
        ledgers: &mut Ledgers,
    ) -> Result<u64, ContractError> {
        self.ensure_open()?;
        self.ensure_may_deposit(caller)?;
        self.custody.check_native_credit(amount)?;

        ledgers
            .transfer_native(caller, &self.address, amount)
            .map_err(ContractError::TransferFailed)?;
        let balance = self.custody.credit_native(amount)?;

        debug!(parcel = %self.address, caller = %caller, amount, "native deposit");
        Ok(balance)
    }

    /// Pulls `amount` of `token` from `caller` using the allowance the caller
    /// granted this parcel.
    ///
    /// Returns the parcel's new balance of that token.
    pub fn add_tokens(
        &mut self,
        caller: &Address,
        token: &Address,
        amount: u64,
        ledgers: &mut Ledgers,
    ) -> Result<u64, ContractError> {
        self.ensure_open()?;
        self.ensure_may_deposit(caller)?;
        self.custody.check_token_credit(token, amount)?;

        let this = self.address;
        ledgers
            .token_mut(token)
            .and_then(|t| {
                t.transfer_from(&this, caller, &this, amount)
                    .map_err(LedgerError::from)
            })
            .map_err(ContractError::TransferFailed)?;
        let balance = self.custody.credit_tokens(token, amount)?;

        debug!(parcel = %self.address, caller = %caller, token = %token, amount, "token deposit");
        Ok(balance)
    }

    /// Seals the parcel. No more deposits, no more secret changes.
    pub fn lock(&mut self, caller: &Address) -> Result<(), ContractError> {
        self.ensure_open()?;
        self.ensure_sender(caller)?;

        self.state = ParcelState::Locked;
        info!(
            parcel = %self.address,
            native = self.custody.native_balance(),
            tokens = self.custody.token_count(),
            nfts = self.custody.nft_count(),
            "parcel locked"
        );
        Ok(())
    }

    /// Lets anyone deposit from now on. There is no way back.
    pub fn make_communal(&mut self, caller: &Address) -> Result<(), ContractError> {
        self.ensure_open()?;
        self.ensure_sender(caller)?;

        self.communal = true;
        debug!(parcel = %self.address, "parcel made communal");
        Ok(())
    }

    pub fn update_hashed_secret(
        &mut self,
        caller: &Address,
        new_hash: SecretHash,
    ) -> Result<(), ContractError> {
        self.ensure_open()?;
        self.ensure_sender(caller)?;

        self.hashed_secret = Some(new_hash);
        debug!(parcel = %self.address, "hashed secret updated");
        Ok(())
    }

    /// Releases everything to `caller` if `secret` matches the commitment.
    ///
    /// Returns the custody record that was paid out.
    ///
    /// # Errors
    ///
    /// - [`InvalidState`] unless the parcel is `Locked`.
    /// - [`ContractError::IncorrectSecret`] on mismatch. The attempt is
    ///   counted, nothing else changes, and the caller may retry.
    /// - [`ContractError::TransferFailed`] if any payout fails. Nothing moves
    ///   and the parcel stays `Locked`.
    pub fn open(
        &mut self,
        caller: &Address,
        secret: &[u8],
        ledgers: &mut Ledgers,
    ) -> Result<AssetCustody, ContractError> {
        self.ensure_locked()?;

        let matches = self
            .hashed_secret
            .map(|h| h.matches(self.template.hash_scheme, secret))
            .unwrap_or(false);
        if !matches {
            self.failed_open_attempts = self.failed_open_attempts.saturating_add(1);
            warn!(
                parcel = %self.address,
                caller = %caller,
                attempts = self.failed_open_attempts,
                "open attempt with incorrect secret"
            );
            return Err(ContractError::IncorrectSecret);
        }

        let drained = self.custody.take_all();
        let this = self.address;
        let paid = ledgers.atomically(|l| pay_out(l, &this, caller, &drained));

        if let Err(cause) = paid {
            self.custody.restore(drained);
            warn!(parcel = %self.address, caller = %caller, error = %cause, "release rolled back");
            return Err(ContractError::TransferFailed(cause));
        }

        self.state = ParcelState::Emptied;
        self.pending_events
            .push(ContractEvent::ParcelEmptied { recipient: *caller });
        info!(
            parcel = %self.address,
            recipient = %caller,
            native = drained.native_balance(),
            tokens = drained.token_count(),
            nfts = drained.nft_count(),
            "parcel emptied"
        );
        Ok(drained)
    }

    // -- views -------------------------------------------------------------

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn state(&self) -> ParcelState {
        self.state
    }

    /// `None` until initialized.
    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    pub fn hashed_secret(&self) -> Option<SecretHash> {
        self.hashed_secret
    }

    pub fn is_communal(&self) -> bool {
        self.communal
    }

    pub fn native_balance(&self) -> u64 {
        self.custody.native_balance()
    }

    pub fn token_balance_of(&self, token: &Address) -> u64 {
        self.custody.token_balance(token)
    }

    pub fn balance_of_nfts(&self) -> usize {
        self.custody.nft_count()
    }

    pub fn custody(&self) -> &AssetCustody {
        &self.custody
    }

    /// Wrong secrets presented so far. Informational; never blocks a retry.
    pub fn failed_open_attempts(&self) -> u64 {
        self.failed_open_attempts
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn template(&self) -> &ParcelTemplate {
        &self.template
    }

    pub fn summary(&self) -> ParcelSummary {
        ParcelSummary {
            address: self.address,
            state: self.state,
            sender: self.sender,
            communal: self.communal,
            hashed_secret: self.hashed_secret,
            template: self.template.label.clone(),
            native_balance: self.custody.native_balance(),
            tokens: self
                .custody
                .token_balances()
                .map(|(token, amount)| TokenBalance {
                    token: *token,
                    amount: *amount,
                })
                .collect(),
            nfts: self.custody.nfts().to_vec(),
            nft_count: self.custody.nft_count(),
            failed_open_attempts: self.failed_open_attempts,
            created_at: self.created_at,
        }
    }

    /// Drains the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // -- guards ------------------------------------------------------------

    fn ensure_open(&self) -> Result<(), ContractError> {
        match self.state {
            ParcelState::Open => Ok(()),
            ParcelState::Uninitialized => Err(InvalidState::Uninitialized.into()),
            ParcelState::Locked => Err(InvalidState::ParcelIsLocked.into()),
            ParcelState::Emptied => Err(InvalidState::ParcelIsEmptied.into()),
        }
    }

    fn ensure_locked(&self) -> Result<(), ContractError> {
        match self.state {
            ParcelState::Locked => Ok(()),
            ParcelState::Uninitialized => Err(InvalidState::Uninitialized.into()),
            ParcelState::Open => Err(InvalidState::ParcelIsOpen.into()),
            ParcelState::Emptied => Err(InvalidState::ParcelIsEmptied.into()),
        }
    }

    fn ensure_sender(&self, caller: &Address) -> Result<(), ContractError> {
        if self.sender != Some(*caller) {
            return Err(ContractError::AccessDenied);
        }
        Ok(())
    }

    /// The parcel itself never counts as a depositor: a self-transfer moves
    /// nothing on the ledger but would still be credited to custody.
    fn ensure_may_deposit(&self, depositor: &Address) -> Result<(), ContractError> {
        if *depositor == self.address {
            return Err(ContractError::AccessDenied);
        }
        if self.communal {
            return Ok(());
        }
        self.ensure_sender(depositor)
    }
}

/// Transfers every recorded asset from the parcel to `recipient`.
fn pay_out(
    ledgers: &mut Ledgers,
    parcel: &Address,
    recipient: &Address,
    contents: &AssetCustody,
) -> Result<(), LedgerError> {
    if contents.native_balance() > 0 {
        ledgers.transfer_native(parcel, recipient, contents.native_balance())?;
    }
    for (token, amount) in contents.token_balances() {
        ledgers.token_mut(token)?.transfer(parcel, recipient, *amount)?;
    }
    for holding in contents.nfts() {
        ledgers
            .collection_mut(&holding.collection)?
            .transfer_from(parcel, parcel, recipient, holding.token_id)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// NFT deposits
// ---------------------------------------------------------------------------

impl NftReceiver for Parcel {
    type Error = ContractError;

    /// Accepts the NFT if the parcel is open and `from` may deposit.
    fn on_nft_received(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        token_id: u64,
    ) -> Result<(), ContractError> {
        self.ensure_open()?;
        self.ensure_may_deposit(from)?;

        self.custody.record_nft(collection, token_id);
        debug!(
            parcel = %self.address,
            collection = %collection,
            operator = %operator,
            from = %from,
            token_id,
            "nft deposit"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
