//! # Contract Errors
//!
//! One error type for every contract entrypoint. A returned error leaves
//! ledgers, custody, lifecycle state and the event log untouched. The single
//! recorded side effect is the failed-attempt counter that `open` bumps
//! before returning [`ContractError::IncorrectSecret`].

use parcel_protocol::identity::Address;
use parcel_protocol::vault::LedgerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The contract is in the wrong lifecycle state for the requested call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum InvalidState {
    /// The parcel has been deployed but not initialized.
    #[error("parcel is not initialized")]
    Uninitialized,

    /// The parcel has not been locked yet.
    #[error("parcel is still open")]
    ParcelIsOpen,

    /// The parcel is locked; its contents and secret are frozen.
    #[error("parcel is locked")]
    ParcelIsLocked,

    /// The parcel has been emptied and accepts no further calls.
    #[error("parcel has already been emptied")]
    ParcelIsEmptied,
}

/// Errors returned by parcel and factory entrypoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The caller is not permitted to make this call.
    #[error("access denied")]
    AccessDenied,

    /// Wrong lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidState),

    /// `initialize` was called on a parcel that already has a sender.
    #[error("parcel is already initialized")]
    AlreadyInitialized,

    /// The presented secret does not hash to the stored commitment.
    #[error("incorrect secret")]
    IncorrectSecret,

    /// A downstream asset movement failed; the whole call was rolled back.
    #[error("transfer failed: {0}")]
    TransferFailed(LedgerError),

    /// The factory is paused and refuses to create parcels.
    #[error("factory is paused")]
    FactoryPaused,

    /// `pause` on a gate that is already paused.
    #[error("already paused")]
    AlreadyPaused,

    /// `unpause` on a gate that is not paused.
    #[error("not paused")]
    NotPaused,

    /// Ownership cannot be handed to the zero address; use renounce.
    #[error("new owner is the zero address")]
    ZeroAddress,

    /// A custody counter would exceed `u64::MAX`.
    #[error("amount overflow")]
    AmountOverflow,

    /// No parcel or factory lives at this address.
    #[error("no contract at {0}")]
    UnknownContract(Address),

    /// No token or collection lives at this address.
    #[error("no asset contract at {0}")]
    UnknownAsset(Address),
}

impl From<LedgerError> for ContractError {
    /// Lookups of missing assets surface as `UnknownAsset`; every other
    /// ledger failure is a failed transfer.
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownAsset(address) => ContractError::UnknownAsset(address),
            other => ContractError::TransferFailed(other),
        }
    }
}

impl ContractError {
    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::AccessDenied => "access_denied",
            ContractError::InvalidState(InvalidState::Uninitialized) => "uninitialized",
            ContractError::InvalidState(InvalidState::ParcelIsOpen) => "parcel_is_open",
            ContractError::InvalidState(InvalidState::ParcelIsLocked) => "parcel_is_locked",
            ContractError::InvalidState(InvalidState::ParcelIsEmptied) => "parcel_is_emptied",
            ContractError::AlreadyInitialized => "already_initialized",
            ContractError::IncorrectSecret => "incorrect_secret",
            ContractError::TransferFailed(_) => "transfer_failed",
            ContractError::FactoryPaused => "factory_paused",
            ContractError::AlreadyPaused => "already_paused",
            ContractError::NotPaused => "not_paused",
            ContractError::ZeroAddress => "zero_address",
            ContractError::AmountOverflow => "amount_overflow",
            ContractError::UnknownContract(_) => "unknown_contract",
            ContractError::UnknownAsset(_) => "unknown_asset",
        }
    }
}
