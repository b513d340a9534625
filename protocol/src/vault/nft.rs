//! # Non-Fungible Token Collections
//!
//! An ERC-721-shaped registry: sequential token ids, one owner per id,
//! per-token approvals and operator approvals.
//!
//! ## Safe transfers and the receiver hook
//!
//! [`NftCollection::safe_transfer_from`] moves ownership and then asks the
//! receiving contract whether it accepts custody by calling its
//! [`NftReceiver::on_nft_received`] hook. A rejection undoes the move, so
//! the transfer as a whole fails. This is how a parcel refuses NFTs from
//! strangers or after it has been sealed. The rejection is not a silent
//! no-op.
//!
//! Plain [`transfer_from`](NftCollection::transfer_from) skips the hook; it
//! is what a contract uses to push an NFT out to an account.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FIRST_NFT_TOKEN_ID;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the collection itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NftError {
    /// No token with this id has been minted.
    #[error("token #{0} does not exist")]
    UnknownToken(u64),

    /// `from` does not own the token.
    #[error("token #{token_id} is owned by {owner}, not {claimed}")]
    NotOwner {
        /// The token in question.
        token_id: u64,
        /// Its actual owner.
        owner: Address,
        /// The address that claimed ownership.
        claimed: Address,
    },

    /// The operator is neither owner, approved, nor an approved operator.
    #[error("{operator} is not authorized to move token #{token_id}")]
    NotAuthorized {
        /// The account attempting the move.
        operator: Address,
        /// The token in question.
        token_id: u64,
    },

    /// Transfers to the zero address are burns, which are not supported.
    #[error("cannot transfer token #{0} to the zero address")]
    ZeroRecipient(u64),

    /// The id counter is exhausted.
    #[error("token id space exhausted")]
    IdOverflow,

    /// The collection is frozen and refuses movements.
    #[error("collection {collection} is frozen: {reason}")]
    Frozen {
        /// The frozen collection.
        collection: Address,
        /// Why it was frozen.
        reason: String,
    },
}

/// Failure of a safe transfer: either the collection refused the move or
/// the receiving contract rejected custody.
#[derive(Debug, Error)]
pub enum SafeTransferError<E: std::error::Error + 'static> {
    /// The collection refused the transfer before the hook ran.
    #[error(transparent)]
    Registry(#[from] NftError),

    /// The receiver's hook rejected the token; ownership was restored.
    #[error("receiver rejected the token: {0}")]
    Rejected(#[source] E),
}

// ---------------------------------------------------------------------------
// Receiver hook
// ---------------------------------------------------------------------------

/// Implemented by contracts that can take custody of NFTs.
pub trait NftReceiver {
    /// The receiver's own error type, surfaced unchanged on rejection.
    type Error: std::error::Error + 'static;

    /// Called after ownership of `token_id` in `collection` has moved to the
    /// receiver. `operator` initiated the transfer; `from` was the previous
    /// owner. Returning an error aborts the transfer.
    fn on_nft_received(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        token_id: u64,
    ) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// NftCollection
// ---------------------------------------------------------------------------

/// An NFT collection deployed at `address`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NftCollection {
    address: Address,
    name: String,
    symbol: String,
    next_id: u64,
    owners: BTreeMap<u64, Address>,
    token_approvals: HashMap<u64, Address>,
    operator_approvals: HashMap<Address, HashSet<Address>>,
    frozen: Option<String>,
}

impl NftCollection {
    /// Creates an empty collection.
    pub fn new(address: Address, name: &str, symbol: &str) -> Self {
        Self {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            next_id: FIRST_NFT_TOKEN_ID,
            owners: BTreeMap::new(),
            token_approvals: HashMap::new(),
            operator_approvals: HashMap::new(),
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

    /// Mints the next token id to `to` and returns it.
    pub fn mint(&mut self, to: &Address) -> Result<u64, NftError> {
        let token_id = self.next_id;
        if to.is_zero() {
            return Err(NftError::ZeroRecipient(token_id));
        }
        self.next_id = token_id.checked_add(1).ok_or(NftError::IdOverflow)?;
        self.owners.insert(token_id, *to);
        Ok(token_id)
    }

    /// Current owner of `token_id`, if minted.
    pub fn owner_of(&self, token_id: u64) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    /// Number of tokens held by `holder`.
    pub fn balance_of(&self, holder: &Address) -> usize {
        self.owners.values().filter(|o| *o == holder).count()
    }

    /// Ids held by `holder`, ascending.
    pub fn tokens_of(&self, holder: &Address) -> Vec<u64> {
        self.owners
            .iter()
            .filter(|(_, o)| *o == holder)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of tokens minted so far.
    pub fn total_minted(&self) -> usize {
        self.owners.len()
    }

    /// Approves `approved` to move `token_id`. Only the owner or one of the
    /// owner's operators may approve.
    pub fn approve(
        &mut self,
        caller: &Address,
        approved: &Address,
        token_id: u64,
    ) -> Result<(), NftError> {
        let owner = self
            .owner_of(token_id)
            .ok_or(NftError::UnknownToken(token_id))?;
        if *caller != owner && !self.is_approved_for_all(&owner, caller) {
            return Err(NftError::NotAuthorized {
                operator: *caller,
                token_id,
            });
        }
        self.token_approvals.insert(token_id, *approved);
        Ok(())
    }

    pub fn get_approved(&self, token_id: u64) -> Option<Address> {
        self.token_approvals.get(&token_id).copied()
    }

    /// Grants or revokes `operator` control over all of `owner`'s tokens.
    pub fn set_approval_for_all(&mut self, owner: &Address, operator: &Address, approved: bool) {
        let operators = self.operator_approvals.entry(*owner).or_default();
        if approved {
            operators.insert(*operator);
        } else {
            operators.remove(operator);
        }
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operator_approvals
            .get(owner)
            .map(|ops| ops.contains(operator))
            .unwrap_or(false)
    }

    /// Moves `token_id` from `from` to `to` without consulting the receiver.
    pub fn transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: u64,
    ) -> Result<(), NftError> {
        self.ensure_not_frozen()?;

        let owner = self
            .owner_of(token_id)
            .ok_or(NftError::UnknownToken(token_id))?;
        if owner != *from {
            return Err(NftError::NotOwner {
                token_id,
                owner,
                claimed: *from,
            });
        }
        let authorized = *operator == owner
            || self.get_approved(token_id) == Some(*operator)
            || self.is_approved_for_all(&owner, operator);
        if !authorized {
            return Err(NftError::NotAuthorized {
                operator: *operator,
                token_id,
            });
        }
        if to.is_zero() {
            return Err(NftError::ZeroRecipient(token_id));
        }

        self.token_approvals.remove(&token_id);
        self.owners.insert(token_id, *to);
        Ok(())
    }

    /// Moves `token_id` and then runs the receiver hook, if the recipient is
    /// a contract. A rejected hook restores ownership and approval.
    ///
    /// Pass `None` when `to` is an account that cannot reject custody.
    pub fn safe_transfer_from<R>(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: u64,
        receiver: Option<&mut R>,
    ) -> Result<(), SafeTransferError<R::Error>>
    where
        R: NftReceiver + ?Sized,
    {
        let prior_approval = self.get_approved(token_id);
        self.transfer_from(operator, from, to, token_id)?;

        if let Some(receiver) = receiver {
            if let Err(rejection) = receiver.on_nft_received(&self.address, operator, from, token_id)
            {
                self.owners.insert(token_id, *from);
                if let Some(approved) = prior_approval {
                    self.token_approvals.insert(token_id, approved);
                }
                return Err(SafeTransferError::Rejected(rejection));
            }
        }
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

    fn ensure_not_frozen(&self) -> Result<(), NftError> {
        match &self.frozen {
            Some(reason) => Err(NftError::Frozen {
                collection: self.address,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}
