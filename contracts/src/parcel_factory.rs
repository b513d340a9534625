//! # Parcel Factory
//!
//! Mass-produces parcels from one shared [`ParcelTemplate`]. Each parcel gets
//! its own address (derived from the factory address and a nonce), its own
//! custody record and lifecycle fields, and a clone of the template `Arc`.
//!
//! Creation is gated by an [`AdminGate`]: the owner can pause the factory,
//! which stops new parcels without touching existing ones.
//!
//! The factory keeps the addresses of everything it created, for auditing.
//! There is no global registry; a second factory has its own list.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parcel_protocol::crypto::SecretHash;
use parcel_protocol::identity::Address;
use tracing::info;

use crate::access::AdminGate;
use crate::error::ContractError;
use crate::events::ContractEvent;
use crate::parcel::Parcel;
use crate::template::ParcelTemplate;

#[derive(Debug, Clone)]
pub struct ParcelFactory {
    address: Address,
    gate: AdminGate,
    template: Arc<ParcelTemplate>,
    /// Creation order.
    created: Vec<Address>,
    created_index: HashSet<Address>,
    nonce: u64,
    created_at: DateTime<Utc>,
    pending_events: Vec<ContractEvent>,
}

impl ParcelFactory {
    /// Deploys a factory at `address` owned by `owner`.
    pub fn new(address: Address, owner: Address, template: ParcelTemplate) -> Self {
        Self {
            address,
            gate: AdminGate::new(owner),
            template: Arc::new(template),
            created: Vec::new(),
            created_index: HashSet::new(),
            nonce: 0,
            created_at: Utc::now(),
            pending_events: vec![ContractEvent::OwnershipTransferred {
                previous: Address::ZERO,
                new: owner,
            }],
        }
    }

    /// Produces a new parcel, initialized `Open` with `caller` as sender.
    ///
    /// The caller is responsible for hosting the returned parcel. The
    /// factory has already recorded its address.
    pub fn create_parcel(
        &mut self,
        caller: &Address,
        hashed_secret: SecretHash,
    ) -> Result<Parcel, ContractError> {
        self.gate.when_not_paused()?;

        let nonce = self
            .nonce
            .checked_add(1)
            .ok_or(ContractError::AmountOverflow)?;
        let address = Address::derive_contract(&self.address, nonce);

        let mut parcel = Parcel::new(address, Arc::clone(&self.template));
        parcel.initialize(hashed_secret, *caller)?;

        self.nonce = nonce;
        self.created.push(address);
        self.created_index.insert(address);
        self.pending_events.push(ContractEvent::ParcelCreated {
            parcel: address,
            creator: *caller,
        });

        info!(
            factory = %self.address,
            parcel = %address,
            creator = %caller,
            count = self.created.len(),
            "parcel created"
        );
        Ok(parcel)
    }

    pub fn pause(&mut self, caller: &Address) -> Result<(), ContractError> {
        let event = self.gate.pause(caller)?;
        self.pending_events.push(event);
        info!(factory = %self.address, account = %caller, "factory paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), ContractError> {
        let event = self.gate.unpause(caller)?;
        self.pending_events.push(event);
        info!(factory = %self.address, account = %caller, "factory unpaused");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), ContractError> {
        let event = self.gate.transfer_ownership(caller, new_owner)?;
        self.pending_events.push(event);
        info!(factory = %self.address, new_owner = %new_owner, "factory ownership transferred");
        Ok(())
    }

    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<(), ContractError> {
        let event = self.gate.renounce_ownership(caller)?;
        self.pending_events.push(event);
        info!(factory = %self.address, "factory ownership renounced");
        Ok(())
    }

    // -- views -------------------------------------------------------------

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> Address {
        self.gate.owner()
    }

    pub fn paused(&self) -> bool {
        self.gate.paused()
    }

    pub fn template(&self) -> &ParcelTemplate {
        &self.template
    }

    pub fn created_parcels(&self) -> &[Address] {
        &self.created
    }

    pub fn parcel_count(&self) -> usize {
        self.created.len()
    }

    pub fn is_factory_parcel(&self, parcel: &Address) -> bool {
        self.created_index.contains(parcel)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
