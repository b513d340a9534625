//! # Admin Gate
//!
//! Owner check plus pause flag, independent of anything parcel-specific.
//! The factory embeds one; any other contract that needs "one admin who can
//! halt new business" can too.
//!
//! After [`AdminGate::renounce_ownership`] the owner is the zero address and
//! no one can ever pause or unpause again.

use parcel_protocol::identity::Address;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::events::ContractEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGate {
    owner: Address,
    paused: bool,
}

impl AdminGate {
    /// An unpaused gate owned by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    /// Current owner; the zero address once renounced.
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn only_owner(&self, caller: &Address) -> Result<(), ContractError> {
        if self.owner.is_zero() || *caller != self.owner {
            return Err(ContractError::AccessDenied);
        }
        Ok(())
    }

    pub fn when_not_paused(&self) -> Result<(), ContractError> {
        if self.paused {
            return Err(ContractError::FactoryPaused);
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address) -> Result<ContractEvent, ContractError> {
        self.only_owner(caller)?;
        if self.paused {
            return Err(ContractError::AlreadyPaused);
        }
        self.paused = true;
        Ok(ContractEvent::Paused { account: *caller })
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<ContractEvent, ContractError> {
        self.only_owner(caller)?;
        if !self.paused {
            return Err(ContractError::NotPaused);
        }
        self.paused = false;
        Ok(ContractEvent::Unpaused { account: *caller })
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<ContractEvent, ContractError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(ContractError::ZeroAddress);
        }
        Ok(self.set_owner(new_owner))
    }

    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<ContractEvent, ContractError> {
        self.only_owner(caller)?;
        Ok(self.set_owner(Address::ZERO))
    }

    fn set_owner(&mut self, new_owner: Address) -> ContractEvent {
        let previous = std::mem::replace(&mut self.owner, new_owner);
        ContractEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_label("admin")
    }

    fn mallory() -> Address {
        Address::from_label("mallory")
    }

    #[test]
    fn only_owner_can_pause_and_unpause() {
        let mut gate = AdminGate::new(admin());
        assert_eq!(gate.pause(&mallory()), Err(ContractError::AccessDenied));
        assert!(!gate.paused());

        let event = gate.pause(&admin()).unwrap();
        assert_eq!(event, ContractEvent::Paused { account: admin() });
        assert_eq!(gate.when_not_paused(), Err(ContractError::FactoryPaused));

        assert_eq!(gate.unpause(&mallory()), Err(ContractError::AccessDenied));
        gate.unpause(&admin()).unwrap();
        assert!(gate.when_not_paused().is_ok());
    }

    #[test]
    fn redundant_toggles_rejected() {
        let mut gate = AdminGate::new(admin());
        assert_eq!(gate.unpause(&admin()), Err(ContractError::NotPaused));
        gate.pause(&admin()).unwrap();
        assert_eq!(gate.pause(&admin()), Err(ContractError::AlreadyPaused));
        assert!(gate.paused());
    }

    #[test]
    fn ownership_moves_and_old_owner_loses_power() {
        let mut gate = AdminGate::new(admin());
        let heir = Address::from_label("heir");

        let event = gate.transfer_ownership(&admin(), heir).unwrap();
        assert_eq!(
            event,
            ContractEvent::OwnershipTransferred {
                previous: admin(),
                new: heir
            }
        );
        assert_eq!(gate.owner(), heir);
        assert_eq!(gate.pause(&admin()), Err(ContractError::AccessDenied));
        gate.pause(&heir).unwrap();
    }

    #[test]
    fn transfer_to_zero_rejected() {
        let mut gate = AdminGate::new(admin());
        assert_eq!(
            gate.transfer_ownership(&admin(), Address::ZERO),
            Err(ContractError::ZeroAddress)
        );
        assert_eq!(gate.owner(), admin());
    }

    #[test]
    fn renounced_gate_is_frozen_forever() {
        let mut gate = AdminGate::new(admin());
        gate.renounce_ownership(&admin()).unwrap();
        assert!(gate.owner().is_zero());
        assert_eq!(gate.pause(&admin()), Err(ContractError::AccessDenied));
        assert_eq!(gate.pause(&Address::ZERO), Err(ContractError::AccessDenied));
    }
}
