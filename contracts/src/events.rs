//! # Contract Events
//!
//! What contracts announce when they change state. Contracts buffer
//! [`ContractEvent`]s; the runtime stamps each one with the emitting
//! contract, a sequence number and a UTC timestamp, and appends the
//! resulting [`EventRecord`] to its log.

use chrono::{DateTime, Utc};
use parcel_protocol::identity::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContractEvent {
    /// A factory produced and initialized a parcel for `creator`.
    ParcelCreated { parcel: Address, creator: Address },
    /// A parcel left `Uninitialized`.
    Initialized { sender: Address },
    /// A parcel released its contents to `recipient`.
    ParcelEmptied { recipient: Address },
    Paused { account: Address },
    Unpaused { account: Address },
    /// `new` is the zero address after a renounce; `previous` is zero on
    /// deployment.
    OwnershipTransferred { previous: Address, new: Address },
}

impl ContractEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::ParcelCreated { .. } => "ParcelCreated",
            ContractEvent::Initialized { .. } => "Initialized",
            ContractEvent::ParcelEmptied { .. } => "ParcelEmptied",
            ContractEvent::Paused { .. } => "Paused",
            ContractEvent::Unpaused { .. } => "Unpaused",
            ContractEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

/// A logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// The emitting contract.
    pub contract: Address,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ContractEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_flat_with_event_tag() {
        let record = EventRecord {
            sequence: 3,
            contract: Address::from_label("parcel"),
            timestamp: Utc::now(),
            event: ContractEvent::ParcelEmptied {
                recipient: Address::from_label("bob"),
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event"], "parcel_emptied");
        assert_eq!(json["sequence"], 3);
        assert_eq!(json["recipient"], Address::from_label("bob").to_hex());

        let back: EventRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
