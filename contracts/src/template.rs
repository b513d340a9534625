//! Immutable configuration shared by every parcel a factory produces.

use parcel_protocol::config::TEMPLATE_VERSION;
use parcel_protocol::crypto::HashScheme;
use serde::{Deserialize, Serialize};

/// Cloned parcels hold an `Arc<ParcelTemplate>`; only their custody and
/// lifecycle fields are per-instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelTemplate {
    /// How `open()` hashes a presented secret.
    pub hash_scheme: HashScheme,
    /// Whether new parcels start out accepting deposits from anyone.
    pub communal_by_default: bool,
    /// Free-form name, shown in logs and the API.
    pub label: String,
    pub version: u16,
}

impl Default for ParcelTemplate {
    fn default() -> Self {
        Self {
            hash_scheme: HashScheme::default(),
            communal_by_default: false,
            label: "parcel".to_string(),
            version: TEMPLATE_VERSION,
        }
    }
}

impl ParcelTemplate {
    pub fn with_scheme(hash_scheme: HashScheme) -> Self {
        Self {
            hash_scheme,
            ..Self::default()
        }
    }
}
