//! # Protocol Configuration & Constants
//!
//! Every fixed number the parcel system depends on lives here. Values that
//! change per deployment (ports, log level, hash scheme) are only defaults;
//! the node overrides them from the command line or environment.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Version of the contract semantics. Bumped whenever an entrypoint changes
/// observable behaviour (authorization, error kinds, event shapes).
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Version tag stamped into every factory template unless overridden.
pub const TEMPLATE_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Length of an [`Address`](crate::identity::Address) in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// BLAKE3 `derive_key` context for label-derived account addresses.
pub const ACCOUNT_ADDRESS_CONTEXT: &str = "parcel 2026 account address";

/// Domain tag mixed into CREATE-style contract address derivation.
pub const CONTRACT_ADDRESS_CONTEXT: &str = "parcel 2026 contract address";

/// Label of the pseudo-account that deploys asset contracts and directly
/// deployed parcels inside a runtime.
pub const RUNTIME_DEPLOYER_LABEL: &str = "runtime";

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Decimals reported by fungible tokens that don't specify their own.
/// Display only; every amount in the system is an integer of base units.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// First token id handed out by an NFT collection. Ids are sequential.
pub const FIRST_NFT_TOKEN_ID: u64 = 1;

// ---------------------------------------------------------------------------
// Commitments
// ---------------------------------------------------------------------------

/// Name of the hash scheme used when a template doesn't pick one.
pub const DEFAULT_HASH_SCHEME: &str = "keccak256";

/// Length in bytes of secrets generated by `parcel-node keygen`.
pub const GENERATED_SECRET_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Default REST API port.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Maximum number of events returned by one `/events` page.
pub const EVENT_PAGE_LIMIT: usize = 500;
