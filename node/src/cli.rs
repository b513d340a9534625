//! # CLI Interface
//!
//! Command-line structure for `parcel-node`, built with `clap` derive.
//! Subcommands: `run`, `commit`, `keygen`, and `version`.

use clap::{Args, Parser, Subcommand};
use parcel_protocol::config::{DEFAULT_API_PORT, DEFAULT_HASH_SCHEME, DEFAULT_METRICS_PORT};
use parcel_protocol::crypto::HashScheme;

/// Secret-locked parcel escrow node.
///
/// Hosts a parcel factory and its parcels in memory, serves the REST API,
/// and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "parcel-node",
    about = "Secret-locked parcel escrow node",
    version,
    propagate_version = true
)]
pub struct ParcelNodeCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node and serve the API.
    Run(RunArgs),
    /// Print the commitment for a secret.
    Commit(CommitArgs),
    /// Generate a random secret and its commitment.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Interface to bind both listeners to.
    #[arg(long, env = "PARCEL_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the REST API.
    #[arg(long, env = "PARCEL_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "PARCEL_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Factory owner: a `0x` address or a label.
    #[arg(long, env = "PARCEL_OWNER", default_value = "owner")]
    pub owner: String,

    /// Commitment scheme for parcels created by the factory.
    #[arg(long, env = "PARCEL_HASH_SCHEME", default_value = DEFAULT_HASH_SCHEME)]
    pub hash_scheme: HashScheme,

    /// Create parcels that accept deposits from anyone.
    #[arg(long, env = "PARCEL_COMMUNAL_BY_DEFAULT")]
    pub communal_by_default: bool,

    /// Default tracing filter when `RUST_LOG` is unset.
    #[arg(
        long,
        env = "PARCEL_LOG_LEVEL",
        default_value = "parcel_node=info,parcel_contracts=info,tower_http=info"
    )]
    pub log_level: String,

    /// `pretty` or `json`.
    #[arg(long, env = "PARCEL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// The plaintext secret.
    pub secret: String,

    #[arg(long, default_value = DEFAULT_HASH_SCHEME)]
    pub scheme: HashScheme,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    #[arg(long, default_value = DEFAULT_HASH_SCHEME)]
    pub scheme: HashScheme,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        ParcelNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = ParcelNodeCli::try_parse_from(["parcel-node", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.api_port, DEFAULT_API_PORT);
                assert_eq!(args.metrics_port, DEFAULT_METRICS_PORT);
                assert_eq!(args.hash_scheme, HashScheme::Keccak256);
                assert!(!args.communal_by_default);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn commit_accepts_scheme() {
        let cli =
            ParcelNodeCli::try_parse_from(["parcel-node", "commit", "s1", "--scheme", "blake3"])
                .unwrap();
        match cli.command {
            Commands::Commit(args) => {
                assert_eq!(args.secret, "s1");
                assert_eq!(args.scheme, HashScheme::Blake3);
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert!(
            ParcelNodeCli::try_parse_from(["parcel-node", "keygen", "--scheme", "md5"]).is_err()
        );
    }
}
