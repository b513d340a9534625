//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with a configurable format (JSON or
//! pretty-printed) and `RUST_LOG`-based filtering.
//!
//! Log output goes to stderr so stdout stays clean for `commit` and `keygen`
//! output piped into other tools.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Accepts "json" or "pretty" (case-insensitive). Anything else is `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. Subsequent calls will panic.
///
/// `RUST_LOG` overrides `default_level` when set, e.g.:
///
/// ```text
/// RUST_LOG=parcel_node=debug,parcel_contracts=debug,tower_http=info
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
                .init();
        }
    }

    tracing::info!("logging initialized (format={:?})", format);
}
