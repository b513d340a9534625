// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Parcel Node
//!
//! Entry point for the `parcel-node` binary. Parses CLI arguments,
//! initializes logging and metrics, deploys a parcel factory into an
//! in-memory runtime, and serves the REST API.
//!
//! Subcommands:
//!
//! - `run`     starts the node
//! - `commit`  prints the commitment for a secret
//! - `keygen`  generates a fresh secret and its commitment
//! - `version` prints build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use rand::RngCore;
use std::sync::Arc;
use tokio::signal;

use parcel_contracts::{ParcelTemplate, Runtime};
use parcel_protocol::config::{GENERATED_SECRET_LENGTH, PROTOCOL_VERSION};
use parcel_protocol::crypto::SecretHash;

use cli::{Commands, ParcelNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ParcelNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Commit(args) => {
            let hash = SecretHash::commit(args.scheme, args.secret.as_bytes());
            println!("{hash}");
            Ok(())
        }
        Commands::Keygen(args) => {
            keygen(args);
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: runtime, factory, API server, and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, LogFormat::from_str_lossy(&args.log_format));

    let owner = api::resolve_account(&args.owner);
    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        owner = %owner,
        hash_scheme = %args.hash_scheme,
        communal_by_default = args.communal_by_default,
        "starting parcel-node"
    );

    // --- Runtime and factory ---
    let runtime = Arc::new(Runtime::new());
    let template = ParcelTemplate {
        communal_by_default: args.communal_by_default,
        ..ParcelTemplate::with_scheme(args.hash_scheme)
    };
    let factory = runtime.deploy_factory(owner, template);

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        runtime,
        factory,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!(factory = %factory, "API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("parcel-node stopped");
    Ok(())
}

/// Prints a random hex secret and its commitment.
fn keygen(args: cli::KeygenArgs) {
    let mut bytes = [0u8; GENERATED_SECRET_LENGTH];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret = hex::encode(bytes);
    let hash = SecretHash::commit(args.scheme, secret.as_bytes());

    println!("secret : {secret}");
    println!("hash   : {hash}");
    println!("scheme : {}", args.scheme);
}

fn print_version() {
    println!("parcel-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
