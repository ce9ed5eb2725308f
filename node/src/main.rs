// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Coinlet Node
//!
//! Entry point for the `coinlet-node` binary. Parses CLI arguments,
//! initializes logging, and dispatches to a subcommand:
//!
//! - `run`     serve the HTTP API and the metrics endpoint
//! - `keygen`  generate a keypair and print it with its address
//! - `sign`    sign a transfer offline
//! - `verify`  verify a record from a file or stdin
//! - `version` print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::sync::Arc;
use tokio::signal;

use coinlet_protocol::crypto::{generate_address, CoinletKeypair, CoinletPublicKey};
use coinlet_protocol::registry::{KeyRegistry, KeyStore, SledKeyStore};
use coinlet_protocol::transaction::{TransactionRecord, TransferRequest};

use cli::{Commands, CoinletNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CoinletNodeCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen => keygen(),
        Commands::Sign(args) => sign(args),
        Commands::Verify(args) => verify(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Serves the API and metrics listeners until a shutdown signal arrives.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        api_addr = %args.api_addr,
        metrics_addr = %args.metrics_addr,
        data_dir = %args.data_dir.display(),
        "starting coinlet-node"
    );

    // --- Key registry ---
    let registry_path = args.data_dir.join("registry");
    std::fs::create_dir_all(&registry_path).with_context(|| {
        format!("failed to create registry directory: {}", registry_path.display())
    })?;
    let sled_store = SledKeyStore::open(&registry_path)
        .with_context(|| format!("failed to open registry at {}", registry_path.display()))?;
    tracing::info!(
        path = %registry_path.display(),
        keys = sled_store.len(),
        "key registry opened"
    );
    if sled_store.is_empty() {
        tracing::info!("no keys registered yet; POST /keys to add one");
    }
    let store: Box<dyn KeyStore> = Box::new(sled_store.clone());
    let registry = Arc::new(KeyRegistry::new(store));

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- API server ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            coinlet_protocol::config::PROTOCOL_VERSION,
        ),
        registry,
        metrics: Arc::clone(&node_metrics),
    };
    let api_router = api::create_router(app_state);
    let api_listener = tokio::net::TcpListener::bind(args.api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", args.api_addr))?;
    tracing::info!("API server listening on {}", args.api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_listener = tokio::net::TcpListener::bind(args.metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", args.metrics_addr))?;
    tracing::info!("metrics server listening on {}", args.metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    sled_store.flush().context("failed to flush key registry")?;
    tracing::info!("coinlet-node stopped");
    Ok(())
}

/// Prints a fresh keypair and its address as JSON.
fn keygen() -> Result<()> {
    let keypair = CoinletKeypair::generate();
    let public_key = keypair.public_key();
    let out = serde_json::json!({
        "address": generate_address(&public_key),
        "publicKey": public_key.to_hex(),
        "privateKey": keypair.secret_key_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    tracing::info!(public_key = %public_key, "keypair generated");
    Ok(())
}

/// Signs a transfer from the key's own address and prints the record.
fn sign(args: cli::SignArgs) -> Result<()> {
    let keypair =
        CoinletKeypair::from_hex(&args.private_key).context("failed to parse private key")?;
    let from = generate_address(&keypair.public_key());

    let draft = TransferRequest {
        from_address: Some(from.to_string()),
        to_address: args.to,
        amount: args.amount,
        timestamp: args.timestamp,
        signature: None,
    }
    .into_draft()
    .context("invalid transfer")?;
    let signed = draft.sign(&keypair).context("signing failed")?;

    println!("{}", serde_json::to_string_pretty(&signed.to_record())?);
    Ok(())
}

/// Verifies a record and prints `{valid, hash}`.
fn verify(args: cli::VerifyArgs) -> Result<()> {
    let json = match args.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let record: TransactionRecord =
        serde_json::from_str(&json).context("failed to parse transaction record")?;
    let public_key =
        CoinletPublicKey::from_hex(&args.public_key).context("failed to parse public key")?;

    let valid = record
        .is_valid(&public_key)
        .context("transaction rejected")?;
    let out = serde_json::json!({
        "valid": valid,
        "hash": record.calculate_hash().to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("coinlet-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", coinlet_protocol::config::PROTOCOL_VERSION);
    println!(
        "signatures   {} over {}",
        coinlet_protocol::config::SIGNING_ALGORITHM,
        coinlet_protocol::config::DIGEST_FUNCTION
    );
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
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
            Ok(mut sig) => {
                sig.recv().await;
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
