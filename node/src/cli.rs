//! # CLI Interface
//!
//! Command-line structure for `coinlet-node`, built with `clap` derive.
//! Every flag that configures a long-running process also reads a
//! `COINLET_*` environment variable.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Coinlet transaction node.
///
/// Signs and verifies value transfers, keeps an address -> public key
/// registry, and serves both over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "coinlet-node",
    about = "Coinlet transaction signing and verification node",
    version,
    propagate_version = true
)]
pub struct CoinletNodeCli {
    /// Log output format.
    #[arg(long, global = true, env = "COINLET_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "COINLET_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API and metrics endpoint.
    Run(RunArgs),
    /// Generate a keypair and print it with its address.
    Keygen,
    /// Sign a transfer offline and print the signed record as JSON.
    Sign(SignArgs),
    /// Verify a transaction record read from a file or stdin.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory holding the key registry database.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "COINLET_DATA_DIR", default_value = "./coinlet-data")]
    pub data_dir: PathBuf,

    /// Listen address for the HTTP API.
    #[arg(long, env = "COINLET_API_ADDR", default_value = "127.0.0.1:8080")]
    pub api_addr: SocketAddr,

    /// Listen address for the Prometheus metrics endpoint.
    #[arg(long, env = "COINLET_METRICS_ADDR", default_value = "127.0.0.1:9100")]
    pub metrics_addr: SocketAddr,
}

/// Arguments for `sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Hex-encoded 32-byte Ed25519 secret key of the sender.
    ///
    /// Prefer the environment variable over the flag so the key stays out of
    /// shell history.
    #[arg(long, env = "COINLET_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Recipient address (40 hex characters).
    #[arg(long)]
    pub to: String,

    /// Amount in the smallest unit.
    #[arg(long, allow_hyphen_values = true)]
    pub amount: i64,

    /// Fixed timestamp in Unix milliseconds. Defaults to now.
    #[arg(long)]
    pub timestamp: Option<u64>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Hex-encoded public key of the claimed sender.
    #[arg(long)]
    pub public_key: String,

    /// File containing the record JSON. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
}
