//! # Structured Logging
//!
//! Sets up the `tracing` subscriber: pretty or JSON output, filtered by
//! `RUST_LOG` when present.
//!
//! Logs go to stderr. Stdout is reserved for command output (`keygen`,
//! `sign`, and `verify` print JSON there).

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for local use.
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Install the global subscriber. Call once, early in `main()`.
///
/// `default_level` applies when `RUST_LOG` is unset, e.g. `"info"` or
/// `"coinlet_node=debug,coinlet_protocol=info"`. When set, `RUST_LOG`
/// wins:
///
/// ```text
/// RUST_LOG=coinlet_protocol=debug,tower_http=debug
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
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
