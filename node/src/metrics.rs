//! # Prometheus Metrics
//!
//! Counters for signing, verification, and key registration, served in the
//! Prometheus text format on the metrics listener.
//!
//! Metrics live in a dedicated [`prometheus::Registry`] with the `coinlet`
//! prefix rather than the process-global default registry.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Verification outcomes, used as the `outcome` label value.
pub const OUTCOME_VALID: &str = "valid";
pub const OUTCOME_INVALID: &str = "invalid";
pub const OUTCOME_REJECTED: &str = "rejected";

/// Metric handles for the node. Cheap to clone; handles share state.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Transactions signed by this node.
    pub transactions_signed_total: IntCounter,
    /// Reward transactions issued.
    pub rewards_issued_total: IntCounter,
    /// Verifications by outcome: `valid`, `invalid` (signature mismatch),
    /// or `rejected` (structural error).
    pub transactions_verified_total: IntCounterVec,
    /// Signing attempts refused because the key did not control the sender.
    pub unauthorized_signers_total: IntCounter,
    /// New public keys written to the registry.
    pub keys_registered_total: IntCounter,
    /// Time spent in signature verification, in seconds.
    pub verification_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("coinlet".into()), None)?;

        let transactions_signed_total = IntCounter::new(
            "transactions_signed_total",
            "Total number of transactions signed",
        )?;
        registry.register(Box::new(transactions_signed_total.clone()))?;

        let rewards_issued_total =
            IntCounter::new("rewards_issued_total", "Total number of reward transactions issued")?;
        registry.register(Box::new(rewards_issued_total.clone()))?;

        let transactions_verified_total = IntCounterVec::new(
            Opts::new(
                "transactions_verified_total",
                "Total number of verification requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(transactions_verified_total.clone()))?;

        let unauthorized_signers_total = IntCounter::new(
            "unauthorized_signers_total",
            "Signing attempts with a key that does not control the sender address",
        )?;
        registry.register(Box::new(unauthorized_signers_total.clone()))?;

        let keys_registered_total =
            IntCounter::new("keys_registered_total", "Total number of public keys registered")?;
        registry.register(Box::new(keys_registered_total.clone()))?;

        let verification_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "verification_seconds",
                "Transaction verification latency in seconds",
            )
            .buckets(vec![0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.005, 0.01]),
        )?;
        registry.register(Box::new(verification_seconds.clone()))?;

        Ok(Self {
            registry,
            transactions_signed_total,
            rewards_issued_total,
            transactions_verified_total,
            unauthorized_signers_total,
            keys_registered_total,
            verification_seconds,
        })
    }

    /// Record one verification outcome.
    pub fn observe_verification(&self, outcome: &str) {
        self.transactions_verified_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics`. Responds 500 if encoding fails.
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
