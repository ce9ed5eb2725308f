//! The wire shape of a transaction.
//!
//! [`TransactionRecord`] is what crosses process boundaries: JSON request
//! and response bodies, files handed to the CLI. It is deliberately plain
//! data with public fields. Nothing about a record is trusted. Verifying
//! one recomputes the digest from whatever the fields currently hold, so a
//! record altered after signing fails verification.

use serde::{Deserialize, Serialize};

use super::builder::Transaction;
use super::signing::SignedTransaction;
use super::types::{signing_digest, Amount};
use crate::crypto::{Address, Digest};

/// A transaction as exchanged with callers.
///
/// ```json
/// {
///   "fromAddress": "3f1c…",   // null for rewards
///   "toAddress": "9ab0…",
///   "amount": 50,
///   "timestamp": 1700000000000,
///   "signature": "e4d2…"      // null when unsigned
/// }
/// ```
///
/// `amount` is a whole number of the smallest unit and must fit in an
/// `i64`. Fractional JSON numbers such as `0.5` fail to deserialize, which
/// the HTTP API reports as 422 before any verification runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub from_address: Option<Address>,
    pub to_address: Address,
    /// Integer count of the smallest unit.
    pub amount: Amount,
    pub timestamp: u64,
    #[serde(default)]
    pub signature: Option<String>,
}

impl TransactionRecord {
    /// Canonical digest of the record's current signed fields.
    pub fn calculate_hash(&self) -> Digest {
        signing_digest(
            self.from_address.as_ref(),
            &self.to_address,
            self.amount,
            self.timestamp,
        )
    }

    /// `true` for system-issued rewards (no sender).
    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }
}

impl From<SignedTransaction> for TransactionRecord {
    fn from(tx: SignedTransaction) -> Self {
        Self {
            signature: Some(tx.signature.to_hex()),
            from_address: Some(tx.from_address),
            to_address: tx.to_address,
            amount: tx.amount,
            timestamp: tx.timestamp,
        }
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        Self {
            from_address: tx.from_address,
            to_address: tx.to_address,
            amount: tx.amount,
            timestamp: tx.timestamp,
            signature: None,
        }
    }
}
