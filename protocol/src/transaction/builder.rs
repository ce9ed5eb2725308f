//! Construction of unsigned transactions.
//!
//! A [`Transaction`] is a draft: every field is final, but nothing has been
//! checked and nothing has been signed. Drafts can be hashed and inspected
//! freely before anyone commits a signature to them. Validation is deferred
//! to [`Transaction::sign`] and to verification.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{signing_digest, Amount};
use crate::crypto::{Address, Digest};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An unsigned value transfer.
///
/// `from_address == None` marks a reward issuance: value created by the
/// system with no sender, exempt from signature checks. Ordinary transfers
/// always name a sender.
///
/// Fields are private and there are no setters. Once built, a draft's
/// signed fields cannot change, so the digest computed before signing is
/// the digest that gets signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub(super) from_address: Option<Address>,
    pub(super) to_address: Address,
    pub(super) amount: Amount,
    pub(super) timestamp: u64,
}

impl Transaction {
    /// Drafts a transfer from `from` to `to`, stamped with the current time.
    ///
    /// No validation happens here; a zero or negative amount is accepted and
    /// rejected later by verification.
    pub fn new(from: Address, to: Address, amount: Amount) -> Self {
        TransactionBuilder::new(to, amount).from_address(from).build()
    }

    /// Drafts a reward issuance to `to`, with no sender.
    pub fn reward(to: Address, amount: Amount) -> Self {
        TransactionBuilder::new(to, amount).build()
    }

    /// Canonical digest of `{fromAddress, toAddress, amount, timestamp}`.
    ///
    /// Pure: two calls on the same draft always return the same digest.
    pub fn calculate_hash(&self) -> Digest {
        signing_digest(
            self.from_address.as_ref(),
            &self.to_address,
            self.amount,
            self.timestamp,
        )
    }

    /// The sender, or `None` for a reward issuance.
    pub fn from_address(&self) -> Option<&Address> {
        self.from_address.as_ref()
    }

    /// The recipient.
    pub fn to_address(&self) -> &Address {
        &self.to_address
    }

    /// Amount in the smallest unit.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Creation time, Unix milliseconds (UTC).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// `true` for system-issued rewards (no sender).
    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Builder for drafts that need an explicit timestamp (replays, fixtures).
///
/// ```
/// use coinlet_protocol::crypto::Address;
/// use coinlet_protocol::transaction::TransactionBuilder;
///
/// let alice = Address::parse(&"a".repeat(40)).unwrap();
/// let bob = Address::parse(&"b".repeat(40)).unwrap();
///
/// let tx = TransactionBuilder::new(bob, 50)
///     .from_address(alice)
///     .timestamp(1_700_000_000_000)
///     .build();
/// assert_eq!(tx.timestamp(), 1_700_000_000_000);
/// ```
///
/// Without [`from_address`](Self::from_address) the result is a reward.
/// Without [`timestamp`](Self::timestamp), `build()` stamps the current UTC
/// time.
pub struct TransactionBuilder {
    from_address: Option<Address>,
    to_address: Address,
    amount: Amount,
    timestamp: Option<u64>,
}

impl TransactionBuilder {
    /// Starts a draft paying `amount` to `to_address`.
    pub fn new(to_address: Address, amount: Amount) -> Self {
        Self {
            from_address: None,
            to_address,
            amount,
            timestamp: None,
        }
    }

    /// Sets the sender.
    pub fn from_address(mut self, address: Address) -> Self {
        self.from_address = Some(address);
        self
    }

    /// Sets the timestamp explicitly (Unix milliseconds).
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Consumes the builder and produces an unsigned [`Transaction`].
    pub fn build(self) -> Transaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64);

        Transaction {
            from_address: self.from_address,
            to_address: self.to_address,
            amount: self.amount,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
