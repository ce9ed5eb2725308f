//! Signing: turning a draft [`Transaction`] into a sealed
//! [`SignedTransaction`].
//!
//! Signing checks authorization first. The signer's public key must derive
//! to the draft's sender address; otherwise the attempt fails with
//! [`TransactionError::UnauthorizedSigner`] and nothing is produced. The
//! draft itself is only borrowed, so a failed attempt leaves it exactly as
//! it was: unsigned.
//!
//! A [`SignedTransaction`] has no setters and no `sign` method. Mutating a
//! signed transaction or signing it twice does not compile.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::builder::Transaction;
use super::record::TransactionRecord;
use super::types::{signing_digest, Amount};
use super::verification::TransactionError;
use crate::crypto::{generate_address, sign_digest, Address, CoinletKeypair, CoinletSignature, Digest};

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A transfer sealed by its sender's signature.
///
/// Always has a sender: rewards are never signed. Serializes to (and
/// deserializes from) the [`TransactionRecord`] wire shape. Deserializing
/// only checks shape; call [`is_valid`](Self::is_valid) to check the
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TransactionRecord", try_from = "TransactionRecord")]
pub struct SignedTransaction {
    pub(super) from_address: Address,
    pub(super) to_address: Address,
    pub(super) amount: Amount,
    pub(super) timestamp: u64,
    pub(super) signature: CoinletSignature,
}

impl SignedTransaction {
    /// Canonical digest of the signed fields, recomputed on every call.
    pub fn calculate_hash(&self) -> Digest {
        signing_digest(
            Some(&self.from_address),
            &self.to_address,
            self.amount,
            self.timestamp,
        )
    }

    pub fn from_address(&self) -> &Address {
        &self.from_address
    }

    pub fn to_address(&self) -> &Address {
        &self.to_address
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn signature(&self) -> &CoinletSignature {
        &self.signature
    }

    /// The wire record for this transaction.
    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord::from(self.clone())
    }
}

impl TryFrom<TransactionRecord> for SignedTransaction {
    type Error = TransactionError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let from_address = record.from_address.ok_or(TransactionError::MissingSender)?;
        let signature_hex = record
            .signature
            .filter(|s| !s.is_empty())
            .ok_or(TransactionError::MissingSignature)?;
        let signature = CoinletSignature::from_hex(&signature_hex).map_err(|e| {
            TransactionError::MalformedSignature {
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            from_address,
            to_address: record.to_address,
            amount: record.amount,
            timestamp: record.timestamp,
            signature,
        })
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

impl Transaction {
    /// Signs this draft with `keypair`, producing a sealed transaction.
    ///
    /// # Errors
    ///
    /// [`TransactionError::UnauthorizedSigner`] if the address derived from
    /// `keypair`'s public key is not this draft's sender. Reward drafts have
    /// no sender and therefore always fail here.
    pub fn sign(&self, keypair: &CoinletKeypair) -> Result<SignedTransaction, TransactionError> {
        let derived = generate_address(&keypair.public_key());

        let from_address = match &self.from_address {
            Some(from) if *from == derived => from.clone(),
            _ => {
                warn!(signer = %derived, "signing key does not control the sender address");
                return Err(TransactionError::UnauthorizedSigner { derived });
            }
        };

        let digest = self.calculate_hash();
        let signature = sign_digest(keypair, &digest);
        debug!(from = %from_address, hash = %digest, "transaction signed");

        Ok(SignedTransaction {
            from_address,
            to_address: self.to_address.clone(),
            amount: self.amount,
            timestamp: self.timestamp,
            signature,
        })
    }
}

/// Free-function form of [`Transaction::sign`].
pub fn sign_transaction(
    tx: &Transaction,
    keypair: &CoinletKeypair,
) -> Result<SignedTransaction, TransactionError> {
    tx.sign(keypair)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
