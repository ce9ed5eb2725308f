//! Transaction verification.
//!
//! Verification answers on two tiers:
//!
//! - **Structural / policy failures** are errors: an ordinary transfer with
//!   no signature ([`TransactionError::MissingSignature`]) or a non-positive
//!   amount ([`TransactionError::InvalidAmount`]).
//! - **Cryptographic mismatch** is `Ok(false)`: the supplied public key does
//!   not derive to the sender address, or the signature does not verify
//!   against that key over the digest recomputed from the current fields.
//!   Malformed signature bytes land here too.
//!
//! Callers reject the transaction in both cases but can tell a malformed
//! request from a forged one.
//!
//! Checks run in a fixed order:
//!
//! 1. Reward (no sender): valid, no further checks.
//! 2. Signature present and non-empty.
//! 3. Amount strictly positive.
//! 4. Public key derives to the sender address.
//! 5. Signature verifies.
//!
//! Verification never mutates anything and is safe to run concurrently on
//! shared references.

use thiserror::Error;
use tracing::{debug, warn};

use super::builder::Transaction;
use super::record::TransactionRecord;
use super::signing::SignedTransaction;
use super::types::Amount;
use crate::crypto::{
    generate_address, verify_digest, Address, CoinletPublicKey, CoinletSignature,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural and policy failures raised by signing and verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// The signing key's derived address is not the transaction's sender.
    #[error("unauthorized signer: key controls {derived}, not the sender address")]
    UnauthorizedSigner { derived: Address },

    /// An ordinary transfer carries no signature.
    #[error("transaction is unsigned")]
    MissingSignature,

    /// An ordinary transfer has a zero or negative amount.
    #[error("amount must be > 0, got {amount}")]
    InvalidAmount { amount: Amount },

    /// A record without a sender cannot become a signed transaction.
    #[error("reward transactions have no sender and are never signed")]
    MissingSender,

    /// A signature could not be decoded into 64 bytes.
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

fn check_amount(amount: Amount) -> Result<(), TransactionError> {
    if amount <= 0 {
        warn!(amount, "rejecting non-positive amount");
        return Err(TransactionError::InvalidAmount { amount });
    }
    Ok(())
}

/// True when `public_key` controls `from`. A key that signs for someone
/// else's address verifies as a mismatch, never as valid.
fn key_controls_sender(public_key: &CoinletPublicKey, from: &Address) -> bool {
    let derived = generate_address(public_key);
    if derived != *from {
        warn!(from = %from, derived = %derived, "public key does not control the sender address");
        return false;
    }
    true
}

impl Transaction {
    /// Verifies an unsigned draft.
    ///
    /// A reward draft is valid. Any other draft has no signature yet and
    /// fails with [`TransactionError::MissingSignature`].
    pub fn is_valid(&self, _public_key: &CoinletPublicKey) -> Result<bool, TransactionError> {
        if self.is_reward() {
            return Ok(true);
        }
        Err(TransactionError::MissingSignature)
    }
}

impl SignedTransaction {
    /// Verifies the signature against `public_key`.
    ///
    /// Returns `Ok(false)` when `public_key` does not derive to the sender,
    /// even if the signature itself was made with that key.
    ///
    /// # Errors
    ///
    /// [`TransactionError::InvalidAmount`] if the amount is not positive.
    pub fn is_valid(&self, public_key: &CoinletPublicKey) -> Result<bool, TransactionError> {
        check_amount(self.amount)?;
        if !key_controls_sender(public_key, &self.from_address) {
            return Ok(false);
        }
        let digest = self.calculate_hash();
        let valid = verify_digest(public_key, &digest, &self.signature);
        debug!(from = %self.from_address, hash = %digest, valid, "signed transaction verified");
        Ok(valid)
    }
}

impl TransactionRecord {
    /// Verifies a wire record against `public_key`.
    ///
    /// Rewards are valid regardless of any signature they carry. Otherwise
    /// the digest is recomputed from the current field values, so any field
    /// changed after signing makes this return `Ok(false)`. So does a
    /// `public_key` whose derived address is not `from_address`.
    pub fn is_valid(&self, public_key: &CoinletPublicKey) -> Result<bool, TransactionError> {
        let Some(from) = &self.from_address else {
            debug!(to = %self.to_address, amount = self.amount, "reward accepted without signature");
            return Ok(true);
        };

        let signature_hex = match self.signature.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => return Err(TransactionError::MissingSignature),
        };

        check_amount(self.amount)?;

        if !key_controls_sender(public_key, from) {
            return Ok(false);
        }

        let Ok(signature) = CoinletSignature::from_hex(signature_hex) else {
            warn!(from = %from, "malformed signature");
            return Ok(false);
        };

        let digest = self.calculate_hash();
        let valid = verify_digest(public_key, &digest, &signature);
        if !valid {
            warn!(from = %from, hash = %digest, "signature does not verify");
        }
        Ok(valid)
    }
}

/// Free-function form of [`TransactionRecord::is_valid`].
pub fn verify_transaction(
    record: &TransactionRecord,
    public_key: &CoinletPublicKey,
) -> Result<bool, TransactionError> {
    record.is_valid(public_key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign_digest, CoinletKeypair};
    use crate::transaction::builder::TransactionBuilder;

    fn bob() -> Address {
        Address::parse(&"b".repeat(40)).unwrap()
    }

    /// Helper: a keypair and a transfer of `amount` out of its address.
    fn draft(amount: Amount) -> (Transaction, CoinletKeypair) {
        let kp = CoinletKeypair::generate();
        let tx = TransactionBuilder::new(bob(), amount)
            .from_address(generate_address(&kp.public_key()))
            .build();
        (tx, kp)
    }

    #[test]
    fn valid_transaction_passes() {
        let (tx, kp) = draft(50);
        let signed = tx.sign(&kp).unwrap();
        assert_eq!(signed.is_valid(&kp.public_key()), Ok(true));
        assert_eq!(signed.to_record().is_valid(&kp.public_key()), Ok(true));
    }

    #[test]
    fn other_public_key_is_false() {
        let (tx, kp) = draft(50);
        let signed = tx.sign(&kp).unwrap();
        let other = CoinletKeypair::generate().public_key();
        assert_eq!(signed.is_valid(&other), Ok(false));
        assert_eq!(signed.to_record().is_valid(&other), Ok(false));
    }

    #[test]
    fn unsigned_draft_is_missing_signature() {
        let (tx, kp) = draft(50);
        assert_eq!(tx.is_valid(&kp.public_key()), Err(TransactionError::MissingSignature));
        let record = TransactionRecord::from(tx);
        assert_eq!(
            record.is_valid(&kp.public_key()),
            Err(TransactionError::MissingSignature)
        );
    }

    #[test]
    fn empty_signature_is_missing_signature() {
        let (tx, kp) = draft(50);
        let mut record = tx.sign(&kp).unwrap().to_record();
        record.signature = Some(String::new());
        assert_eq!(
            record.is_valid(&kp.public_key()),
            Err(TransactionError::MissingSignature)
        );
    }

    #[test]
    fn zero_amount_is_invalid_amount() {
        let (tx, kp) = draft(0);
        let signed = tx.sign(&kp).unwrap();
        assert_eq!(
            signed.is_valid(&kp.public_key()),
            Err(TransactionError::InvalidAmount { amount: 0 })
        );
    }

    #[test]
    fn negative_amount_is_invalid_amount() {
        let (tx, kp) = draft(-10);
        let record = tx.sign(&kp).unwrap().to_record();
        assert_eq!(
            record.is_valid(&kp.public_key()),
            Err(TransactionError::InvalidAmount { amount: -10 })
        );
    }

    #[test]
    fn missing_signature_checked_before_amount() {
        let (tx, kp) = draft(0);
        assert_eq!(
            TransactionRecord::from(tx).is_valid(&kp.public_key()),
            Err(TransactionError::MissingSignature)
        );
    }

    #[test]
    fn reward_is_valid_without_signature() {
        let reward = Transaction::reward(bob(), 50);
        let any_key = CoinletKeypair::generate().public_key();
        assert_eq!(reward.is_valid(&any_key), Ok(true));
        assert_eq!(TransactionRecord::from(reward).is_valid(&any_key), Ok(true));
    }

    #[test]
    fn reward_skips_amount_and_signature_checks() {
        let mut record = TransactionRecord::from(Transaction::reward(bob(), -1));
        record.signature = Some("garbage".into());
        let any_key = CoinletKeypair::generate().public_key();
        assert_eq!(record.is_valid(&any_key), Ok(true));
    }

    #[test]
    fn malformed_signature_is_false_not_error() {
        let (tx, kp) = draft(50);
        let mut record = tx.sign(&kp).unwrap().to_record();

        record.signature = Some("not-hex".into());
        assert_eq!(record.is_valid(&kp.public_key()), Ok(false));

        record.signature = Some("abcd".into());
        assert_eq!(record.is_valid(&kp.public_key()), Ok(false));
    }

    #[test]
    fn tampering_with_any_field_is_detected() {
        let (tx, kp) = draft(50);
        let original = tx.sign(&kp).unwrap().to_record();
        let pk = kp.public_key();

        let mut amount = original.clone();
        amount.amount = 51;
        assert_eq!(amount.is_valid(&pk), Ok(false));

        let mut to = original.clone();
        to.to_address = Address::parse(&"c".repeat(40)).unwrap();
        assert_eq!(to.is_valid(&pk), Ok(false));

        let mut from = original.clone();
        from.from_address = Some(Address::parse(&"d".repeat(40)).unwrap());
        assert_eq!(from.is_valid(&pk), Ok(false));

        let mut timestamp = original.clone();
        timestamp.timestamp += 1;
        assert_eq!(timestamp.is_valid(&pk), Ok(false));

        assert_eq!(original.is_valid(&pk), Ok(true));
    }

    #[test]
    fn key_not_controlling_sender_is_false() {
        // alice's address, signed and checked with mallory's key.
        let alice = CoinletKeypair::generate();
        let mallory = CoinletKeypair::generate();
        let tx = Transaction::new(generate_address(&alice.public_key()), bob(), 1000);

        let mut record = TransactionRecord::from(tx);
        record.signature = Some(sign_digest(&mallory, &record.calculate_hash()).to_hex());
        assert_eq!(record.is_valid(&mallory.public_key()), Ok(false));
        assert_eq!(record.is_valid(&alice.public_key()), Ok(false));

        let sealed = SignedTransaction::try_from(record).unwrap();
        assert_eq!(sealed.is_valid(&mallory.public_key()), Ok(false));
    }

    #[test]
    fn sender_binding_checked_after_amount() {
        let alice = CoinletKeypair::generate();
        let mallory = CoinletKeypair::generate();
        let tx = Transaction::new(generate_address(&alice.public_key()), bob(), 0);

        let mut record = TransactionRecord::from(tx);
        record.signature = Some(sign_digest(&mallory, &record.calculate_hash()).to_hex());
        assert_eq!(
            record.is_valid(&mallory.public_key()),
            Err(TransactionError::InvalidAmount { amount: 0 })
        );
    }

    #[test]
    fn verify_transaction_matches_method() {
        let (tx, kp) = draft(50);
        let record = tx.sign(&kp).unwrap().to_record();
        assert_eq!(
            verify_transaction(&record, &kp.public_key()),
            record.is_valid(&kp.public_key())
        );
    }

    #[test]
    fn concurrent_verification_of_shared_transaction() {
        use std::sync::Arc;
        use std::thread;

        let (tx, kp) = draft(50);
        let signed = Arc::new(tx.sign(&kp).unwrap());
        let pk = kp.public_key();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let signed = Arc::clone(&signed);
                let pk = pk.clone();
                thread::spawn(move || signed.is_valid(&pk))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("verifier thread panicked"), Ok(true));
        }
    }
}
