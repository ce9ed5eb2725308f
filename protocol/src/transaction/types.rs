//! Core value types shared by every transaction representation.
//!
//! The draft [`Transaction`](super::Transaction), the sealed
//! [`SignedTransaction`](super::SignedTransaction), and the wire-level
//! [`TransactionRecord`](super::TransactionRecord) all hash through
//! [`signing_digest`] so the three can never disagree about what was signed.

use serde::Serialize;

use crate::crypto::{canonical_hash, Address, Digest};

/// A monetary amount in the smallest indivisible unit.
///
/// Signed so that zero and negative values arriving from callers are
/// representable and can be rejected by policy with
/// [`TransactionError::InvalidAmount`](super::TransactionError::InvalidAmount).
pub type Amount = i64;

/// The exact set of fields covered by a signature, in signing order.
///
/// Field order and names are part of the signature format. Adding,
/// removing, renaming, or reordering a field invalidates every signature
/// issued before the change.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedFields<'a> {
    from_address: Option<&'a Address>,
    to_address: &'a Address,
    amount: Amount,
    timestamp: u64,
}

/// Canonical digest of the four signed fields.
pub(crate) fn signing_digest(
    from_address: Option<&Address>,
    to_address: &Address,
    amount: Amount,
    timestamp: u64,
) -> Digest {
    let fields = SignedFields {
        from_address,
        to_address,
        amount,
        timestamp,
    };
    // Strings and integers always encode as JSON.
    canonical_hash(&fields).expect("signed fields are always JSON-encodable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    fn addr(c: char) -> Address {
        Address::parse(&c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn digest_covers_the_camel_case_json_of_the_four_fields() {
        let digest = signing_digest(Some(&addr('a')), &addr('b'), 50, 1_700_000_000_000);
        let expected = format!(
            r#"{{"fromAddress":"{}","toAddress":"{}","amount":50,"timestamp":1700000000000}}"#,
            "a".repeat(40),
            "b".repeat(40)
        );
        assert_eq!(digest.as_bytes(), &sha256(expected.as_bytes()));
    }

    #[test]
    fn reward_sender_encodes_as_null() {
        let digest = signing_digest(None, &addr('b'), 50, 1);
        let expected = format!(
            r#"{{"fromAddress":null,"toAddress":"{}","amount":50,"timestamp":1}}"#,
            "b".repeat(40)
        );
        assert_eq!(digest.as_bytes(), &sha256(expected.as_bytes()));
    }
}
