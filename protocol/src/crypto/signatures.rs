//! # Digital Signatures
//!
//! Ed25519 signing and verification over canonical [`Digest`]s.
//!
//! Signatures always cover a digest produced by
//! [`canonical_hash`](super::hash::canonical_hash), never raw caller bytes.
//! The `Digest` parameter type enforces that at compile time.
//!
//! Verification never fails loudly. A malformed key, a truncated signature,
//! a signature from a different key, or a signature over a different digest
//! all come back as `false`. Callers reject the transaction either way.

use super::hash::Digest;
use super::keys::{CoinletKeypair, CoinletPublicKey, CoinletSignature};

/// Sign a digest with the given keypair.
///
/// Deterministic (RFC 8032): the same key and digest always yield the same
/// signature.
///
/// # Example
///
/// ```
/// use coinlet_protocol::crypto::{canonical_hash, sign_digest, verify_digest, CoinletKeypair};
///
/// let keypair = CoinletKeypair::generate();
/// let digest = canonical_hash("pay bob 50").unwrap();
/// let signature = sign_digest(&keypair, &digest);
///
/// assert!(verify_digest(&keypair.public_key(), &digest, &signature));
/// ```
pub fn sign_digest(keypair: &CoinletKeypair, digest: &Digest) -> CoinletSignature {
    keypair.sign(digest.as_bytes())
}

/// Verify that `signature` was produced over `digest` by the key matching
/// `public_key`.
pub fn verify_digest(
    public_key: &CoinletPublicKey,
    digest: &Digest,
    signature: &CoinletSignature,
) -> bool {
    public_key.verify(digest.as_bytes(), signature)
}

/// Verify using hex-encoded key and signature, as they arrive off the wire.
///
/// Any decoding failure is reported as `false`.
pub fn verify_digest_hex(public_key_hex: &str, digest: &Digest, signature_hex: &str) -> bool {
    let Ok(public_key) = CoinletPublicKey::from_hex(public_key_hex) else {
        return false;
    };
    let Ok(signature) = CoinletSignature::from_hex(signature_hex) else {
        return false;
    };
    verify_digest(&public_key, digest, &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::canonical_hash;

    fn digest(text: &str) -> Digest {
        canonical_hash(text).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = CoinletKeypair::generate();
        let d = digest("hello");
        let sig = sign_digest(&kp, &d);
        assert!(verify_digest(&kp.public_key(), &d, &sig));
    }

    #[test]
    fn test_wrong_digest_fails() {
        let kp = CoinletKeypair::generate();
        let sig = sign_digest(&kp, &digest("correct"));
        assert!(!verify_digest(&kp.public_key(), &digest("wrong"), &sig));
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = CoinletKeypair::generate();
        let kp2 = CoinletKeypair::generate();
        let d = digest("message");
        let sig = sign_digest(&kp1, &d);
        assert!(!verify_digest(&kp2.public_key(), &d, &sig));
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = CoinletKeypair::generate();
        let d = digest("determinism");
        assert_eq!(sign_digest(&kp, &d), sign_digest(&kp, &d));
    }

    #[test]
    fn hex_path_matches_typed_path() {
        let kp = CoinletKeypair::generate();
        let d = digest("wire");
        let sig = sign_digest(&kp, &d);
        assert!(verify_digest_hex(&kp.public_key().to_hex(), &d, &sig.to_hex()));
    }

    #[test]
    fn malformed_hex_input_is_false_not_panic() {
        let kp = CoinletKeypair::generate();
        let d = digest("wire");
        let sig_hex = sign_digest(&kp, &d).to_hex();
        let pk_hex = kp.public_key().to_hex();

        assert!(!verify_digest_hex("zz", &d, &sig_hex));
        assert!(!verify_digest_hex(&pk_hex, &d, ""));
        assert!(!verify_digest_hex(&pk_hex, &d, "not hex"));
        assert!(!verify_digest_hex(&pk_hex, &d, &sig_hex[..126]));
        assert!(!verify_digest_hex(&pk_hex, &d, &"00".repeat(64)));
    }
}
