// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Coinlet Protocol: Transaction Integrity Core
//!
//! Everything needed to move value between addresses and prove the move was
//! authorized: canonical hashing, address derivation, Ed25519 signing, and
//! verification, plus a registry mapping addresses back to public keys.
//!
//! ## Modules
//!
//! - **crypto**: hashing, keys, addresses, signatures. Stateless.
//! - **transaction**: drafts, signed transactions, wire records, and the
//!   rules deciding whether a transaction is valid.
//! - **registry**: address -> public key lookups over a pluggable store.
//! - **config**: protocol constants.
//!
//! ## Quick tour
//!
//! ```
//! use coinlet_protocol::crypto::{generate_address, Address, CoinletKeypair};
//! use coinlet_protocol::transaction::Transaction;
//!
//! let alice = CoinletKeypair::generate();
//! let bob = Address::parse(&"b".repeat(40)).unwrap();
//!
//! let draft = Transaction::new(generate_address(&alice.public_key()), bob, 50);
//! let signed = draft.sign(&alice).unwrap();
//! assert_eq!(signed.is_valid(&alice.public_key()), Ok(true));
//! ```

pub mod config;
pub mod crypto;
pub mod registry;
pub mod transaction;
