//! # Transaction Module
//!
//! Construction, signing, and verification of value transfers.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        Amount and the canonical signing digest
//! builder.rs      Unsigned drafts (Transaction, TransactionBuilder)
//! signing.rs      Draft -> SignedTransaction, with the authorization check
//! record.rs       TransactionRecord, the JSON wire shape
//! verification.rs TransactionError and the is_valid checks
//! request.rs      Shape validation of inbound transfer requests
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: [`Transaction::new`], [`Transaction::reward`], or
//!    [`TransactionBuilder`].
//! 2. **Sign**: [`Transaction::sign`] with the sender's keypair. Only a key
//!    whose derived address is the sender may sign.
//! 3. **Exchange**: [`SignedTransaction::to_record`] for the wire.
//! 4. **Verify**: `is_valid` on any of the three representations.
//!
//! Rewards (no sender) skip signing entirely and always verify.

pub mod builder;
pub mod record;
pub mod request;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use record::TransactionRecord;
pub use request::{RequestError, TransferRequest};
pub use signing::{sign_transaction, SignedTransaction};
pub use types::Amount;
pub use verification::{verify_transaction, TransactionError};
