//! # Key Registry
//!
//! Maps addresses to the public keys that control them, so a verifier
//! holding only a transaction's `fromAddress` can find the key to check
//! its signature against.
//!
//! ```text
//! mod.rs    KeyStore trait, KeyRegistry, RegistryError
//! memory.rs MemoryKeyStore: process-local, for tests and throwaway nodes
//! db.rs     SledKeyStore: on-disk, survives restarts
//! ```
//!
//! The registry owns no global state. Whoever needs it is handed one
//! explicitly (usually behind an `Arc`), and the backend is chosen by the
//! caller.
//!
//! Every entry satisfies `generate_address(key) == address`. Registration
//! rejects anything else, and an address, once bound, is never rebound to
//! a different key.

pub mod db;
pub mod memory;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::crypto::{generate_address, Address, CoinletPublicKey};

pub use db::SledKeyStore;
pub use memory::MemoryKeyStore;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("sled error: {0}")]
    Storage(#[from] sled::Error),

    #[error("corrupt registry entry: {0}")]
    Corrupt(String),

    #[error("public key derives to {derived}, not {claimed}")]
    AddressMismatch { claimed: Address, derived: Address },

    #[error("address {0} is already bound to a different key")]
    AlreadyRegistered(Address),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

// ---------------------------------------------------------------------------
// Storage backend
// ---------------------------------------------------------------------------

/// A backend holding address -> public key entries.
///
/// Implementations must be safe to share across threads. `put_if_absent`
/// must be atomic: two concurrent calls for the same address must not
/// both insert.
pub trait KeyStore: Send + Sync {
    /// Inserts `key` under `address` unless an entry already exists.
    /// Returns the existing key if there was one.
    fn put_if_absent(
        &self,
        address: &Address,
        key: &CoinletPublicKey,
    ) -> RegistryResult<Option<CoinletPublicKey>>;

    fn get(&self, address: &Address) -> RegistryResult<Option<CoinletPublicKey>>;

    /// All registered addresses in ascending order.
    fn addresses(&self) -> RegistryResult<Vec<Address>>;
}

impl<S: KeyStore + ?Sized> KeyStore for Box<S> {
    fn put_if_absent(
        &self,
        address: &Address,
        key: &CoinletPublicKey,
    ) -> RegistryResult<Option<CoinletPublicKey>> {
        (**self).put_if_absent(address, key)
    }

    fn get(&self, address: &Address) -> RegistryResult<Option<CoinletPublicKey>> {
        (**self).get(address)
    }

    fn addresses(&self) -> RegistryResult<Vec<Address>> {
        (**self).addresses()
    }
}

// ---------------------------------------------------------------------------
// KeyRegistry
// ---------------------------------------------------------------------------

/// Address -> public key lookups over an injected [`KeyStore`].
#[derive(Debug, Default)]
pub struct KeyRegistry<S> {
    store: S,
}

impl<S: KeyStore> KeyRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Binds `key` to `address`.
    ///
    /// Returns `Ok(true)` when a new entry was written and `Ok(false)` when
    /// the same key was already registered.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AddressMismatch`] if `key` does not derive to
    ///   `address`.
    /// - [`RegistryError::AlreadyRegistered`] if `address` is bound to some
    ///   other key.
    pub fn register(&self, address: &Address, key: &CoinletPublicKey) -> RegistryResult<bool> {
        let derived = generate_address(key);
        if derived != *address {
            warn!(claimed = %address, derived = %derived, "refusing key for foreign address");
            return Err(RegistryError::AddressMismatch {
                claimed: address.clone(),
                derived,
            });
        }

        match self.store.put_if_absent(address, key)? {
            None => {
                info!(address = %address, "public key registered");
                Ok(true)
            }
            Some(existing) if existing == *key => {
                debug!(address = %address, "public key already registered");
                Ok(false)
            }
            Some(_) => Err(RegistryError::AlreadyRegistered(address.clone())),
        }
    }

    /// Registers `key` under its own derived address and returns that
    /// address.
    pub fn register_key(&self, key: &CoinletPublicKey) -> RegistryResult<Address> {
        let address = generate_address(key);
        self.register(&address, key)?;
        Ok(address)
    }

    pub fn lookup(&self, address: &Address) -> RegistryResult<Option<CoinletPublicKey>> {
        self.store.get(address)
    }

    pub fn list(&self) -> RegistryResult<Vec<Address>> {
        self.store.addresses()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
