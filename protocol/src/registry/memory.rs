//! In-memory key store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{KeyStore, RegistryResult};
use crate::crypto::{Address, CoinletPublicKey};

/// A [`KeyStore`] backed by a `HashMap`. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<Address, CoinletPublicKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn put_if_absent(
        &self,
        address: &Address,
        key: &CoinletPublicKey,
    ) -> RegistryResult<Option<CoinletPublicKey>> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(address) {
            return Ok(Some(existing.clone()));
        }
        entries.insert(address.clone(), key.clone());
        Ok(None)
    }

    fn get(&self, address: &Address) -> RegistryResult<Option<CoinletPublicKey>> {
        Ok(self.entries.read().get(address).cloned())
    }

    fn addresses(&self) -> RegistryResult<Vec<Address>> {
        let mut addresses: Vec<Address> = self.entries.read().keys().cloned().collect();
        addresses.sort();
        Ok(addresses)
    }
}
