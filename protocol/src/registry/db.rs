//! # SledKeyStore
//!
//! Persistent key store on sled's embedded key-value engine.
//!
//! ## Tree Layout
//!
//! | Tree          | Key               | Value                 |
//! |---------------|-------------------|-----------------------|
//! | `public_keys` | address (UTF-8)   | public key (32 bytes) |
//!
//! Addresses are fixed-width lowercase hex, so sled's lexicographic key
//! order is also the order `addresses()` returns.

use std::path::Path;

use sled::{CompareAndSwapError, Db, IVec, Tree};

use super::{KeyStore, RegistryError, RegistryResult};
use crate::config::KEY_REGISTRY_TREE;
use crate::crypto::{Address, CoinletPublicKey};

/// A [`KeyStore`] persisted in a sled database.
///
/// sled trees support concurrent readers and serialize writers internally,
/// so a `SledKeyStore` can be shared via `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct SledKeyStore {
    db: Db,
    keys: Tree,
}

impl SledKeyStore {
    /// Open or create a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A store that is deleted when dropped. For tests.
    pub fn open_temporary() -> RegistryResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> RegistryResult<Self> {
        let keys = db.open_tree(KEY_REGISTRY_TREE)?;
        Ok(Self { db, keys })
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Block until every write so far is on disk.
    pub fn flush(&self) -> RegistryResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_key(bytes: &IVec) -> RegistryResult<CoinletPublicKey> {
    CoinletPublicKey::try_from_slice(bytes)
        .map_err(|e| RegistryError::Corrupt(format!("stored public key: {e}")))
}

impl KeyStore for SledKeyStore {
    fn put_if_absent(
        &self,
        address: &Address,
        key: &CoinletPublicKey,
    ) -> RegistryResult<Option<CoinletPublicKey>> {
        let outcome = self.keys.compare_and_swap(
            address.as_str().as_bytes(),
            None::<&[u8]>,
            Some(key.as_bytes().to_vec()),
        )?;

        match outcome {
            Ok(()) => {
                self.keys.flush()?;
                Ok(None)
            }
            Err(CompareAndSwapError {
                current: Some(existing),
                ..
            }) => Ok(Some(decode_key(&existing)?)),
            Err(CompareAndSwapError { current: None, .. }) => Err(RegistryError::Corrupt(
                format!("compare-and-swap on {address} failed with no current value"),
            )),
        }
    }

    fn get(&self, address: &Address) -> RegistryResult<Option<CoinletPublicKey>> {
        self.keys
            .get(address.as_str().as_bytes())?
            .map(|bytes| decode_key(&bytes))
            .transpose()
    }

    fn addresses(&self) -> RegistryResult<Vec<Address>> {
        self.keys
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                let s = std::str::from_utf8(&key)
                    .map_err(|_| RegistryError::Corrupt("non-UTF-8 address key".into()))?;
                Address::parse(s).map_err(|e| RegistryError::Corrupt(format!("address key: {e}")))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{generate_address, CoinletKeypair};
    use crate::registry::KeyRegistry;

    #[test]
    fn open_temporary_store() {
        let store = SledKeyStore::open_temporary().expect("should create temp store");
        assert!(store.is_empty());
        assert!(store.addresses().unwrap().is_empty());
    }

    #[test]
    fn put_and_get() {
        let store = SledKeyStore::open_temporary().unwrap();
        let pk = CoinletKeypair::generate().public_key();
        let addr = generate_address(&pk);

        assert_eq!(store.put_if_absent(&addr, &pk).unwrap(), None);
        assert_eq!(store.get(&addr).unwrap(), Some(pk.clone()));
        assert_eq!(store.put_if_absent(&addr, &pk).unwrap(), Some(pk));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_is_none() {
        let store = SledKeyStore::open_temporary().unwrap();
        let addr = Address::parse(&"1".repeat(40)).unwrap();
        assert_eq!(store.get(&addr).unwrap(), None);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pk = CoinletKeypair::generate().public_key();

        let addr = {
            let reg = KeyRegistry::new(SledKeyStore::open(dir.path()).expect("should open store"));
            reg.register_key(&pk).unwrap()
        };

        let reg = KeyRegistry::new(SledKeyStore::open(dir.path()).expect("should reopen store"));
        assert_eq!(reg.lookup(&addr).unwrap(), Some(pk));
        assert_eq!(reg.list().unwrap(), vec![addr]);
    }

    #[test]
    fn addresses_come_back_sorted() {
        let store = SledKeyStore::open_temporary().unwrap();
        let mut expected = Vec::new();
        for _ in 0..4 {
            let pk = CoinletKeypair::generate().public_key();
            let addr = generate_address(&pk);
            store.put_if_absent(&addr, &pk).unwrap();
            expected.push(addr);
        }
        expected.sort();
        assert_eq!(store.addresses().unwrap(), expected);
    }

    #[test]
    fn corrupt_value_is_reported() {
        let store = SledKeyStore::open_temporary().unwrap();
        let addr = Address::parse(&"2".repeat(40)).unwrap();
        store.keys.insert(addr.as_str().as_bytes(), &[0u8; 3][..]).unwrap();

        assert!(matches!(store.get(&addr), Err(RegistryError::Corrupt(_))));
    }
}
