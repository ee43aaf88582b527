//! In-memory key provider for tests and non-persistent environments.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use super::KeyProvider;
use crate::error::{Result, SecretError};
use crate::key::Key;

/// Keeps keys in a mutex-guarded map for the lifetime of the value.
#[derive(Default)]
pub struct MemoryKeyProvider {
    keys: Mutex<HashMap<String, Key>>,
}

impl MemoryKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts holding a key.
    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

impl KeyProvider for MemoryKeyProvider {
    fn get_key(&self, account: &str) -> Result<Key> {
        self.keys
            .lock()
            .get(account)
            .cloned()
            .ok_or_else(|| SecretError::KeyNotFound(account.to_string()))
    }

    fn set_key(&self, account: &str, key: &[u8]) -> Result<()> {
        let key = Key::try_from(key)?;
        self.keys.lock().insert(account.to_string(), key);
        Ok(())
    }

    fn create_key(&self, account: &str) -> Result<Key> {
        // Check and insert under one lock so two threads cannot both create.
        let mut keys = self.keys.lock();
        if keys.contains_key(account) {
            return Err(SecretError::KeyExists(account.to_string()));
        }
        let key = Key::generate();
        keys.insert(account.to_string(), key.clone());
        debug!(account, "created in-memory key");
        Ok(key)
    }

    fn load_or_create_key(&self, account: &str) -> Result<Key> {
        let mut keys = self.keys.lock();
        let key = keys.entry(account.to_string()).or_insert_with(|| {
            debug!(account, "created in-memory key");
            Key::generate()
        });
        Ok(key.clone())
    }
}
