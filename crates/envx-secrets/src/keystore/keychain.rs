//! Platform secure-storage key provider.
//!
//! Keys live in the OS credential store under ([`SERVICE_NAME`], account)
//! as the raw 32 key bytes. On macOS this is the login Keychain via Security.framework.
//! Other platforms have no implementation yet and every call fails with
//! [`SecretError::PlatformUnavailable`].

use tracing::debug;

use super::{validate_account, KeyProvider};
use crate::error::{Result, SecretError};
use crate::key::{check_size, Key, KEY_SIZE};

/// Keychain service identifier. Changing it strands existing keys.
pub const SERVICE_NAME: &str = "com.almahoozi.envx";

/// Narrow get/set access to a protected credential store.
pub trait SecureStore: Send + Sync {
    /// Read the secret for (service, account); `Ok(None)` when absent.
    fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or update the secret for (service, account).
    fn set(&self, service: &str, account: &str, data: &[u8]) -> Result<()>;
}

/// The host platform's credential store.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformStore;

/// Key provider backed by a [`SecureStore`].
pub struct KeychainKeyProvider {
    service: String,
    store: Box<dyn SecureStore>,
}

impl KeychainKeyProvider {
    pub fn new(service: impl Into<String>, store: Box<dyn SecureStore>) -> Self {
        Self {
            service: service.into(),
            store,
        }
    }

    /// Provider over the host platform store with the default service name.
    pub fn platform() -> Self {
        Self::new(SERVICE_NAME, Box::new(PlatformStore))
    }

    fn decode(&self, account: &str, data: &[u8]) -> Result<Key> {
        Key::try_from(data).map_err(|_| SecretError::CorruptKey {
            account: account.to_string(),
            reason: format!("expected {KEY_SIZE} bytes, got {}", data.len()),
        })
    }
}

impl KeyProvider for KeychainKeyProvider {
    fn get_key(&self, account: &str) -> Result<Key> {
        validate_account(account)?;
        match self.store.get(&self.service, account)? {
            Some(data) => {
                let key = self.decode(account, &data)?;
                debug!(account, "loaded key from keychain");
                Ok(key)
            }
            None => Err(SecretError::KeyNotFound(account.to_string())),
        }
    }

    fn set_key(&self, account: &str, key: &[u8]) -> Result<()> {
        check_size(key)?;
        validate_account(account)?;
        self.store.set(&self.service, account, key)?;
        debug!(account, "stored key in keychain");
        Ok(())
    }

    fn create_key(&self, account: &str) -> Result<Key> {
        match self.get_key(account) {
            Ok(_) => Err(SecretError::KeyExists(account.to_string())),
            Err(e) if e.is_not_found() => {
                let key = Key::generate();
                self.set_key(account, key.as_bytes())?;
                Ok(key)
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// macOS keychain implementation
// ---------------------------------------------------------------------------

/// `errSecItemNotFound`
#[cfg(target_os = "macos")]
const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;

#[cfg(target_os = "macos")]
impl SecureStore for PlatformStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>> {
        use security_framework::passwords::get_generic_password;

        match get_generic_password(service, account) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(None),
            Err(e) => Err(SecretError::Keychain(format!("keychain read failed: {e}"))),
        }
    }

    fn set(&self, service: &str, account: &str, data: &[u8]) -> Result<()> {
        use security_framework::passwords::set_generic_password;

        // Updates the item in place when it already exists.
        set_generic_password(service, account, data)
            .map_err(|e| SecretError::Keychain(format!("keychain write failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Everything else
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "macos"))]
impl SecureStore for PlatformStore {
    fn get(&self, _service: &str, _account: &str) -> Result<Option<Vec<u8>>> {
        Err(unavailable())
    }

    fn set(&self, _service: &str, _account: &str, _data: &[u8]) -> Result<()> {
        Err(unavailable())
    }
}

#[cfg(not(target_os = "macos"))]
fn unavailable() -> SecretError {
    SecretError::PlatformUnavailable("Keychain storage".to_string())
}
