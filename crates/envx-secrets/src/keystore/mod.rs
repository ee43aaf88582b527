//! Key providers.
//!
//! Every backend implements [`KeyProvider`]; callers normally only use
//! [`KeyProvider::load_or_create_key`]. One provider is chosen per process
//! with [`build_provider`].
//!
//! Concurrent `create_key` calls for the same account from two processes
//! race and the last writer wins. Provisioning is a one-off, human-driven
//! step, so no cross-process locking is attempted.

pub mod keychain;
pub mod memory;
pub mod password;

use envx_core::{KeystoreKind, SecretString};
use tracing::debug;

use crate::error::{Result, SecretError};
use crate::key::Key;

pub use keychain::{KeychainKeyProvider, PlatformStore, SecureStore, SERVICE_NAME};
pub use memory::MemoryKeyProvider;
pub use password::{PasswordConfig, PasswordKeyProvider, PasswordPrompt, TerminalPrompt};

/// Maximum allowed length for an account name.
const MAX_ACCOUNT_LEN: usize = 128;

/// Load, store and create the key for an account.
pub trait KeyProvider: Send + Sync {
    /// Return the existing key. Fails with [`SecretError::KeyNotFound`] when
    /// none has been provisioned; never creates one.
    fn get_key(&self, account: &str) -> Result<Key>;

    /// Store `key` for the account, replacing any existing key.
    fn set_key(&self, account: &str, key: &[u8]) -> Result<()>;

    /// Provision a new key. Refuses to replace a readable existing key.
    fn create_key(&self, account: &str) -> Result<Key>;

    /// Return the account's key, creating it on first use.
    ///
    /// Only a clean "not found" leads to creation. Corrupt records and I/O
    /// failures propagate, since a fresh key would orphan existing values.
    fn load_or_create_key(&self, account: &str) -> Result<Key> {
        match self.get_key(account) {
            Ok(key) => Ok(key),
            Err(e) if e.is_not_found() => {
                debug!(account, "no key provisioned yet, creating one");
                self.create_key(account)
            }
            Err(e) => Err(e),
        }
    }
}

/// Inputs for [`build_provider`].
#[derive(Debug, Default)]
pub struct ProviderOptions {
    pub kind: KeystoreKind,
    /// Password keystore work factor; `None` uses the default.
    pub iterations: Option<u32>,
    /// Password supplied on the command line.
    pub password: Option<SecretString>,
}

/// Construct the provider selected by configuration.
pub fn build_provider(options: ProviderOptions) -> Result<Box<dyn KeyProvider>> {
    debug!(keystore = %options.kind, "selecting key provider");
    let provider: Box<dyn KeyProvider> = match options.kind {
        KeystoreKind::Keychain => Box::new(KeychainKeyProvider::platform()),
        KeystoreKind::Password => {
            let mut config = PasswordConfig::from_default_dir()?;
            if let Some(iterations) = options.iterations {
                config.iterations = iterations;
            }
            config.password = options.password;
            Box::new(PasswordKeyProvider::new(config))
        }
        KeystoreKind::Memory => Box::new(MemoryKeyProvider::new()),
    };
    Ok(provider)
}

/// Validate an account name before it reaches a file name or a keychain.
///
/// Rejects empty names, path separators, NUL and a leading dot.
pub fn validate_account(account: &str) -> Result<()> {
    if account.is_empty() {
        return Err(SecretError::InvalidAccount(
            "account must not be empty".to_string(),
        ));
    }
    if account.len() > MAX_ACCOUNT_LEN {
        return Err(SecretError::InvalidAccount(format!(
            "account exceeds maximum length of {MAX_ACCOUNT_LEN} characters"
        )));
    }
    if account.starts_with('.') {
        return Err(SecretError::InvalidAccount(format!(
            "account must not start with '.': {account}"
        )));
    }
    if account.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control()) {
        return Err(SecretError::InvalidAccount(format!(
            "account contains a path separator or control character: {account:?}"
        )));
    }
    Ok(())
}
