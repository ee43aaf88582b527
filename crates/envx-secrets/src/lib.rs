//! Value envelopes and key providers for envx.
//!
//! [`envelope`] encrypts individual config values into a self-describing,
//! base64 AES-256-GCM format that can recognise its own output.
//! [`keystore`] supplies the 32-byte key for an account from the platform
//! keychain, a password plus salt file, or process memory.

pub mod envelope;
pub mod error;
pub mod key;
pub mod keystore;

pub use envelope::{decrypt, encrypt, is_encrypted, MAGIC};
pub use error::{Result, SecretError};
pub use key::{Key, KEY_SIZE};
pub use keystore::{build_provider, KeyProvider, ProviderOptions};
