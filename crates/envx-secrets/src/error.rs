//! Error types for envelopes and key providers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during envelope or keystore operations.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// No key has been provisioned for the account yet.
    #[error("Key not found for account: {0}")]
    KeyNotFound(String),

    #[error("Key already exists for account: {0} (set it explicitly to overwrite)")]
    KeyExists(String),

    #[error("Stored key for account {account} is corrupt: {reason}")]
    CorruptKey { account: String, reason: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("{0} is not available on this platform; choose the password keystore instead")]
    PlatformUnavailable(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Invalid account name: {0}")]
    InvalidAccount(String),

    #[error("Salt file {path} exists but cannot be used: {reason}")]
    CorruptSalt { path: PathBuf, reason: String },

    #[error("Password prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] envx_core::ConfigError),
}

impl SecretError {
    /// Whether this is the "not provisioned yet" signal that triggers creation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

/// Convenience result alias for envelope and keystore operations.
pub type Result<T> = std::result::Result<T, SecretError>;
