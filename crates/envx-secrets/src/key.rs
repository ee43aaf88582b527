//! The 256-bit symmetric key type.

use std::fmt;

use envx_core::secret::constant_time_eq;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SecretError};

/// Key length in bytes. Part of the on-disk contract.
pub const KEY_SIZE: usize = 32;

/// A 32-byte key, zeroed on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Generate a fresh key from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_array(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Fail with [`SecretError::InvalidKeySize`] unless `key` is [`KEY_SIZE`] bytes.
pub fn check_size(key: &[u8]) -> Result<()> {
    if key.len() != KEY_SIZE {
        return Err(SecretError::InvalidKeySize {
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    Ok(())
}

impl TryFrom<&[u8]> for Key {
    type Error = SecretError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_size(bytes)?;
        let mut out = [0u8; KEY_SIZE];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for Key {}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}
