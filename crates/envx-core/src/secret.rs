//! Zeroize-on-drop string for passwords and decrypted values.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that is zeroed on drop.
///
/// Used for keystore passwords and values typed at a hidden prompt. It has
/// no `Serialize` impl so it cannot end up in a config file by accident.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Expose the secret value.
    ///
    /// Use sparingly - only when the actual value is needed.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Raw bytes of the secret, for key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

// Never print secrets
impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.inner.as_bytes(), other.inner.as_bytes())
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Constant-time byte comparison. Length is not hidden.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_redacted() {
        let password = SecretString::new("hunter2");
        assert_eq!(format!("{:?}", password), "[REDACTED]");
        assert_eq!(format!("{}", password), "[REDACTED]");
    }

    #[test]
    fn test_expose_and_bytes() {
        let password = SecretString::new("héllo");
        assert_eq!(password.expose_secret(), "héllo");
        assert_eq!(password.as_bytes(), "héllo".as_bytes());
        assert_eq!(password.len(), 6);
        assert!(!password.is_empty());
        assert!(SecretString::default().is_empty());
    }

    #[test]
    fn test_confirmation_equality() {
        let first = SecretString::new("correct");
        let again = SecretString::from("correct");
        let typo = SecretString::from("incorrect".to_string());

        assert_eq!(first, again);
        assert_ne!(first, typo);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"envx", b"envx"));
        assert!(!constant_time_eq(b"envx", b"envy"));
        assert!(!constant_time_eq(b"envx", b"env"));
    }
}
