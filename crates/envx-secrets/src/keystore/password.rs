//! Password-derived key provider.
//!
//! No key is ever stored. Each account has a 32-byte random salt in
//! `<salt_dir>/<account>.salt`; the key is PBKDF2-HMAC-SHA256 over the
//! password and that salt.
//!
//! Password resolution, highest priority first:
//! 1. explicit password from configuration (`--password`)
//! 2. the `ENVX_PASSWORD` environment variable
//! 3. a hidden terminal prompt, asked twice when creating a key
//!
//! The salt is written before the password is confirmed. A failed
//! confirmation therefore leaves the salt behind and the next attempt reuses
//! it instead of rotating it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use envx_core::env::{self, vars};
use envx_core::{paths, SecretString};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::{validate_account, KeyProvider};
use crate::error::{Result, SecretError};
use crate::key::{check_size, Key, KEY_SIZE};

/// Default PBKDF2 work factor.
pub const DEFAULT_ITERATIONS: u32 = envx_core::config::DEFAULT_ITERATIONS;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 32;

/// Source of interactively entered passwords.
pub trait PasswordPrompt: Send + Sync {
    /// Ask for a password, displaying `message`. Input must not be echoed.
    fn prompt(&self, message: &str) -> Result<SecretString>;
}

impl<F> PasswordPrompt for F
where
    F: Fn(&str) -> Result<SecretString> + Send + Sync,
{
    fn prompt(&self, message: &str) -> Result<SecretString> {
        self(message)
    }
}

/// Reads from the controlling terminal with echo disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn prompt(&self, message: &str) -> Result<SecretString> {
        rpassword::prompt_password(format!("{message}: "))
            .map(SecretString::from)
            .map_err(|e| SecretError::Prompt(e.to_string()))
    }
}

/// Settings for [`PasswordKeyProvider`].
pub struct PasswordConfig {
    /// Directory holding `<account>.salt` files.
    pub salt_dir: PathBuf,
    pub iterations: u32,
    /// Pre-supplied password; skips the environment and the prompt.
    pub password: Option<SecretString>,
    /// Environment variable consulted before prompting. `None` disables it.
    pub env_var: Option<String>,
    pub prompt: Box<dyn PasswordPrompt>,
}

impl PasswordConfig {
    pub fn new(salt_dir: impl Into<PathBuf>) -> Self {
        Self {
            salt_dir: salt_dir.into(),
            iterations: DEFAULT_ITERATIONS,
            password: None,
            env_var: Some(vars::ENVX_PASSWORD.to_string()),
            prompt: Box::new(TerminalPrompt),
        }
    }

    /// Config rooted at the envx home salt directory.
    pub fn from_default_dir() -> Result<Self> {
        Ok(Self::new(paths::salts_dir()?))
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_env_var(mut self, name: Option<&str>) -> Self {
        self.env_var = name.map(str::to_string);
        self
    }

    pub fn with_prompt(mut self, prompt: impl PasswordPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }
}

/// Key provider deriving keys from a password and a per-account salt.
pub struct PasswordKeyProvider {
    config: PasswordConfig,
}

impl PasswordKeyProvider {
    pub fn new(config: PasswordConfig) -> Self {
        if config.iterations < envx_core::config::MIN_ITERATIONS {
            warn!(
                iterations = config.iterations,
                "PBKDF2 work factor is below the recommended minimum"
            );
        }
        Self { config }
    }

    /// Location of the salt file for `account`.
    pub fn salt_path(&self, account: &str) -> PathBuf {
        self.config.salt_dir.join(format!("{account}.salt"))
    }

    /// Read the account's salt. `Ok(None)` only when the file does not exist.
    fn read_salt(&self, account: &str) -> Result<Option<[u8; SALT_SIZE]>> {
        let path = self.salt_path(account);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let salt: [u8; SALT_SIZE] =
            bytes.as_slice().try_into().map_err(|_| SecretError::CorruptSalt {
                path: path.clone(),
                reason: format!("expected {SALT_SIZE} bytes, got {}", bytes.len()),
            })?;
        Ok(Some(salt))
    }

    fn write_salt(&self, account: &str, salt: &[u8; SALT_SIZE]) -> Result<()> {
        ensure_dir(&self.config.salt_dir)?;
        let path = self.salt_path(account);
        write_private_file(&path, salt)?;
        debug!(account, path = %path.display(), "wrote new salt");
        Ok(())
    }

    /// Existing salt, or a fresh one persisted now.
    fn load_or_create_salt(&self, account: &str) -> Result<[u8; SALT_SIZE]> {
        if let Some(salt) = self.read_salt(account)? {
            debug!(account, "reusing existing salt");
            return Ok(salt);
        }
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        self.write_salt(account, &salt)?;
        Ok(salt)
    }

    fn resolve_password(&self, account: &str, confirm: bool) -> Result<SecretString> {
        if let Some(password) = self.config.password.as_ref().filter(|p| !p.is_empty()) {
            debug!(account, "using explicitly supplied password");
            return Ok(password.clone());
        }

        if let Some(var) = &self.config.env_var {
            if let Some(password) = env::get_var(var) {
                debug!(account, var = %var, "using password from environment");
                return Ok(SecretString::new(password));
            }
        }

        if !confirm {
            return self
                .config
                .prompt
                .prompt(&format!("Enter password for {account}"));
        }

        let first = self
            .config
            .prompt
            .prompt(&format!("Create password for {account}"))?;
        let second = self
            .config
            .prompt
            .prompt(&format!("Confirm password for {account}"))?;
        if first != second {
            return Err(SecretError::PasswordMismatch);
        }
        Ok(first)
    }

    fn derive(&self, password: &SecretString, salt: &[u8]) -> Key {
        let mut out = [0u8; KEY_SIZE];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.config.iterations, &mut out);
        let key = Key::from_array(out);
        out.zeroize();
        key
    }
}

impl KeyProvider for PasswordKeyProvider {
    fn get_key(&self, account: &str) -> Result<Key> {
        validate_account(account)?;
        // No salt means nothing was provisioned; don't ask for a password.
        let salt = self
            .read_salt(account)?
            .ok_or_else(|| SecretError::KeyNotFound(account.to_string()))?;
        let password = self.resolve_password(account, false)?;
        Ok(self.derive(&password, &salt))
    }

    fn set_key(&self, _account: &str, key: &[u8]) -> Result<()> {
        check_size(key)?;
        Err(SecretError::UnsupportedOperation(
            "the password keystore derives keys from a password and cannot store one".to_string(),
        ))
    }

    fn create_key(&self, account: &str) -> Result<Key> {
        validate_account(account)?;
        let salt = self.load_or_create_salt(account)?;
        let password = self.resolve_password(account, true)?;
        Ok(self.derive(&password, &salt))
    }
}

/// Create `dir` (and parents) with mode 0700 on Unix.
fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

/// Write `data` to `path` with mode 0600 on Unix.
fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
