//! Configuration schema definitions.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default PBKDF2 work factor for the password keystore.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Lowest work factor accepted from configuration.
pub const MIN_ITERATIONS: u32 = 1_000;

/// Key backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeystoreKind {
    /// Platform secure credential storage (macOS Keychain).
    #[serde(alias = "macos")]
    Keychain,
    /// Key derived from a password and a per-account salt file.
    Password,
    /// In-process map; keys vanish when the process exits.
    #[serde(alias = "mock")]
    Memory,
}

impl KeystoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keychain => "keychain",
            Self::Password => "password",
            Self::Memory => "memory",
        }
    }
}

impl Default for KeystoreKind {
    /// The keychain where the platform has one, the password keystore elsewhere.
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Keychain
        } else {
            Self::Password
        }
    }
}

impl fmt::Display for KeystoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeystoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" | "macos" => Ok(Self::Keychain),
            "password" => Ok(Self::Password),
            "memory" | "mock" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownKeystore(other.to_string())),
        }
    }
}

/// Output format for commands that print variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `KEY=VALUE` lines.
    #[default]
    Env,
    /// A JSON object.
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" | "dotenv" => Ok(Self::Env),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                key: ConfigKey::Format.to_string(),
                message: format!("unknown format '{other}' (expected env or json)"),
            }),
        }
    }
}

/// A configuration setting that can be read, set or reset by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Keystore,
    File,
    Name,
    Account,
    Format,
    Iterations,
    BackupOnWrite,
}

impl ConfigKey {
    /// Every key, in display order.
    pub const ALL: [ConfigKey; 7] = [
        Self::Keystore,
        Self::File,
        Self::Name,
        Self::Account,
        Self::Format,
        Self::Iterations,
        Self::BackupOnWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keystore => "keystore",
            Self::File => "file",
            Self::Name => "name",
            Self::Account => "account",
            Self::Format => "format",
            Self::Iterations => "iterations",
            Self::BackupOnWrite => "backup_on_write",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    /// Case-insensitive; `-` and `_` are interchangeable and optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        // `key_name` is the older spelling of `account`.
        if wanted == "keyname" {
            return Ok(Self::Account);
        }
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().replace('_', "") == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.trim().to_string()))
    }
}

/// Effective envx configuration after all layers are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Key backend.
    #[serde(default)]
    pub keystore: KeystoreKind,

    /// Env file operated on when no name or file is given.
    #[serde(default = "default_file")]
    pub file: String,

    /// Environment name; selects `.env.<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Account the key is scoped to. Defaults to the OS user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Default output format for printing commands.
    #[serde(default)]
    pub format: OutputFormat,

    /// PBKDF2 iterations for the password keystore.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Copy the previous file to `<file>.bak` before overwriting it.
    #[serde(default = "default_true")]
    pub backup_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keystore: KeystoreKind::default(),
            file: default_file(),
            name: None,
            account: None,
            format: OutputFormat::default(),
            iterations: DEFAULT_ITERATIONS,
            backup_on_write: true,
        }
    }
}

fn default_file() -> String {
    ".env".to_string()
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_true() -> bool {
    true
}

/// One configuration layer. Only the fields a layer sets take effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore: Option<KeystoreKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_on_write: Option<bool>,
}

impl Config {
    /// Apply a layer on top of this configuration.
    pub fn merge(&mut self, overlay: &ConfigOverlay) {
        if let Some(keystore) = overlay.keystore {
            self.keystore = keystore;
        }
        if let Some(file) = &overlay.file {
            self.file = file.clone();
        }
        if let Some(name) = &overlay.name {
            self.name = Some(name.clone());
        }
        if let Some(account) = &overlay.account {
            self.account = Some(account.clone());
        }
        if let Some(format) = overlay.format {
            self.format = format;
        }
        if let Some(iterations) = overlay.iterations {
            self.iterations = iterations;
        }
        if let Some(backup) = overlay.backup_on_write {
            self.backup_on_write = backup;
        }
    }
}

impl Config {
    /// Display value of `key`. An unset account shows the OS user it falls back to.
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::Keystore => self.keystore.to_string(),
            ConfigKey::File => self.file.clone(),
            ConfigKey::Name => self.name.clone().unwrap_or_default(),
            ConfigKey::Account => self.account(),
            ConfigKey::Format => self.format.to_string(),
            ConfigKey::Iterations => self.iterations.to_string(),
            ConfigKey::BackupOnWrite => self.backup_on_write.to_string(),
        }
    }
}

impl ConfigOverlay {
    /// Whether this layer sets anything at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether this layer sets `key`.
    pub fn contains(&self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::Keystore => self.keystore.is_some(),
            ConfigKey::File => self.file.is_some(),
            ConfigKey::Name => self.name.is_some(),
            ConfigKey::Account => self.account.is_some(),
            ConfigKey::Format => self.format.is_some(),
            ConfigKey::Iterations => self.iterations.is_some(),
            ConfigKey::BackupOnWrite => self.backup_on_write.is_some(),
        }
    }

    /// Parse `value` and set `key` in this layer.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if value.is_empty() {
            return Err(invalid("value must not be empty; use reset to remove it".to_string()));
        }

        match key {
            ConfigKey::Keystore => self.keystore = Some(value.parse()?),
            ConfigKey::File => self.file = Some(value.to_string()),
            ConfigKey::Name => self.name = Some(value.to_string()),
            ConfigKey::Account => self.account = Some(value.to_string()),
            ConfigKey::Format => self.format = Some(value.parse()?),
            ConfigKey::Iterations => {
                let iterations = value
                    .parse::<u32>()
                    .map_err(|e| invalid(format!("not a number: {e}")))?;
                if iterations < MIN_ITERATIONS {
                    return Err(invalid(format!("must be at least {MIN_ITERATIONS}")));
                }
                self.iterations = Some(iterations);
            }
            ConfigKey::BackupOnWrite => {
                let flag = match value.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => true,
                    "false" | "no" | "off" | "0" => false,
                    other => return Err(invalid(format!("expected true or false, got '{other}'"))),
                };
                self.backup_on_write = Some(flag);
            }
        }
        Ok(())
    }

    /// Remove `key` from this layer.
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Keystore => self.keystore = None,
            ConfigKey::File => self.file = None,
            ConfigKey::Name => self.name = None,
            ConfigKey::Account => self.account = None,
            ConfigKey::Format => self.format = None,
            ConfigKey::Iterations => self.iterations = None,
            ConfigKey::BackupOnWrite => self.backup_on_write = None,
        }
    }
}
