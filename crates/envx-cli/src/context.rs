//! State shared by the file-editing commands.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use envx_core::{Config, KeystoreKind, SecretString};
use envx_secrets::{build_provider, is_encrypted, Key, KeyProvider, ProviderOptions, SecretError};
use tracing::{debug, info, warn};

use crate::dotenv::Document;
use crate::GlobalArgs;

/// Effective settings for one invocation.
pub struct Context {
    pub config: Config,
    pub env_file: PathBuf,
    pub account: String,
    password: Option<SecretString>,
}

impl Context {
    /// Load layered configuration and apply command-line overrides.
    pub fn load(global: &GlobalArgs) -> anyhow::Result<Self> {
        let loaded = Config::load_default().context("failed to load configuration")?;
        for source in &loaded.sources {
            debug!(path = %source.display(), "loaded config layer");
        }
        Self::from_config(loaded.config, global)
    }

    pub fn from_config(mut config: Config, global: &GlobalArgs) -> anyhow::Result<Self> {
        match (global.keystore, &global.password) {
            (Some(kind), Some(_)) if kind != KeystoreKind::Password => {
                warn!(keystore = %kind, "--password is ignored by this keystore");
                config.keystore = kind;
            }
            (Some(kind), _) => config.keystore = kind,
            // A password only means something to the password keystore.
            (None, Some(_)) => config.keystore = KeystoreKind::Password,
            (None, None) => {}
        }
        if let Some(account) = &global.account {
            config.account = Some(account.clone());
        }
        config.validate()?;

        let env_file = config.env_file(global.file.as_deref(), global.name.as_deref());
        let account = config.account();
        debug!(
            file = %env_file.display(),
            account = %account,
            keystore = %config.keystore,
            "resolved invocation settings"
        );

        Ok(Self {
            config,
            env_file,
            account,
            password: global.password.clone().map(SecretString::from),
        })
    }

    pub fn provider(&self) -> anyhow::Result<Box<dyn KeyProvider>> {
        if self.config.keystore == KeystoreKind::Memory {
            warn!("memory keystore keys are discarded when envx exits");
        }
        let provider = build_provider(ProviderOptions {
            kind: self.config.keystore,
            iterations: Some(self.config.iterations),
            password: self.password.clone(),
        })?;
        Ok(provider)
    }

    /// The account's key, provisioning one on first use.
    pub fn key_for_writing(&self) -> anyhow::Result<Key> {
        self.provider()?
            .load_or_create_key(&self.account)
            .with_context(|| format!("failed to load key for account '{}'", self.account))
    }

    /// The account's existing key. Never provisions.
    pub fn key_for_reading(&self) -> anyhow::Result<Key> {
        match self.provider()?.get_key(&self.account) {
            Ok(key) => Ok(key),
            Err(SecretError::KeyNotFound(_)) => anyhow::bail!(
                "no key provisioned for account '{}'; encrypt or set a value first",
                self.account
            ),
            Err(e) => Err(e)
                .with_context(|| format!("failed to load key for account '{}'", self.account)),
        }
    }

    /// Key for decrypting `doc`, or `None` when it holds no ciphertext.
    pub fn key_for_document(&self, doc: &Document) -> anyhow::Result<Option<Key>> {
        if doc.entries().any(|e| is_encrypted(e.value())) {
            self.key_for_reading().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_document(&self) -> anyhow::Result<Document> {
        let doc = Document::load(&self.env_file)?;
        if doc.is_empty() {
            info!(file = %self.env_file.display(), "env file is empty or missing");
        }
        Ok(doc)
    }

    /// Replace the env file with `doc`, keeping a `.bak` copy when enabled.
    pub fn write_document(&self, doc: &Document) -> anyhow::Result<()> {
        write_env_file(&self.env_file, &doc.render(), self.config.backup_on_write)
            .with_context(|| format!("failed to write {}", self.env_file.display()))
    }
}

/// `<file>.bak` next to the env file.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

fn write_env_file(path: &Path, content: &str, backup: bool) -> io::Result<()> {
    let existing = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    if existing.is_some() && backup {
        let bak = backup_path(path);
        fs::copy(path, &bak)?;
        debug!(backup = %bak.display(), "saved previous env file");
    }

    // Write atomically through a temp file that is owner-only from creation.
    let temp = temp_path(path);
    match fs::remove_file(&temp) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let result = write_private(&temp, content).and_then(|()| {
        if let Some(permissions) = existing {
            fs::set_permissions(&temp, permissions)?;
        }
        fs::rename(&temp, path)
    });
    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    info!(file = %path.display(), "wrote env file");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Create `path` (which must not exist) with mode 0600 on Unix and fill it.
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    opts.mode(0o600);

    let mut file = opts.open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
