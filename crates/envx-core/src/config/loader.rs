//! Configuration loading and persistence.

use super::{Config, ConfigLayers, ConfigOverlay, MIN_ITERATIONS};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Configuration together with the files it was assembled from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Files that contributed a layer, lowest precedence first.
    pub sources: Vec<PathBuf>,
    /// Ignored YAML config files from earlier releases.
    pub legacy: Vec<PathBuf>,
}

impl ConfigOverlay {
    /// Load a layer from `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&content)
            .map(Some)
            .map_err(|message| ConfigError::Json5 {
                path: path.to_path_buf(),
                message,
            })
    }

    /// Parse a layer from JSON5 text.
    pub fn parse(content: &str) -> Result<Self, String> {
        json5::from_str(content).map_err(|e| e.to_string())
    }

    /// Save only the fields this layer sets.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        write_atomic(path, &serde_json::to_string_pretty(self)?)
    }

    /// Delete a layer file. A missing file is not an error.
    pub fn remove(path: &Path) -> crate::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl Config {
    /// Load defaults, then the global file, then `<dir>/.envx.json5`.
    pub fn load_layered(global: &Path, dir: &Path) -> Result<LoadedConfig, ConfigError> {
        Self::from_layers(ConfigLayers::load(global, dir)?)
    }

    fn from_layers(layers: ConfigLayers) -> Result<LoadedConfig, ConfigError> {
        Ok(LoadedConfig {
            config: layers.effective()?,
            sources: layers.sources(),
            legacy: layers.legacy,
        })
    }

    /// Load the layered configuration for the current directory.
    pub fn load_default() -> Result<LoadedConfig, ConfigError> {
        Self::from_layers(ConfigLayers::load_default()?)
    }

    /// Save configuration to the global config path.
    pub fn save_default(&self) -> crate::Result<PathBuf> {
        let path = paths::config_file()?;
        self.save(&path)?;
        Ok(path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        write_atomic(path, &self.to_json5()?)
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> crate::Result<String> {
        // json5 doesn't have a serializer; JSON is valid JSON5
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.iterations < MIN_ITERATIONS {
            errors.push(format!(
                "iterations must be at least {MIN_ITERATIONS}, got {}",
                self.iterations
            ));
        }

        if self.file.trim().is_empty() {
            errors.push("file must not be empty".to_string());
        }

        if let Some(account) = &self.account {
            if account.trim().is_empty() {
                errors.push("account must not be empty when set".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// The key account: the configured one, or the OS user.
    pub fn account(&self) -> String {
        self.account.clone().unwrap_or_else(env::current_user)
    }

    /// The env file selected by explicit flags, falling back to this config.
    pub fn env_file(&self, file: Option<&str>, name: Option<&str>) -> PathBuf {
        let name = name.or(self.name.as_deref());
        paths::resolve_env_file(file, name, &self.file)
    }
}

fn write_atomic(path: &Path, content: &str) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
