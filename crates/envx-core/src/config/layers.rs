//! Per-scope configuration layers and where each effective value comes from.

use super::{Config, ConfigKey, ConfigOverlay};
use crate::error::ConfigError;
use crate::paths;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The config file a change is written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigScope {
    /// `<envx home>/config.json5`
    #[default]
    Global,
    /// `./.envx.json5`
    Directory,
}

impl ConfigScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Directory => "directory",
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of an effective configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    Global,
    Directory,
    /// A command-line flag or its environment variable.
    Cli,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Global => "global",
            Self::Directory => "directory",
            Self::Cli => "cli",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConfigScope> for ConfigSource {
    fn from(scope: ConfigScope) -> Self {
        match scope {
            ConfigScope::Global => Self::Global,
            ConfigScope::Directory => Self::Directory,
        }
    }
}

/// An effective value and the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcedValue {
    pub value: String,
    pub source: ConfigSource,
}

/// Every effective setting with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    pub keystore: SourcedValue,
    pub file: SourcedValue,
    pub name: SourcedValue,
    pub account: SourcedValue,
    pub format: SourcedValue,
    pub iterations: SourcedValue,
    pub backup_on_write: SourcedValue,
}

impl ConfigReport {
    pub fn get(&self, key: ConfigKey) -> &SourcedValue {
        match key {
            ConfigKey::Keystore => &self.keystore,
            ConfigKey::File => &self.file,
            ConfigKey::Name => &self.name,
            ConfigKey::Account => &self.account,
            ConfigKey::Format => &self.format,
            ConfigKey::Iterations => &self.iterations,
            ConfigKey::BackupOnWrite => &self.backup_on_write,
        }
    }

    /// Replace a value, recording where the new one came from.
    pub fn set(&mut self, key: ConfigKey, value: impl Into<String>, source: ConfigSource) {
        let slot = match key {
            ConfigKey::Keystore => &mut self.keystore,
            ConfigKey::File => &mut self.file,
            ConfigKey::Name => &mut self.name,
            ConfigKey::Account => &mut self.account,
            ConfigKey::Format => &mut self.format,
            ConfigKey::Iterations => &mut self.iterations,
            ConfigKey::BackupOnWrite => &mut self.backup_on_write,
        };
        *slot = SourcedValue {
            value: value.into(),
            source,
        };
    }

    /// All settings in display order.
    pub fn entries(&self) -> impl Iterator<Item = (ConfigKey, &SourcedValue)> + '_ {
        ConfigKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}

/// The global and directory layers as found on disk.
#[derive(Debug, Clone)]
pub struct ConfigLayers {
    pub global_path: PathBuf,
    pub directory_path: PathBuf,
    pub global: Option<ConfigOverlay>,
    pub directory: Option<ConfigOverlay>,
    /// YAML files from earlier releases that were found and ignored.
    pub legacy: Vec<PathBuf>,
}

impl ConfigLayers {
    /// Read the global file and `<dir>/.envx.json5`. Missing files are empty layers.
    pub fn load(global: &Path, dir: &Path) -> Result<Self, ConfigError> {
        let directory_path = paths::directory_config_file(dir);

        let legacy = paths::legacy_config_files(global, dir);
        for path in &legacy {
            warn!(
                path = %path.display(),
                "ignoring YAML config from an earlier release; move its settings to {} or {}",
                global.display(),
                directory_path.display()
            );
        }

        Ok(Self {
            global: ConfigOverlay::load(global)?,
            directory: ConfigOverlay::load(&directory_path)?,
            global_path: global.to_path_buf(),
            directory_path,
            legacy,
        })
    }

    /// Layers for the current directory and the envx home.
    pub fn load_default() -> Result<Self, ConfigError> {
        let global = paths::config_file()?;
        let cwd = std::env::current_dir()?;
        Self::load(&global, &cwd)
    }

    pub fn path(&self, scope: ConfigScope) -> &Path {
        match scope {
            ConfigScope::Global => &self.global_path,
            ConfigScope::Directory => &self.directory_path,
        }
    }

    pub fn layer(&self, scope: ConfigScope) -> Option<&ConfigOverlay> {
        match scope {
            ConfigScope::Global => self.global.as_ref(),
            ConfigScope::Directory => self.directory.as_ref(),
        }
    }

    fn layer_mut(&mut self, scope: ConfigScope) -> &mut Option<ConfigOverlay> {
        match scope {
            ConfigScope::Global => &mut self.global,
            ConfigScope::Directory => &mut self.directory,
        }
    }

    /// Layers that exist, lowest precedence first.
    fn present(&self) -> impl Iterator<Item = (ConfigScope, &ConfigOverlay)> + '_ {
        [ConfigScope::Global, ConfigScope::Directory]
            .into_iter()
            .filter_map(move |scope| self.layer(scope).map(|layer| (scope, layer)))
    }

    /// Files that contributed a layer, lowest precedence first.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.present()
            .map(|(scope, _)| self.path(scope).to_path_buf())
            .collect()
    }

    /// Defaults with every layer applied, not yet validated.
    pub fn merged(&self) -> Config {
        let mut config = Config::default();
        for (scope, layer) in self.present() {
            debug!(path = %self.path(scope).display(), "applying config layer");
            config.merge(layer);
        }
        config
    }

    /// The validated effective configuration.
    pub fn effective(&self) -> Result<Config, ConfigError> {
        let config = self.merged();
        config.validate()?;
        Ok(config)
    }

    /// Effective values with the layer each one came from.
    pub fn report(&self) -> ConfigReport {
        let config = self.merged();
        let sourced = |key: ConfigKey| SourcedValue {
            value: config.get(key),
            source: self
                .present()
                .filter(|(_, layer)| layer.contains(key))
                .last()
                .map_or(ConfigSource::Default, |(scope, _)| scope.into()),
        };

        ConfigReport {
            keystore: sourced(ConfigKey::Keystore),
            file: sourced(ConfigKey::File),
            name: sourced(ConfigKey::Name),
            account: sourced(ConfigKey::Account),
            format: sourced(ConfigKey::Format),
            iterations: sourced(ConfigKey::Iterations),
            backup_on_write: sourced(ConfigKey::BackupOnWrite),
        }
    }

    /// Set `key` in one scope's file and save it.
    pub fn set(&mut self, scope: ConfigScope, key: ConfigKey, value: &str) -> crate::Result<()> {
        let mut layer = self.layer(scope).cloned().unwrap_or_default();
        layer.set(key, value)?;
        layer.save(self.path(scope))?;
        debug!(%scope, %key, "saved config value");
        *self.layer_mut(scope) = Some(layer);
        Ok(())
    }

    /// Remove `key` from one scope's file, deleting the file once it sets
    /// nothing. Returns whether the key was set there.
    pub fn reset(&mut self, scope: ConfigScope, key: ConfigKey) -> crate::Result<bool> {
        let path = self.path(scope).to_path_buf();
        let slot = self.layer_mut(scope);
        let Some(layer) = slot.as_mut() else {
            return Ok(false);
        };
        if !layer.contains(key) {
            return Ok(false);
        }

        layer.unset(key);
        if layer.is_empty() {
            ConfigOverlay::remove(&path)?;
            *slot = None;
            debug!(%scope, path = %path.display(), "removed empty config file");
        } else {
            layer.save(&path)?;
        }
        Ok(true)
    }
}
