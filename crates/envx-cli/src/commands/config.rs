//! Configuration management commands.
//!
//! Every subcommand works on the global file unless `-d` selects the
//! directory file (`./.envx.json5`).

use clap::{Args, Subcommand};
use envx_core::config::{
    Config, ConfigKey, ConfigLayers, ConfigReport, ConfigScope, ConfigSource, SourcedValue,
};
use envx_core::{paths, KeystoreKind};

use crate::GlobalArgs;

/// Config command arguments.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Use the directory config file instead of the global one
    #[arg(short, long, global = true)]
    pub directory: bool,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

impl ConfigArgs {
    pub fn scope(&self) -> ConfigScope {
        if self.directory {
            ConfigScope::Directory
        } else {
            ConfigScope::Global
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show every effective setting and its source as JSON
    Show,

    /// Print settings as `key = value (from source)`
    Get {
        /// Settings to print (default: all)
        keys: Vec<ConfigKey>,
    },

    /// Print only the values of settings
    Getv {
        /// String placed between values
        #[arg(short, long, default_value = "\n", hide_default_value = true)]
        separator: String,

        /// Settings to print (default: all)
        keys: Vec<ConfigKey>,
    },

    /// List config files and the effective settings
    List,

    /// Set a value in the config file
    Set { key: ConfigKey, value: String },

    /// Remove a value from the config file
    Reset { key: ConfigKey },

    /// Show the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub fn run(global: &GlobalArgs, args: ConfigArgs) -> anyhow::Result<()> {
    let scope = args.scope();
    let mut layers = ConfigLayers::load_default()?;

    match args.command {
        ConfigCommand::Show => {
            let report = report(&layers, global);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        ConfigCommand::Get { keys } => {
            let report = report(&layers, global);
            for (key, value) in selected(&report, &keys) {
                println!("{key} = {} (from {})", value.value, value.source);
            }
        }

        ConfigCommand::Getv { separator, keys } => {
            let report = report(&layers, global);
            let values: Vec<&str> = selected(&report, &keys)
                .into_iter()
                .map(|(_, value)| value.value.as_str())
                .collect();
            println!("{}", values.join(&separator));
        }

        ConfigCommand::List => {
            println!("Configuration files:");
            for scope in [ConfigScope::Global, ConfigScope::Directory] {
                let state = if layers.layer(scope).is_some() {
                    "exists"
                } else {
                    "not found"
                };
                println!("  {scope}: {} ({state})", layers.path(scope).display());
            }
            for path in &layers.legacy {
                println!("  legacy: {} (ignored)", path.display());
            }
            println!("  envx home: {}", paths::base_dir()?.display());

            println!();
            println!("Effective configuration:");
            for (key, value) in report(&layers, global).entries() {
                println!("  {key} = {} (from {})", value.value, value.source);
            }
        }

        ConfigCommand::Set { key, value } => {
            layers.set(scope, key, &value)?;
            println!("Set {scope} config: {key} = {}", value.trim());
        }

        ConfigCommand::Reset { key } => {
            if layers.reset(scope, key)? {
                println!("Reset {scope} config key: {key}");
            } else {
                println!("{key} is not set in the {scope} config");
            }
        }

        ConfigCommand::Path => {
            println!("{}", layers.path(scope).display());
        }

        ConfigCommand::Init { force } => {
            let path = layers.path(scope);
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }

            Config::default().save(path)?;
            println!("Created {scope} config file: {}", path.display());
        }
    }

    Ok(())
}

/// The layered report with command-line overrides applied on top.
fn report(layers: &ConfigLayers, global: &GlobalArgs) -> ConfigReport {
    let mut report = layers.report();

    let keystore = match (global.keystore, &global.password) {
        (Some(kind), _) => Some(kind),
        (None, Some(_)) => Some(KeystoreKind::Password),
        (None, None) => None,
    };
    if let Some(kind) = keystore {
        report.set(ConfigKey::Keystore, kind.to_string(), ConfigSource::Cli);
    }
    if let Some(file) = &global.file {
        report.set(ConfigKey::File, file.as_str(), ConfigSource::Cli);
    }
    if let Some(name) = &global.name {
        report.set(ConfigKey::Name, name.as_str(), ConfigSource::Cli);
    }
    if let Some(account) = &global.account {
        report.set(ConfigKey::Account, account.as_str(), ConfigSource::Cli);
    }
    report
}

/// Report entries for `keys` in the order given; every entry when empty.
fn selected<'a>(
    report: &'a ConfigReport,
    keys: &[ConfigKey],
) -> Vec<(ConfigKey, &'a SourcedValue)> {
    if keys.is_empty() {
        return report.entries().collect();
    }
    keys.iter().map(|&key| (key, report.get(key))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layers(tmp: &TempDir) -> ConfigLayers {
        let global = tmp.path().join("home").join("config.json5");
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(&global, "{ account: 'team', iterations: 5000 }").unwrap();
        ConfigLayers::load(&global, tmp.path()).unwrap()
    }

    #[test]
    fn test_report_applies_flags() {
        let tmp = TempDir::new().unwrap();
        let global = GlobalArgs {
            password: Some("hunter2".to_string()),
            name: Some("prod".to_string()),
            ..Default::default()
        };

        let report = report(&layers(&tmp), &global);
        assert_eq!(report.keystore.value, "password");
        assert_eq!(report.keystore.source, ConfigSource::Cli);
        assert_eq!(report.name.value, "prod");
        assert_eq!(report.account.value, "team");
        assert_eq!(report.account.source, ConfigSource::Global);
        assert_eq!(report.iterations.value, "5000");
    }

    #[test]
    fn test_explicit_keystore_beats_password() {
        let tmp = TempDir::new().unwrap();
        let global = GlobalArgs {
            keystore: Some(KeystoreKind::Memory),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        assert_eq!(report(&layers(&tmp), &global).keystore.value, "memory");
    }

    #[test]
    fn test_selected_order() {
        let tmp = TempDir::new().unwrap();
        let report = report(&layers(&tmp), &GlobalArgs::default());

        let all = selected(&report, &[]);
        assert_eq!(all.len(), ConfigKey::ALL.len());

        let some = selected(&report, &[ConfigKey::Iterations, ConfigKey::Account]);
        assert_eq!(some[0].0, ConfigKey::Iterations);
        assert_eq!(some[1].1.value, "team");
    }
}
