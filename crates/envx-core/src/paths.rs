//! Path resolution utilities.

use crate::env::{self, vars};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Name of the per-directory config file.
pub const DIRECTORY_CONFIG_FILE: &str = ".envx.json5";

/// Global config file name used by the YAML-based releases.
pub const LEGACY_GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Directory config file name used by the YAML-based releases.
pub const LEGACY_DIRECTORY_CONFIG_FILE: &str = ".envx.yaml";

/// Get the envx home directory.
///
/// `$ENVX_HOME` when set, otherwise `~/.config/envx`.
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(vars::ENVX_HOME) {
        return Ok(expand_tilde(&home));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".config").join("envx"))
}

/// Get the global config file path (<home>/config.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("config.json5"))
}

/// Get the directory config file path for `dir` (`<dir>/.envx.json5`).
pub fn directory_config_file(dir: &Path) -> PathBuf {
    dir.join(DIRECTORY_CONFIG_FILE)
}

/// YAML config files from earlier releases that exist beside `global`, in the
/// platform config directory, or in `dir`. They are never read.
pub fn legacy_config_files(global: &Path, dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![global.with_file_name(LEGACY_GLOBAL_CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("envx").join(LEGACY_GLOBAL_CONFIG_FILE));
    }
    candidates.push(dir.join(LEGACY_DIRECTORY_CONFIG_FILE));
    candidates.dedup();
    candidates.into_iter().filter(|path| path.is_file()).collect()
}

/// Get the salt directory used by the password keystore (<home>/salts).
pub fn salts_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("salts"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve which env file to operate on.
///
/// An explicit file wins; otherwise a name selects `.env.<name>`; otherwise
/// the configured default file is used.
pub fn resolve_env_file(file: Option<&str>, name: Option<&str>, default_file: &str) -> PathBuf {
    match (file, name) {
        (Some(file), _) => expand_tilde(file),
        (None, Some(name)) if !name.is_empty() => PathBuf::from(format!(".env.{name}")),
        _ => expand_tilde(default_file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/test");
        assert!(!expanded.to_string_lossy().contains('~'));
        assert_eq!(expand_tilde("plain/path"), PathBuf::from("plain/path"));
    }

    #[test]
    fn test_directory_config_file() {
        let path = directory_config_file(Path::new("/work"));
        assert_eq!(path, PathBuf::from("/work/.envx.json5"));
    }

    #[test]
    fn test_legacy_config_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let home = tmp.path().join("home");
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(&project).unwrap();
        let global = home.join("config.json5");

        let found = legacy_config_files(&global, &project);
        assert!(found.iter().all(|p| !p.starts_with(tmp.path())));

        std::fs::write(home.join("config.yaml"), "keystore: password\n").unwrap();
        std::fs::write(project.join(".envx.yaml"), "file: .env.local\n").unwrap();
        let found = legacy_config_files(&global, &project);
        assert!(found.contains(&home.join("config.yaml")));
        assert!(found.contains(&project.join(".envx.yaml")));
    }

    #[test]
    fn test_resolve_env_file() {
        assert_eq!(
            resolve_env_file(Some("custom.env"), Some("dev"), ".env"),
            PathBuf::from("custom.env")
        );
        assert_eq!(
            resolve_env_file(None, Some("dev"), ".env"),
            PathBuf::from(".env.dev")
        );
        assert_eq!(resolve_env_file(None, Some(""), ".env"), PathBuf::from(".env"));
        assert_eq!(resolve_env_file(None, None, ".env.local"), PathBuf::from(".env.local"));
    }
}
