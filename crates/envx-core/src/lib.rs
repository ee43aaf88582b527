//! # envx-core
//!
//! Configuration, paths, and shared utilities for envx.
//!
//! - **Configuration**: layered JSON5 config (defaults, global, directory)
//! - **Paths**: resolution of the envx home, salt and config locations
//! - **Utilities**: environment lookups and zeroize-on-drop secret strings

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use config::{
    Config, ConfigKey, ConfigLayers, ConfigOverlay, ConfigReport, ConfigScope, ConfigSource,
    KeystoreKind, OutputFormat,
};
pub use error::{ConfigError, Error, Result};
pub use secret::SecretString;
