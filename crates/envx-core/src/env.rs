//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Name of the current OS user, used as the default key account.
///
/// Checks `USER` then `USERNAME`; falls back to `"default"`.
pub fn current_user() -> String {
    get_var("USER")
        .or_else(|| get_var("USERNAME"))
        .unwrap_or_else(|| "default".to_string())
}

/// Common environment variable names.
pub mod vars {
    /// Password for the password-derived keystore.
    pub const ENVX_PASSWORD: &str = "ENVX_PASSWORD";

    /// envx home directory override.
    pub const ENVX_HOME: &str = "ENVX_HOME";

    /// Log filter directive for the CLI.
    pub const ENVX_LOG: &str = "ENVX_LOG";

    /// Keystore selection override.
    pub const ENVX_KEYSTORE: &str = "ENVX_KEYSTORE";

    /// Emit logs as JSON lines when truthy.
    pub const ENVX_LOG_JSON: &str = "ENVX_LOG_JSON";
}
