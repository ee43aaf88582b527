//! Shared fixtures for envx workflow tests.

use std::path::Path;

use envx_secrets::keystore::{PasswordConfig, PasswordKeyProvider};

/// Low work factor so tests stay fast.
pub const TEST_ITERATIONS: u32 = 1_000;

/// A password provider over `salt_dir` that never prompts or reads the
/// environment.
pub fn password_provider(salt_dir: &Path, password: &str) -> PasswordKeyProvider {
    PasswordKeyProvider::new(
        PasswordConfig::new(salt_dir)
            .with_iterations(TEST_ITERATIONS)
            .with_env_var(None)
            .with_password(password)
            .with_prompt(|_: &str| -> envx_secrets::Result<envx_core::SecretString> {
                panic!("tests must not prompt")
            }),
    )
}

/// A representative env file.
pub const SAMPLE_ENV: &str = "\
# service configuration
DATABASE_URL=postgres://app:hunter2@db/app
export API_TOKEN = \"tok_live_123\"
FEATURE_FLAG=on

LOG_LEVEL='debug'
";
