//! envx CLI entry point.

use clap::Parser;
use envx_cli::{run, verbosity_filter, Cli, DEFAULT_LOG_FILTER};
use envx_core::env::{self, vars};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays pipeable.
    let filter = match verbosity_filter(cli.global.verbose) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_env(vars::ENVX_LOG)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let registry = tracing_subscriber::registry().with(filter);
    if env::get_bool(vars::ENVX_LOG_JSON) {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    // Run the command
    run(cli)
}
