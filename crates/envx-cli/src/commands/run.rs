//! `envx run`: execute a program with the decrypted environment.

use std::process::{Command, ExitStatus};

use anyhow::Context as _;
use clap::Args;
use envx_core::env::vars;
use tracing::debug;

use super::decrypted_vars;
use crate::context::Context;
use crate::GlobalArgs;

/// Run command arguments.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Program to run, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Run the child process. Exits with its status when it fails.
pub fn run(global: &GlobalArgs, args: RunArgs) -> anyhow::Result<()> {
    let (program, program_args) = args
        .command
        .split_first()
        .context("missing program to run")?;

    let ctx = Context::load(global)?;
    let doc = ctx.read_document()?;
    let env = decrypted_vars(&ctx, &doc)?;

    debug!(program = %program, variables = env.len(), "starting child process");
    let status = Command::new(program)
        .args(program_args)
        // The unlock password is for envx, not for the child.
        .env_remove(vars::ENVX_PASSWORD)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .status()
        .with_context(|| format!("failed to start {program}"))?;

    if status.success() {
        return Ok(());
    }
    debug!(%status, "child process failed");
    std::process::exit(exit_code(status))
}

/// Shell-style exit code: the child's code, or 128 + signal on Unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
