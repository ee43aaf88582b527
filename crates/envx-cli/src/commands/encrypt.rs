//! `envx encrypt`: turn plaintext values into envelopes.

use clap::Args;
use envx_secrets::{encrypt, is_encrypted};
use tracing::debug;

use super::{emit, ensure_keys_exist, selected, FormatArgs};
use crate::context::Context;
use crate::GlobalArgs;

/// Encrypt command arguments.
#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Write the result back to the file instead of printing it
    #[arg(short, long, conflicts_with_all = ["fmt", "json"])]
    pub write: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    /// Only encrypt these variables (default: all)
    pub keys: Vec<String>,
}

/// Run the encrypt command.
pub fn run(global: &GlobalArgs, args: EncryptArgs) -> anyhow::Result<()> {
    let ctx = Context::load(global)?;
    let mut doc = ctx.read_document()?;
    ensure_keys_exist(&ctx, &doc, &args.keys)?;

    let pending = doc
        .entries()
        .filter(|e| selected(&args.keys, e.key()) && !is_encrypted(e.value()))
        .count();

    let mut changed = 0;
    if pending > 0 {
        let key = ctx.key_for_writing()?;
        for entry in doc.entries_mut() {
            if !selected(&args.keys, entry.key()) || is_encrypted(entry.value()) {
                continue;
            }
            let envelope = encrypt(entry.value(), key.as_bytes())?;
            debug!(variable = entry.key(), "encrypted value");
            entry.set_value(&envelope);
            changed += 1;
        }
    }

    let format = args.format.resolve(ctx.config.format);
    emit(&ctx, &doc, args.write, format, changed, "encrypt")
}
