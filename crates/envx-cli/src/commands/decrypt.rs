//! `envx decrypt`: turn envelopes back into plaintext.

use anyhow::Context as _;
use clap::Args;
use envx_secrets::{decrypt, is_encrypted};

use super::{emit, ensure_keys_exist, selected, FormatArgs};
use crate::context::Context;
use crate::GlobalArgs;

/// Decrypt command arguments.
#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Write the result back to the file instead of printing it
    #[arg(short, long, conflicts_with_all = ["fmt", "json"])]
    pub write: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    /// Only decrypt these variables (default: all)
    pub keys: Vec<String>,
}

/// Run the decrypt command.
pub fn run(global: &GlobalArgs, args: DecryptArgs) -> anyhow::Result<()> {
    let ctx = Context::load(global)?;
    let mut doc = ctx.read_document()?;
    ensure_keys_exist(&ctx, &doc, &args.keys)?;

    let mut changed = 0;
    if let Some(key) = ctx.key_for_document(&doc)? {
        for entry in doc.entries_mut() {
            if !selected(&args.keys, entry.key()) || !is_encrypted(entry.value()) {
                continue;
            }
            let plaintext = decrypt(entry.value(), key.as_bytes())
                .with_context(|| format!("failed to decrypt {}", entry.key()))?;
            if plaintext.contains(['\n', '\r']) {
                anyhow::bail!("{} decrypts to a multi-line value", entry.key());
            }
            entry.set_value(&plaintext);
            changed += 1;
        }
    }

    let format = args.format.resolve(ctx.config.format);
    emit(&ctx, &doc, args.write, format, changed, "decrypt")
}
