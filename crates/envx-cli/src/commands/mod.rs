//! CLI command implementations.

pub mod add;
pub mod config;
pub mod decrypt;
pub mod encrypt;
pub mod get;
pub mod run;
pub mod set;

use anyhow::Context as _;
use clap::Args;
use console::style;
use envx_core::OutputFormat;
use envx_secrets::decrypt;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::dotenv::Document;

/// Output format flags for commands that print variables.
#[derive(Args, Debug, Clone, Default)]
pub struct FormatArgs {
    /// Output format: env or json (default: the `format` setting)
    #[arg(short = 'F', long = "fmt", value_name = "FORMAT")]
    pub fmt: Option<OutputFormat>,

    /// Shorthand for --fmt json
    #[arg(short, long, conflicts_with = "fmt")]
    pub json: bool,
}

impl FormatArgs {
    /// The format asked for on the command line, if any.
    pub fn explicit(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else {
            self.fmt
        }
    }

    pub fn resolve(&self, default: OutputFormat) -> OutputFormat {
        self.explicit().unwrap_or(default)
    }
}

/// Render variables as `KEY=VALUE` lines or a JSON object.
pub(crate) fn format_vars(
    vars: &[(String, String)],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Env => Ok(vars.iter().map(|(k, v)| format!("{k}={v}\n")).collect()),
        OutputFormat::Json => {
            let object: Map<String, Value> = vars
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let mut out = serde_json::to_string_pretty(&Value::Object(object))?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Effective variables of `doc` with every envelope decrypted.
pub(crate) fn decrypted_vars(
    ctx: &Context,
    doc: &Document,
) -> anyhow::Result<Vec<(String, String)>> {
    let key = ctx.key_for_document(doc)?;
    doc.vars()
        .into_iter()
        .map(|(name, value)| -> anyhow::Result<(String, String)> {
            let value = match &key {
                Some(key) => decrypt(&value, key.as_bytes())
                    .with_context(|| format!("failed to decrypt {name}"))?,
                None => value,
            };
            Ok((name, value))
        })
        .collect()
}

/// Fail when a named variable is not in the document.
pub(crate) fn ensure_keys_exist(
    ctx: &Context,
    doc: &Document,
    keys: &[String],
) -> anyhow::Result<()> {
    let missing: Vec<&str> = keys
        .iter()
        .filter(|k| !doc.contains(k))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        anyhow::bail!(
            "not found in {}: {}",
            ctx.env_file.display(),
            missing.join(", ")
        );
    }
    Ok(())
}

/// Whether `key` is covered by a (possibly empty) selection.
pub(crate) fn selected(keys: &[String], key: &str) -> bool {
    keys.is_empty() || keys.iter().any(|k| k == key)
}

/// Write the document back, or print it to stdout.
///
/// The env format prints the whole file with its layout; JSON prints the
/// effective variables.
pub(crate) fn emit(
    ctx: &Context,
    doc: &Document,
    write: bool,
    format: OutputFormat,
    changed: usize,
    verb: &str,
) -> anyhow::Result<()> {
    if !write {
        match format {
            OutputFormat::Env => print!("{}", doc.render()),
            OutputFormat::Json => print!("{}", format_vars(&doc.vars(), format)?),
        }
        return Ok(());
    }

    if changed == 0 {
        eprintln!("Nothing to {verb} in {}", ctx.env_file.display());
        return Ok(());
    }

    ctx.write_document(doc)?;
    eprintln!(
        "{} {}ed {} value(s) in {}",
        style("✓").green(),
        capitalize(verb),
        changed,
        ctx.env_file.display()
    );
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
