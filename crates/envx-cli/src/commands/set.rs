//! `envx set`: add or replace variables.

use anyhow::Context as _;
use clap::Args;
use console::style;
use envx_secrets::encrypt;

use super::{format_vars, FormatArgs};
use crate::context::Context;
use crate::dotenv::validate_key;
use crate::GlobalArgs;

/// Arguments shared by `set` and `add`.
#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Store values as plaintext
    #[arg(long)]
    pub plain: bool,

    /// Print the new variables instead of writing the file
    #[arg(short, long)]
    pub print: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    /// Assignments; a bare KEY prompts for its value without echo
    #[arg(required = true, value_name = "KEY[=VALUE]")]
    pub assignments: Vec<String>,
}

/// What to do when an assigned key is already in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Existing {
    Replace,
    Refuse,
}

/// Run the set command.
pub fn run(global: &GlobalArgs, args: AssignArgs) -> anyhow::Result<()> {
    assign(global, args, Existing::Replace)
}

pub(crate) fn assign(
    global: &GlobalArgs,
    args: AssignArgs,
    existing: Existing,
) -> anyhow::Result<()> {
    if !args.print && args.format.explicit().is_some() {
        anyhow::bail!("--fmt and --json only apply together with --print");
    }

    let ctx = Context::load(global)?;
    let mut doc = ctx.read_document()?;
    if existing == Existing::Refuse {
        for arg in &args.assignments {
            let name = assignment_name(arg);
            if doc.get(name).is_some() {
                anyhow::bail!(
                    "variable {name} already exists in {}",
                    ctx.env_file.display()
                );
            }
        }
    }

    let assignments = parse_assignments(&args.assignments, |name| {
        rpassword::prompt_password(format!("Value for {name}: "))
            .with_context(|| format!("failed to read value for {name}"))
    })?;

    let key = if args.plain {
        None
    } else {
        Some(ctx.key_for_writing()?)
    };

    let mut stored = Vec::with_capacity(assignments.len());
    for (name, value) in assignments {
        let value = match &key {
            Some(key) => encrypt(&value, key.as_bytes())?,
            None => value,
        };
        stored.push((name, value));
    }

    if args.print {
        let format = args.format.resolve(ctx.config.format);
        print!("{}", format_vars(&stored, format)?);
        return Ok(());
    }

    for (name, value) in &stored {
        doc.set(name, value)?;
    }
    ctx.write_document(&doc)?;

    let verb = match existing {
        Existing::Replace => "Set",
        Existing::Refuse => "Added",
    };
    eprintln!(
        "{} {verb} {} variable(s) in {}",
        style("✓").green(),
        stored.len(),
        ctx.env_file.display()
    );
    Ok(())
}

/// The trimmed key of a `KEY=VALUE` or bare `KEY` argument.
fn assignment_name(arg: &str) -> &str {
    arg.split_once('=').map_or(arg, |(name, _)| name).trim()
}

/// Split `KEY=VALUE` arguments, asking `prompt` for bare keys.
///
/// Keys and values are trimmed. Repeated keys keep the last value.
fn parse_assignments<F>(args: &[String], prompt: F) -> anyhow::Result<Vec<(String, String)>>
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    let mut out: Vec<(String, String)> = Vec::with_capacity(args.len());
    for arg in args {
        let name = assignment_name(arg).to_string();
        let value = match arg.split_once('=') {
            Some((_, value)) => value.trim().to_string(),
            None => {
                validate_key(&name)?;
                prompt(&name)?
            }
        };
        validate_key(&name)?;

        match out.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => out.push((name, value)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn no_prompt(name: &str) -> anyhow::Result<String> {
        panic!("unexpected prompt for {name}")
    }

    #[test]
    fn test_key_value_pairs() {
        let parsed =
            parse_assignments(&args(&["A=1", " B = two ", "URL=a=b", "EMPTY="]), no_prompt)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two".to_string()),
                ("URL".to_string(), "a=b".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_bare_key_prompts() {
        let asked = RefCell::new(Vec::new());
        let parsed = parse_assignments(&args(&["SECRET", "A=1"]), |name| {
            asked.borrow_mut().push(name.to_string());
            Ok("hidden".to_string())
        })
        .unwrap();

        assert_eq!(asked.into_inner(), vec!["SECRET".to_string()]);
        assert_eq!(parsed[0], ("SECRET".to_string(), "hidden".to_string()));
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let parsed = parse_assignments(&args(&["A=1", "A=2"]), no_prompt).unwrap();
        assert_eq!(parsed, vec![("A".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_assignment_name() {
        assert_eq!(assignment_name(" DB_URL = x=y"), "DB_URL");
        assert_eq!(assignment_name("TOKEN"), "TOKEN");
        assert_eq!(assignment_name("EMPTY="), "EMPTY");
    }

    #[test]
    fn test_invalid_keys() {
        assert!(parse_assignments(&args(&["=value"]), no_prompt).is_err());
        assert!(parse_assignments(&args(&["BAD KEY=value"]), no_prompt).is_err());
        assert!(parse_assignments(&args(&["  "]), no_prompt).is_err());
    }
}
