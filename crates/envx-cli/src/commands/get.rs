//! `envx get` and `envx getv`: print decrypted variables.

use clap::Args;

use super::{decrypted_vars, ensure_keys_exist, format_vars, FormatArgs};
use crate::context::Context;
use crate::GlobalArgs;

/// Get command arguments.
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub format: FormatArgs,

    /// Print only the values, one per line
    #[arg(long, conflicts_with_all = ["fmt", "json"])]
    pub vals: bool,

    /// Variables to print (default: all)
    pub keys: Vec<String>,
}

/// Getv command arguments.
#[derive(Args, Debug)]
pub struct GetvArgs {
    /// String placed between values
    #[arg(short, long, default_value = "\n", hide_default_value = true)]
    pub separator: String,

    /// Variables to print (default: all)
    pub keys: Vec<String>,
}

/// Run the get command.
pub fn run(global: &GlobalArgs, args: GetArgs) -> anyhow::Result<()> {
    let (ctx, vars) = load_vars(global, &args.keys)?;
    if args.vals {
        println!("{}", join_values(&vars, "\n"));
        return Ok(());
    }

    let format = args.format.resolve(ctx.config.format);
    print!("{}", format_vars(&vars, format)?);
    Ok(())
}

/// Run the getv command.
pub fn run_values(global: &GlobalArgs, args: GetvArgs) -> anyhow::Result<()> {
    let (_, vars) = load_vars(global, &args.keys)?;
    println!("{}", join_values(&vars, &args.separator));
    Ok(())
}

fn load_vars(
    global: &GlobalArgs,
    keys: &[String],
) -> anyhow::Result<(Context, Vec<(String, String)>)> {
    let ctx = Context::load(global)?;
    let doc = ctx.read_document()?;
    ensure_keys_exist(&ctx, &doc, keys)?;

    let vars = decrypted_vars(&ctx, &doc)?;
    Ok((ctx, pick(vars, keys)))
}

/// Variables named in `keys`, in the order asked for; all of them when empty.
fn pick(vars: Vec<(String, String)>, keys: &[String]) -> Vec<(String, String)> {
    if keys.is_empty() {
        return vars;
    }
    keys.iter()
        .filter_map(|key| vars.iter().find(|(name, _)| name == key).cloned())
        .collect()
}

fn join_values(vars: &[(String, String)], separator: &str) -> String {
    vars.iter()
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
