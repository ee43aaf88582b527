//! envx command-line interface.

pub mod commands;
pub mod context;
pub mod dotenv;

use clap::{Args, Parser, Subcommand};
use envx_core::env::vars;
use envx_core::KeystoreKind;

/// Log filter used when neither `-v` nor `ENVX_LOG` is given.
pub const DEFAULT_LOG_FILTER: &str = "envx=warn";

/// envx - encrypt .env values in place
///
/// Without a subcommand, the remaining arguments are run as a program,
/// like `envx run`.
#[derive(Parser, Debug)]
#[command(name = "envx")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Program and arguments to run when no subcommand is given
    #[arg(trailing_var_arg = true, value_name = "PROGRAM")]
    pub exec: Vec<String>,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Env file to operate on
    #[arg(short, long, global = true)]
    pub file: Option<String>,

    /// Environment name; selects .env.<NAME>
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Key backend: keychain, password or memory
    #[arg(short, long, global = true, env = vars::ENVX_KEYSTORE)]
    pub keystore: Option<KeystoreKind>,

    /// Password for the password keystore (implies --keystore password)
    #[arg(short = 'P', long, global = true)]
    pub password: Option<String>,

    /// Account the key belongs to (default: current user)
    #[arg(short, long, global = true)]
    pub account: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt values in the env file
    Encrypt(commands::encrypt::EncryptArgs),

    /// Decrypt values in the env file
    Decrypt(commands::decrypt::DecryptArgs),

    /// Print decrypted variables
    Get(commands::get::GetArgs),

    /// Print decrypted values joined by a separator
    Getv(commands::get::GetvArgs),

    /// Add or update variables
    Set(commands::set::AssignArgs),

    /// Add variables, refusing keys already in the file
    Add(commands::set::AssignArgs),

    /// Run a program with the decrypted variables in its environment
    Run(commands::run::RunArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let global = &cli.global;
    let Some(command) = cli.command else {
        let args = commands::run::RunArgs { command: cli.exec };
        return commands::run::run(global, args);
    };

    match command {
        Commands::Encrypt(args) => commands::encrypt::run(global, args),
        Commands::Decrypt(args) => commands::decrypt::run(global, args),
        Commands::Get(args) => commands::get::run(global, args),
        Commands::Getv(args) => commands::get::run_values(global, args),
        Commands::Set(args) => commands::set::run(global, args),
        Commands::Add(args) => commands::add::run(global, args),
        Commands::Run(args) => commands::run::run(global, args),
        Commands::Config(args) => commands::config::run(global, args),
        Commands::Version => {
            println!("envx {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Filter directive forced by `-v` flags, if any.
pub fn verbosity_filter(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("envx=info"),
        _ => Some("envx=debug"),
    }
}
