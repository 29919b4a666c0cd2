#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cjs-resolve")]
#[command(author, version, about = "Resolve CommonJS module specifiers like Node.js require()", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a module specifier to a file path
    Resolve(commands::resolve::ResolveArgs),

    /// List exports categories, or those overlapping a Node.js version range
    Categories {
        /// Node.js version range (e.g. ">=14.13 <17")
        range: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Resolve(args)) => commands::resolve::run(&cwd, args, cli.json),
        Some(Commands::Categories { range }) => {
            commands::categories::run(range.as_deref(), cli.json)
        }
    }
}
