//! Ember CLI
//!
//! Lowers JSON syntax trees to IR, prints the IR or runs it in the
//! interpreter.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "CLI tool needs to print to stdout/stderr"
)]

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use em_lower::LowerOptions;
use std::path::PathBuf;

mod check;
mod emit;
mod logging;
mod run;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Typed AST lowering toolchain", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: LowerArgs,
}

/// Lowering options shared by every command
#[derive(Args)]
struct LowerArgs {
    /// Module identifier written into the IR
    #[arg(long, global = true, default_value = "unit")]
    module_name: String,

    /// Name of the function holding the top-level statements
    #[arg(long, global = true, default_value = "__main")]
    entry: String,

    /// Runtime function used for string concatenation
    #[arg(long, global = true, default_value = "concat")]
    concat_symbol: String,
}

impl From<LowerArgs> for LowerOptions {
    fn from(args: LowerArgs) -> Self {
        Self {
            module_name: args.module_name,
            entry_name: args.entry,
            concat_symbol: args.concat_symbol,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the IR of a unit
    Emit {
        /// Path to the JSON syntax tree
        path: PathBuf,

        /// Write the IR to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a unit's entry function in the interpreter
    Run {
        /// Path to the JSON syntax tree
        path: PathBuf,
    },

    /// Lower and verify a unit without emitting anything
    Check {
        /// Path to the JSON syntax tree
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let options = LowerOptions::from(cli.options);

    match cli.command {
        Commands::Emit { path, output } => {
            emit::emit(&path, output.as_deref(), &options)?;
        }
        Commands::Run { path } => {
            run::run(&path, &options)?;
        }
        Commands::Check { path } => {
            check::check(&path, &options)?;
        }
    }

    Ok(())
}
