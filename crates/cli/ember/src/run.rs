//! Run command implementation

use anyhow::Result;
use colored::Colorize;
use em_driver::{Emitted, InterpreterBackend};
use em_lower::LowerOptions;
use std::path::Path;

pub fn run(path: &Path, options: &LowerOptions) -> Result<()> {
    println!("{} {}", "Compiling".bold(), path.display());
    let root = em_driver::load_ast(path)?;

    let backend = InterpreterBackend::new(options);
    let emitted = match em_driver::compile_and_emit(&root, options, &backend) {
        Ok(emitted) => emitted,
        Err(err) => {
            crate::check::report(&err);
            anyhow::bail!("failed to run {}", path.display());
        }
    };

    println!("\n{} {}()", "Executing".cyan().bold(), options.entry_name);
    println!("{}", "---".cyan());
    match emitted {
        Emitted::Value(value) => println!("{value}"),
        Emitted::Text(text) => print!("{text}"),
    }
    println!("{}", "---".cyan());
    println!("{} Execution completed successfully", "Finished".green().bold());
    Ok(())
}
