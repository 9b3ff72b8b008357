//! Emit command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use em_driver::TextBackend;
use em_lower::LowerOptions;
use std::fs;
use std::path::Path;

pub fn emit(path: &Path, output: Option<&Path>, options: &LowerOptions) -> Result<()> {
    let root = em_driver::load_ast(path)?;
    let emitted = match em_driver::compile_and_emit(&root, options, &TextBackend) {
        Ok(emitted) => emitted,
        Err(err) => {
            crate::check::report(&err);
            anyhow::bail!("failed to emit {}", path.display());
        }
    };

    match output {
        Some(output) => {
            fs::write(output, emitted.to_string())
                .with_context(|| format!("failed to write {}", output.display()))?;
            eprintln!("{} {}", "Wrote".green().bold(), output.display());
        }
        None => print!("{emitted}"),
    }
    Ok(())
}
