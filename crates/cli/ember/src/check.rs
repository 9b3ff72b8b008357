//! Check command implementation

use anyhow::Result;
use colored::Colorize;
use em_driver::VerificationFailed;
use em_lower::{LowerError, LowerOptions};
use std::path::Path;

pub fn check(path: &Path, options: &LowerOptions) -> Result<()> {
    println!("{} {}", "Checking".green().bold(), path.display());

    let root = em_driver::load_ast(path)?;
    println!("  {} {} top-level statements", "Found:".bold(), root.statements.len());

    match em_driver::compile(&root, options) {
        Ok(unit) => {
            let functions = unit.module.functions().count();
            println!("    {} Lowered {} functions", "✓".green(), functions);
            println!(
                "    {} Entry `{}` returns {}",
                "✓".green(),
                options.entry_name,
                unit.entry_type()
            );
            println!("    {} Module verified", "✓".green());
            println!("{} No errors found", "Success:".green().bold());
            Ok(())
        }
        Err(err) => {
            report(&err);
            anyhow::bail!("check of {} failed", path.display());
        }
    }
}

/// Print a lowering or verification failure with as much detail as it has
pub fn report(err: &anyhow::Error) {
    if let Some(lower) = err.downcast_ref::<LowerError>() {
        eprintln!("{:?}", miette::Report::new(lower.clone()));
    } else if let Some(failed) = err.downcast_ref::<VerificationFailed>() {
        eprintln!("    {} {}", "✗".red(), failed);
        eprintln!("{} {} errors found", "Failed:".red().bold(), failed.errors.len());
    } else {
        eprintln!("    {} {err:#}", "✗".red());
    }
}
