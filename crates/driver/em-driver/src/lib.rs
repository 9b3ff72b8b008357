//! Compilation driver and high-level APIs
//!
//! Loads syntax trees, lowers them, checks the resulting module and hands it
//! to a [`Backend`]. A module is only ever emitted when lowering succeeded and
//! the module verified.

pub mod backend;

pub use backend::{Backend, Emitted, InterpreterBackend, TextBackend};

use anyhow::{Context, Result};
use em_ast::Block;
use em_ir::VerifyError;
use em_lower::{LowerOptions, LoweredUnit};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Structural problems found in a lowered module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module `{module}` failed verification:\n{}", render(.errors))]
pub struct VerificationFailed {
    /// Module name
    pub module: String,
    /// Every violation found
    pub errors: Vec<VerifyError>,
}

fn render(errors: &[VerifyError]) -> String {
    errors
        .iter()
        .map(|error| format!("  {error}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a unit from its JSON form
///
/// # Errors
/// Fails when the text is not a valid syntax tree
pub fn parse_ast(json: &str) -> Result<Block> {
    serde_json::from_str(json).context("invalid syntax tree")
}

/// Read and parse a unit from a JSON file
///
/// # Errors
/// Fails when the file cannot be read or parsed
pub fn load_ast(path: impl AsRef<Path>) -> Result<Block> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_ast(&source).with_context(|| format!("in {}", path.display()))
}

/// Lower a unit and verify the result
///
/// # Errors
/// Returns the [`em_lower::LowerError`] of a failed lowering, or
/// [`VerificationFailed`] for a malformed module. Both can be recovered with
/// [`anyhow::Error::downcast_ref`].
pub fn compile(root: &Block, options: &LowerOptions) -> Result<LoweredUnit> {
    debug!(
        module = %options.module_name,
        statements = root.statements.len(),
        "lowering unit"
    );
    let unit = em_lower::lower_unit(root, options)?;

    let errors = em_ir::verify(&unit.module);
    if !errors.is_empty() {
        return Err(VerificationFailed {
            module: unit.module.name().to_owned(),
            errors,
        }
        .into());
    }

    info!(module = unit.module.name(), "unit compiled");
    Ok(unit)
}

/// Compile a unit and pass it to `backend`
///
/// # Errors
/// Fails when compilation or emission fails; nothing is emitted in the
/// first case
pub fn compile_and_emit(root: &Block, options: &LowerOptions, backend: &dyn Backend) -> Result<Emitted> {
    let unit = compile(root, options)?;
    debug!(backend = backend.name(), "emitting");
    backend
        .emit(&unit.module)
        .with_context(|| format!("{} backend failed", backend.name()))
}
