//! Integration test utilities for the lowering pipeline

use anyhow::{Context, Result};
use em_ast::Block;
use em_driver::{Backend, Emitted, InterpreterBackend};
use em_interpreter::Value;
use em_lower::{LowerError, LowerOptions};
use miette::Diagnostic;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// How running a unit ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The entry function returned a value
    Value(Value),
    /// Lowering failed; carries the diagnostic code
    LowerError(String),
    /// Lowering succeeded but execution failed; carries the root cause
    RuntimeError(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(formatter, "value: {value}"),
            Self::LowerError(code) => write!(formatter, "lower error: {code}"),
            Self::RuntimeError(message) => write!(formatter, "runtime error: {message}"),
        }
    }
}

/// Lower, verify and run `root`
///
/// # Errors
///
/// Returns an error for failures that are neither lowering nor runtime
/// errors, e.g. a module that does not verify
pub fn evaluate(root: &Block, options: &LowerOptions) -> Result<Outcome> {
    let unit = match em_driver::compile(root, options) {
        Ok(unit) => unit,
        Err(err) => {
            let Some(lower) = err.downcast_ref::<LowerError>() else {
                return Err(err);
            };
            let code = lower.code().map(|code| code.to_string()).unwrap_or_default();
            return Ok(Outcome::LowerError(code));
        }
    };

    match InterpreterBackend::new(options).emit(&unit.module) {
        Ok(Emitted::Value(value)) => Ok(Outcome::Value(value)),
        Ok(Emitted::Text(_)) => anyhow::bail!("interpreter backend produced text"),
        Err(err) => Ok(Outcome::RuntimeError(err.root_cause().to_string())),
    }
}

/// A unit on disk together with its expected outcome
#[derive(Debug)]
pub struct UnitCase {
    /// Directory name of the case
    pub name: String,
    /// Parsed syntax tree
    pub root: Block,
    /// Expected [`Outcome`] in its display form
    pub expected: String,
}

impl UnitCase {
    /// Run the case and render its outcome
    ///
    /// # Errors
    ///
    /// Returns an error when the pipeline fails outside of lowering and
    /// execution
    pub fn run(&self) -> Result<String> {
        evaluate(&self.root, &LowerOptions::default()).map(|outcome| outcome.to_string())
    }
}

/// Directory holding the checked-in units
#[must_use]
pub fn units_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-units")
}

/// Load every case below `dir`
///
/// Each case is a directory with a `unit.json` syntax tree and an
/// `expected.txt` outcome. Cases are returned sorted by name.
///
/// # Errors
///
/// Returns an error if a case cannot be read or parsed
pub fn load_cases(dir: impl AsRef<Path>) -> Result<Vec<UnitCase>> {
    let mut cases = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !path.join("unit.json").is_file() {
            continue;
        }

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
            .to_owned();
        let root = em_driver::load_ast(path.join("unit.json"))?;
        let expected = fs::read_to_string(path.join("expected.txt"))
            .with_context(|| format!("missing expected.txt for {name}"))?
            .trim()
            .to_owned();
        cases.push(UnitCase {
            name,
            root,
            expected,
        });
    }

    cases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cases)
}
