//! Backend trait for turning finished modules into output

use anyhow::{Context, Result};
use em_interpreter::{Interpreter, Value, builtin_concat};
use em_ir::Module;
use em_lower::LowerOptions;
use std::fmt;

/// What a backend produced
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    /// Textual IR
    Text(String),
    /// Result of running the unit's entry function
    Value(Value),
}

impl fmt::Display for Emitted {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => formatter.write_str(text),
            Self::Value(value) => write!(formatter, "{value}"),
        }
    }
}

/// Code generation backend
pub trait Backend {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Emit a verified module
    fn emit(&self, module: &Module) -> Result<Emitted>;
}

/// Prints the module as LLVM-style assembly
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBackend;

impl Backend for TextBackend {
    fn name(&self) -> &'static str {
        "text"
    }

    fn emit(&self, module: &Module) -> Result<Emitted> {
        Ok(Emitted::Text(module.to_string()))
    }
}

/// Runs the entry function of the module in the interpreter
#[derive(Debug, Clone)]
pub struct InterpreterBackend {
    entry: String,
    concat_symbol: String,
}

impl InterpreterBackend {
    /// Backend running the entry function named by `options`
    #[must_use]
    pub fn new(options: &LowerOptions) -> Self {
        Self {
            entry: options.entry_name.clone(),
            concat_symbol: options.concat_symbol.clone(),
        }
    }
}

impl Backend for InterpreterBackend {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn emit(&self, module: &Module) -> Result<Emitted> {
        let mut interpreter = Interpreter::new(module);
        interpreter.register_host(self.concat_symbol.clone(), builtin_concat);
        let value = interpreter
            .call(&self.entry, Vec::new())
            .with_context(|| format!("failed to run `{}`", self.entry))?;
        Ok(Emitted::Value(value))
    }
}
