//! IR interpreter
//!
//! Executes lowered modules directly, without a native backend. Used to run
//! units during development and to check lowering results in tests.

pub mod interpreter;
pub mod value;

pub use interpreter::{HostFunction, Interpreter, InterpreterError, builtin_concat};
pub use value::Value;
