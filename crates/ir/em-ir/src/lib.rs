//! Target intermediate representation
//!
//! A small LLVM-shaped SSA form: a [`Module`] owns functions and string
//! globals, each defined [`Function`] owns its instructions and an ordered list
//! of basic blocks ending in a terminator. Instructions are appended through a
//! positioned [`Builder`], which checks operand types the same way the LLVM
//! builder does and reports violations as [`BuilderError`]s instead of
//! aborting.
//!
//! The module can be printed in a textual form (`Display`) and checked with
//! [`verify`] before it is handed to an emission backend.

mod builder;
mod error;
mod module;
mod printer;
mod types;
mod value;
mod verify;

pub use builder::{Builder, InsertPoint};
pub use error::BuilderError;
pub use module::{
    BasicBlock, BinaryOp, BlockId, FloatPredicate, Function, FunctionId, GlobalId, GlobalString,
    InstId, InstKind, Instruction, IntPredicate, Linkage, Module, Signature, Terminator,
};
pub use types::IrType;
pub use value::{Constant, Value};
pub use verify::{VerifyError, verify};
