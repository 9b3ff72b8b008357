//! Errors reported while constructing IR

use crate::types::IrType;
use thiserror::Error;

/// Malformed instruction or module construction request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// The builder has no insertion point
    #[error("builder is not positioned inside a function")]
    Unpositioned,
    /// A function with this symbol name already exists
    #[error("function `{0}` is already defined in this module")]
    DuplicateFunction(String),
    /// A `void` type was used where a value type is required
    #[error("`{0}` is not a first-class value type")]
    NotFirstClass(IrType),
    /// Memory operation on something that is not a pointer
    #[error("expected a pointer operand, found `{0}`")]
    NotAPointer(IrType),
    /// Operands of a binary instruction differ in type
    #[error("operand types differ: `{lhs}` and `{rhs}`")]
    OperandTypeMismatch {
        /// Type of the left operand
        lhs: IrType,
        /// Type of the right operand
        rhs: IrType,
    },
    /// Operand category does not suit the instruction
    #[error("`{instruction}` expects {expected} operands, found `{found}`")]
    InvalidOperandType {
        /// Instruction mnemonic
        instruction: &'static str,
        /// Expected operand category
        expected: &'static str,
        /// Actual operand type
        found: IrType,
    },
    /// Call with the wrong number of arguments
    #[error("call to `{callee}` passes {found} arguments, signature takes {expected}")]
    CallArity {
        /// Called function
        callee: String,
        /// Declared parameter count
        expected: usize,
        /// Passed argument count
        found: usize,
    },
    /// Call argument type differs from the declared parameter type
    #[error("argument {index} of call to `{callee}` has type `{found}`, expected `{expected}`")]
    CallArgumentType {
        /// Called function
        callee: String,
        /// Argument position
        index: usize,
        /// Declared type
        expected: IrType,
        /// Passed type
        found: IrType,
    },
    /// Returned value does not match the function's return type
    #[error("return of `{found}` from a function returning `{expected}`")]
    ReturnTypeMismatch {
        /// Declared return type
        expected: IrType,
        /// Returned type
        found: IrType,
    },
}
