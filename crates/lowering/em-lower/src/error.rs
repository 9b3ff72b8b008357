//! Lowering failures
//!
//! Every variant aborts the lowering session; there is no recovery and no
//! multi-error collection.

use em_ast::{BinaryOperator, TypeTag};
use em_ir::{BuilderError, IrType};
use miette::Diagnostic;
use thiserror::Error;

/// Error raised while lowering a tree
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LowerError {
    /// Identifier, assignment target or address-of target not in scope
    #[error("undeclared variable `{name}`")]
    #[diagnostic(
        code(lower::undeclared_variable),
        help("declare it with `var {name}` before using it")
    )]
    UndeclaredVariable {
        /// The unresolved name
        name: String,
    },

    /// Call target missing from the function table
    #[error("function `{name}` not found")]
    #[diagnostic(
        code(lower::undeclared_function),
        help("functions must be declared before the first call")
    )]
    UndeclaredFunction {
        /// The unresolved function name
        name: String,
    },

    /// Operands of a binary operator have incompatible types
    #[error("cannot create binary operator `{op}` for different argument types `{lhs}` and `{rhs}`")]
    #[diagnostic(code(lower::type_mismatch))]
    TypeMismatch {
        /// Operator
        op: BinaryOperator,
        /// Description of the left operand type
        lhs: String,
        /// Description of the right operand type
        rhs: String,
    },

    /// Operator code the native operator tables do not implement
    #[error("unsupported operator `{op}` for `{ty}` operands")]
    #[diagnostic(code(lower::unsupported_operator))]
    UnsupportedOperator {
        /// Operator
        op: BinaryOperator,
        /// Operand type
        ty: IrType,
    },

    /// Non-native operands and no matching overload function
    #[error("cannot find overloaded operator `{name}` for `{op}`")]
    #[diagnostic(
        code(lower::overload_not_found),
        help("declare a two-argument function named `{name}`")
    )]
    OverloadNotFound {
        /// Operator
        op: BinaryOperator,
        /// Function name that was looked up
        name: String,
    },

    /// Call with an argument count the callee does not accept
    #[error("`{name}` expects {expected}{} arguments, found {found}", or_more(.variadic))]
    #[diagnostic(code(lower::argument_count))]
    ArgumentCountMismatch {
        /// Called function
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
        /// Whether the callee is variadic
        variadic: bool,
    },

    /// Second body, or a conflicting signature, for an existing function
    #[error("function `{name}` is already defined with a body or a different signature")]
    #[diagnostic(code(lower::function_redefinition))]
    FunctionRedefinition {
        /// Function name
        name: String,
    },

    /// The IR builder rejected an instruction
    #[error(transparent)]
    #[diagnostic(code(lower::malformed_ir))]
    Builder(#[from] BuilderError),
}

impl LowerError {
    pub(crate) fn type_mismatch(
        op: BinaryOperator,
        (lhs_tag, lhs_ty): (TypeTag, IrType),
        (rhs_tag, rhs_ty): (TypeTag, IrType),
    ) -> Self {
        Self::TypeMismatch {
            op,
            lhs: describe(lhs_tag, lhs_ty),
            rhs: describe(rhs_tag, rhs_ty),
        }
    }
}

fn or_more(variadic: &bool) -> &'static str {
    if *variadic { " or more" } else { "" }
}

fn describe(tag: TypeTag, ty: IrType) -> String {
    if tag.is_native() {
        format!("{tag} ({ty})")
    } else {
        ty.to_string()
    }
}

/// Result alias used throughout the lowering engine
pub type LowerResult<T> = Result<T, LowerError>;
