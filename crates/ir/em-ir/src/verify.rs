//! Structural checks run before a module is emitted

use crate::module::{Function, InstKind, Module, Terminator};
use crate::types::IrType;
use thiserror::Error;

/// A well-formedness violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// A block of a defined function has no terminator
    #[error("block `{block}` in `{function}` does not end in a terminator")]
    MissingTerminator {
        /// Function name
        function: String,
        /// Block label
        block: String,
    },
    /// A `ret` disagrees with the function's return type
    #[error("`{function}` returns `{found}` but is declared to return `{expected}`")]
    ReturnType {
        /// Function name
        function: String,
        /// Declared return type
        expected: IrType,
        /// Returned type
        found: IrType,
    },
    /// A store writes a value of a different type than the slot holds
    #[error("store of `{found}` into a `{expected}` slot in `{function}`")]
    StoreType {
        /// Function name
        function: String,
        /// Slot type
        expected: IrType,
        /// Stored type
        found: IrType,
    },
    /// A call does not match the callee's arity
    #[error("call from `{function}` to `{callee}` has {found} arguments")]
    CallArity {
        /// Calling function
        function: String,
        /// Called function
        callee: String,
        /// Passed argument count
        found: usize,
    },
}

/// Check every defined function of `module`
///
/// Returns all violations found; an empty list means the module is well
/// formed.
#[must_use]
pub fn verify(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    for (_, function) in module.functions() {
        if !function.is_declaration() {
            verify_function(module, function, &mut errors);
        }
    }
    errors
}

fn verify_function(module: &Module, function: &Function, errors: &mut Vec<VerifyError>) {
    let expected = function.signature.ret;

    for block in function.blocks() {
        match &block.terminator {
            None => errors.push(VerifyError::MissingTerminator {
                function: function.name.clone(),
                block: block.label.clone(),
            }),
            Some(Terminator::Return(value)) => {
                let found = value
                    .as_ref()
                    .map_or(IrType::Void, |value| function.value_type(value));
                if found != expected {
                    errors.push(VerifyError::ReturnType {
                        function: function.name.clone(),
                        expected,
                        found,
                    });
                }
            }
            Some(Terminator::Unreachable) => {}
        }

        for &id in &block.instructions {
            match &function.instruction(id).kind {
                InstKind::Store { value, ptr } => {
                    let Some(slot) = ptr.as_inst() else { continue };
                    if let InstKind::Alloca { allocated } = function.instruction(slot).kind {
                        let found = function.value_type(value);
                        if found != allocated {
                            errors.push(VerifyError::StoreType {
                                function: function.name.clone(),
                                expected: allocated,
                                found,
                            });
                        }
                    }
                }
                InstKind::Call { callee, args } => {
                    let callee = module.function(*callee);
                    if !callee.signature.accepts_arity(args.len()) {
                        errors.push(VerifyError::CallArity {
                            function: function.name.clone(),
                            callee: callee.name.clone(),
                            found: args.len(),
                        });
                    }
                }
                _ => {}
            }
        }
    }
}
