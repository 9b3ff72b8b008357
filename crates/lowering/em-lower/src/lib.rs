//! Lowering of typed syntax trees into IR
//!
//! The root [`Block`] of a unit is lowered into the body of a synthesized
//! entry function; nested function declarations become functions of the same
//! [`Module`]. Lowering is fail-fast: the first [`LowerError`] aborts the
//! session and no partial module is handed out.

mod error;
mod lower;
mod scope;
mod symbol;
mod types;
mod visibility;

pub use error::{LowerError, LowerResult};
pub use lower::LoweringContext;
pub use scope::{Binding, BindingKind, Environment, Scope};
pub use symbol::{FunctionEntry, FunctionState, FunctionTable};
pub use types::{ResolvedType, resolve_return_type, resolve_type};
pub use visibility::{Visibility, visibility_of};

use em_ast::{BinaryOperator, Block};
use em_ir::{FunctionId, IrType, Module};

/// Prefix of the functions that implement operators on non-native types
pub const OPERATOR_PREFIX: &str = "operator_";

/// Name of the overload function for `op`, e.g. `operator_PLUS`
#[must_use]
pub fn overload_name(op: BinaryOperator) -> String {
    format!("{OPERATOR_PREFIX}{}", op.tag())
}

/// Knobs of a lowering session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerOptions {
    /// Module identifier
    pub module_name: String,
    /// Name of the synthesized function holding the top-level statements
    pub entry_name: String,
    /// Runtime function used to concatenate two strings
    pub concat_symbol: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            module_name: "unit".to_owned(),
            entry_name: "__main".to_owned(),
            concat_symbol: "concat".to_owned(),
        }
    }
}

/// A fully lowered unit
#[derive(Debug, Clone)]
pub struct LoweredUnit {
    /// The generated module
    pub module: Module,
    /// The entry function holding the top-level statements
    pub entry: FunctionId,
}

impl LoweredUnit {
    /// Return type of the entry function
    #[must_use]
    pub fn entry_type(&self) -> IrType {
        self.module.function(self.entry).signature.ret
    }
}

/// Lower a whole unit
///
/// # Errors
/// Returns the first [`LowerError`] encountered; nothing is produced for a
/// unit that fails to lower.
pub fn lower_unit(root: &Block, options: &LowerOptions) -> LowerResult<LoweredUnit> {
    LoweringContext::new(options.clone()).lower_unit(root)
}
