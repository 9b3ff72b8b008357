//! Abstract syntax tree consumed by the lowering engine
//!
//! The tree is produced by an external front end and is immutable once built.
//! Parents own their children; identifiers and type names are plain names that
//! are only resolved when the tree is lowered.
//!
//! Expressions and statements are closed sum types so that every consumer
//! matches exhaustively over the node kinds.

pub mod expr;
pub mod op;
pub mod stmt;
pub mod ty;

pub use expr::{Expr, Identifier};
pub use op::BinaryOperator;
pub use stmt::{ArgumentList, Block, FunctionDeclaration, Stmt, VariableDeclaration};
pub use ty::TypeTag;
