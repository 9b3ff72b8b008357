//! Coarse static type classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static type tag of an expression
///
/// This is not a type system: the tag only decides which operator table a
/// binary operation dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// 64-bit signed integer
    Integer,
    /// IEEE double
    Float,
    /// Null-terminated byte string
    String,
    /// Unknown, untyped or mismatched
    Invalid,
}

impl TypeTag {
    /// Tag of a binary expression whose operands have tags `self` and `other`
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        if self == other { self } else { Self::Invalid }
    }

    /// Whether the tag names one of the natively supported types
    #[must_use]
    pub fn is_native(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "int",
            Self::Float => "double",
            Self::String => "string",
            Self::Invalid => "<invalid>",
        };
        formatter.write_str(name)
    }
}
