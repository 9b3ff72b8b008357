//! IR value types

use std::fmt;

/// Type of an IR value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// No value
    Void,
    /// Truth value produced by comparisons
    I1,
    /// 64-bit integer
    I64,
    /// IEEE double
    F64,
    /// Opaque pointer
    Ptr,
}

impl IrType {
    /// Integer types, including the comparison result type
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(self, Self::I1 | Self::I64)
    }

    /// Floating-point types
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::F64)
    }

    /// Types a value, local or parameter can have
    #[must_use]
    pub fn is_first_class(self) -> bool {
        !matches!(self, Self::Void)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Void => "void",
            Self::I1 => "i1",
            Self::I64 => "i64",
            Self::F64 => "double",
            Self::Ptr => "ptr",
        };
        formatter.write_str(name)
    }
}
