//! Runtime value representation

#![allow(
    clippy::min_ident_chars,
    reason = "Short identifiers like i, f, b, s are conventional in value implementations"
)]

use std::fmt;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a `void` call or function
    Unit,
    /// `i1` value
    Bool(bool),
    /// `i64` value
    Int(i64),
    /// `double` value
    Float(f64),
    /// Pointer to string bytes
    String(String),
    /// Address of a stack slot
    Pointer(usize),
    /// Null pointer
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(fl) => write!(f, "{fl}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Pointer(slot) => write!(f, "<slot {slot}>"),
            Self::Null => write!(f, "null"),
        }
    }
}
