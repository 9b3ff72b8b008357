//! Expression nodes

use crate::op::BinaryOperator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A name reference: variable, parameter, function or type name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier {
    /// The referenced name
    pub name: String,
}

impl Identifier {
    /// Create an identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The referenced name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self { name }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.name)
    }
}

/// An expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// 64-bit integer constant
    IntegerLiteral(i64),
    /// Double constant
    FloatLiteral(f64),
    /// String constant, already unescaped by the front end
    StringLiteral(String),
    /// Read of a parameter or local
    Identifier(Identifier),
    /// `lhs op rhs`
    BinaryOp {
        /// Left operand
        lhs: Box<Self>,
        /// Operator code
        op: BinaryOperator,
        /// Right operand
        rhs: Box<Self>,
    },
    /// `lhs = rhs`
    Assignment {
        /// Assigned local
        lhs: Identifier,
        /// Assigned value
        rhs: Box<Self>,
    },
    /// `callee(args...)`
    Call {
        /// Called function
        callee: Identifier,
        /// Arguments, evaluated left to right
        args: Vec<Self>,
    },
    /// `&name`: the storage of a local, or the value of a parameter
    AddressOf(Identifier),
}

impl Expr {
    /// Integer literal
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::IntegerLiteral(value)
    }

    /// Float literal
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::FloatLiteral(value)
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringLiteral(value.into())
    }

    /// Identifier reference
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(Identifier::new(name))
    }

    /// Binary operation
    #[must_use]
    pub fn binary(lhs: Self, op: BinaryOperator, rhs: Self) -> Self {
        Self::BinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// Assignment to a local
    pub fn assign(lhs: impl Into<String>, rhs: Self) -> Self {
        Self::Assignment {
            lhs: Identifier::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Function call
    pub fn call(callee: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            callee: Identifier::new(callee),
            args,
        }
    }

    /// Address of a local or parameter
    pub fn address_of(name: impl Into<String>) -> Self {
        Self::AddressOf(Identifier::new(name))
    }
}
