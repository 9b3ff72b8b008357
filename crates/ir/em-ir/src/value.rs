//! IR operands

use crate::module::{GlobalId, InstId};
use crate::types::IrType;

/// Compile-time constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    /// `i64` constant
    Int(i64),
    /// `double` constant
    Float(f64),
    /// `i1` constant
    Bool(bool),
    /// Null pointer
    Null,
}

impl Constant {
    /// Type of the constant
    #[must_use]
    pub fn ty(self) -> IrType {
        match self {
            Self::Int(_) => IrType::I64,
            Self::Float(_) => IrType::F64,
            Self::Bool(_) => IrType::I1,
            Self::Null => IrType::Ptr,
        }
    }

    /// Zero value of a first-class type
    #[must_use]
    pub fn zero(ty: IrType) -> Option<Self> {
        match ty {
            IrType::Void => None,
            IrType::I1 => Some(Self::Bool(false)),
            IrType::I64 => Some(Self::Int(0)),
            IrType::F64 => Some(Self::Float(0.0)),
            IrType::Ptr => Some(Self::Null),
        }
    }
}

/// Operand of an instruction
///
/// Values are only meaningful inside the function (parameters, instruction
/// results) or module (globals) that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Constant operand
    Const(Constant),
    /// Incoming argument by position
    Param(u32),
    /// Result of an instruction of the current function
    Inst(InstId),
    /// Address of a string global
    Global(GlobalId),
}

impl Value {
    /// `i64` constant
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Const(Constant::Int(value))
    }

    /// `double` constant
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::Const(Constant::Float(value))
    }

    /// Instruction id, if this value is an instruction result
    #[must_use]
    pub fn as_inst(&self) -> Option<InstId> {
        match self {
            Self::Inst(id) => Some(*id),
            _ => None,
        }
    }
}
