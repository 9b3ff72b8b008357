//! Positioned instruction builder

use crate::error::BuilderError;
use crate::module::{
    BinaryOp, BlockId, FloatPredicate, FunctionId, InstId, InstKind, Instruction, IntPredicate,
    Module, Terminator,
};
use crate::types::IrType;
use crate::value::Value;

/// A position at the end of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPoint {
    /// Function being built
    pub function: FunctionId,
    /// Block receiving new instructions
    pub block: BlockId,
}

/// Appends instructions at the end of the current block
///
/// Appending to a block that already has a terminator opens a fresh block and
/// continues there, so code following a `ret` is still emitted (and is simply
/// unreachable).
#[derive(Debug, Default)]
pub struct Builder {
    position: Option<InsertPoint>,
}

impl Builder {
    /// Create an unpositioned builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the end of `block` in `function`
    pub fn position_at_end(&mut self, function: FunctionId, block: BlockId) {
        self.position = Some(InsertPoint { function, block });
    }

    /// Current position, for saving around nested function bodies
    #[must_use]
    pub fn insert_point(&self) -> Option<InsertPoint> {
        self.position
    }

    /// Restore a position previously returned by [`Builder::insert_point`]
    pub fn set_insert_point(&mut self, point: Option<InsertPoint>) {
        self.position = point;
    }

    /// Function currently being built
    ///
    /// # Errors
    /// Returns [`BuilderError::Unpositioned`] without an insertion point
    pub fn current_function(&self) -> Result<FunctionId, BuilderError> {
        self.position
            .map(|point| point.function)
            .ok_or(BuilderError::Unpositioned)
    }

    /// Whether the current block already ends in a terminator
    #[must_use]
    pub fn is_block_terminated(&self, module: &Module) -> bool {
        self.position.is_some_and(|point| {
            module
                .function(point.function)
                .block(point.block)
                .is_some_and(|block| block.is_terminated())
        })
    }

    /// Type of `value` in the function being built
    ///
    /// # Errors
    /// Returns [`BuilderError::Unpositioned`] without an insertion point
    pub fn value_type(&self, module: &Module, value: &Value) -> Result<IrType, BuilderError> {
        let function = self.current_function()?;
        Ok(module.function(function).value_type(value))
    }

    fn writable_block(&mut self, module: &mut Module) -> Result<InsertPoint, BuilderError> {
        let point = self.position.ok_or(BuilderError::Unpositioned)?;
        let function = module.function_mut(point.function);
        let open = function
            .block(point.block)
            .is_some_and(|block| !block.is_terminated());
        if open {
            return Ok(point);
        }

        let label = format!("bb{}", function.blocks().len());
        let block = function.append_block(label);
        let point = InsertPoint {
            function: point.function,
            block,
        };
        self.position = Some(point);
        Ok(point)
    }

    fn insert(
        &mut self,
        module: &mut Module,
        kind: InstKind,
        ty: IrType,
        name: &str,
    ) -> Result<InstId, BuilderError> {
        let point = self.writable_block(module)?;
        let instruction = Instruction {
            kind,
            ty,
            name: (!name.is_empty()).then(|| name.to_owned()),
        };
        module
            .function_mut(point.function)
            .push_instruction(point.block, instruction)
            .ok_or(BuilderError::Unpositioned)
    }

    /// Reserve a stack slot of type `ty`; yields its address
    ///
    /// # Errors
    /// Fails for `void` or without an insertion point
    pub fn build_alloca(&mut self, module: &mut Module, ty: IrType, name: &str) -> Result<Value, BuilderError> {
        if !ty.is_first_class() {
            return Err(BuilderError::NotFirstClass(ty));
        }
        self.insert(module, InstKind::Alloca { allocated: ty }, IrType::Ptr, name)
            .map(Value::Inst)
    }

    /// Read a `ty` through `ptr`
    ///
    /// # Errors
    /// Fails when `ptr` is not a pointer or `ty` is `void`
    pub fn build_load(
        &mut self,
        module: &mut Module,
        ty: IrType,
        ptr: Value,
        name: &str,
    ) -> Result<Value, BuilderError> {
        if !ty.is_first_class() {
            return Err(BuilderError::NotFirstClass(ty));
        }
        let ptr_ty = self.value_type(module, &ptr)?;
        if ptr_ty != IrType::Ptr {
            return Err(BuilderError::NotAPointer(ptr_ty));
        }
        self.insert(module, InstKind::Load { ptr }, ty, name).map(Value::Inst)
    }

    /// Write `value` through `ptr`
    ///
    /// # Errors
    /// Fails when `ptr` is not a pointer or `value` has no type
    pub fn build_store(&mut self, module: &mut Module, value: Value, ptr: Value) -> Result<InstId, BuilderError> {
        let ptr_ty = self.value_type(module, &ptr)?;
        if ptr_ty != IrType::Ptr {
            return Err(BuilderError::NotAPointer(ptr_ty));
        }
        let value_ty = self.value_type(module, &value)?;
        if !value_ty.is_first_class() {
            return Err(BuilderError::NotFirstClass(value_ty));
        }
        self.insert(module, InstKind::Store { value, ptr }, IrType::Void, "")
    }

    fn operand_types(&self, module: &Module, lhs: &Value, rhs: &Value) -> Result<IrType, BuilderError> {
        let lhs_ty = self.value_type(module, lhs)?;
        let rhs_ty = self.value_type(module, rhs)?;
        if lhs_ty == rhs_ty {
            Ok(lhs_ty)
        } else {
            Err(BuilderError::OperandTypeMismatch {
                lhs: lhs_ty,
                rhs: rhs_ty,
            })
        }
    }

    /// Integer arithmetic
    ///
    /// # Errors
    /// Fails on a float opcode or non-integer operands
    pub fn build_int_binop(
        &mut self,
        module: &mut Module,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        name: &str,
    ) -> Result<Value, BuilderError> {
        let ty = self.operand_types(module, &lhs, &rhs)?;
        if op.is_float() || !ty.is_integer() {
            return Err(BuilderError::InvalidOperandType {
                instruction: op.mnemonic(),
                expected: if op.is_float() { "floating-point" } else { "integer" },
                found: ty,
            });
        }
        self.insert(module, InstKind::Binary { op, lhs, rhs }, ty, name)
            .map(Value::Inst)
    }

    /// Floating-point arithmetic
    ///
    /// # Errors
    /// Fails on an integer opcode or non-float operands
    pub fn build_float_binop(
        &mut self,
        module: &mut Module,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        name: &str,
    ) -> Result<Value, BuilderError> {
        let ty = self.operand_types(module, &lhs, &rhs)?;
        if !op.is_float() || !ty.is_float() {
            return Err(BuilderError::InvalidOperandType {
                instruction: op.mnemonic(),
                expected: if op.is_float() { "floating-point" } else { "integer" },
                found: ty,
            });
        }
        self.insert(module, InstKind::Binary { op, lhs, rhs }, ty, name)
            .map(Value::Inst)
    }

    /// Signed integer comparison yielding `i1`
    ///
    /// # Errors
    /// Fails on non-integer or mismatched operands
    pub fn build_int_compare(
        &mut self,
        module: &mut Module,
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
        name: &str,
    ) -> Result<Value, BuilderError> {
        let ty = self.operand_types(module, &lhs, &rhs)?;
        if !ty.is_integer() {
            return Err(BuilderError::InvalidOperandType {
                instruction: "icmp",
                expected: "integer",
                found: ty,
            });
        }
        self.insert(module, InstKind::ICmp { pred, lhs, rhs }, IrType::I1, name)
            .map(Value::Inst)
    }

    /// Ordered float comparison yielding `i1`
    ///
    /// # Errors
    /// Fails on non-float or mismatched operands
    pub fn build_float_compare(
        &mut self,
        module: &mut Module,
        pred: FloatPredicate,
        lhs: Value,
        rhs: Value,
        name: &str,
    ) -> Result<Value, BuilderError> {
        let ty = self.operand_types(module, &lhs, &rhs)?;
        if !ty.is_float() {
            return Err(BuilderError::InvalidOperandType {
                instruction: "fcmp",
                expected: "floating-point",
                found: ty,
            });
        }
        self.insert(module, InstKind::FCmp { pred, lhs, rhs }, IrType::I1, name)
            .map(Value::Inst)
    }

    /// Direct call; the result has the callee's return type (possibly `void`)
    ///
    /// # Errors
    /// Fails when the arguments do not match the callee's signature
    pub fn build_call(
        &mut self,
        module: &mut Module,
        callee: FunctionId,
        args: &[Value],
        name: &str,
    ) -> Result<Value, BuilderError> {
        let target = module.function(callee);
        let signature = target.signature.clone();
        if !signature.accepts_arity(args.len()) {
            return Err(BuilderError::CallArity {
                callee: target.name.clone(),
                expected: signature.params.len(),
                found: args.len(),
            });
        }
        for (index, (arg, expected)) in args.iter().zip(&signature.params).enumerate() {
            let found = self.value_type(module, arg)?;
            if found != *expected {
                return Err(BuilderError::CallArgumentType {
                    callee: module.function(callee).name.clone(),
                    index,
                    expected: *expected,
                    found,
                });
            }
        }

        let name = if signature.ret.is_first_class() { name } else { "" };
        let kind = InstKind::Call {
            callee,
            args: args.to_vec(),
        };
        self.insert(module, kind, signature.ret, name).map(Value::Inst)
    }

    /// Terminate the current block with a return
    ///
    /// # Errors
    /// Fails when the value does not match the function's return type
    pub fn build_return(&mut self, module: &mut Module, value: Option<Value>) -> Result<(), BuilderError> {
        let function = self.current_function()?;
        let expected = module.function(function).signature.ret;
        let found = match &value {
            Some(value) => self.value_type(module, value)?,
            None => IrType::Void,
        };
        if found != expected {
            return Err(BuilderError::ReturnTypeMismatch { expected, found });
        }

        self.terminate(module, Terminator::Return(value))
    }

    /// Terminate the current block without leaving the function
    ///
    /// # Errors
    /// Fails without an insertion point
    pub fn build_unreachable(&mut self, module: &mut Module) -> Result<(), BuilderError> {
        self.terminate(module, Terminator::Unreachable)
    }

    fn terminate(&mut self, module: &mut Module, terminator: Terminator) -> Result<(), BuilderError> {
        let point = self.writable_block(module)?;
        if let Some(block) = module.function_mut(point.function).block_mut(point.block) {
            block.terminator = Some(terminator);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Linkage, Signature};

    fn function_with_entry(module: &mut Module, ret: IrType) -> (Builder, FunctionId) {
        let function = module
            .add_function("f", Signature::new(vec![IrType::I64], ret, false), Linkage::External)
            .unwrap();
        let entry = module.function_mut(function).append_block("entry");
        let mut builder = Builder::new();
        builder.position_at_end(function, entry);
        (builder, function)
    }

    #[test]
    fn test_unpositioned_builder_fails() {
        let mut module = Module::new("test");
        let mut builder = Builder::new();
        let err = builder
            .build_alloca(&mut module, IrType::I64, "x")
            .unwrap_err();
        assert_eq!(err, BuilderError::Unpositioned);
    }

    #[test]
    fn test_mixed_operands_are_rejected() {
        let mut module = Module::new("test");
        let (mut builder, _) = function_with_entry(&mut module, IrType::Void);
        let err = builder
            .build_int_binop(&mut module, BinaryOp::Add, Value::int(1), Value::float(2.0), "")
            .unwrap_err();
        assert_eq!(
            err,
            BuilderError::OperandTypeMismatch {
                lhs: IrType::I64,
                rhs: IrType::F64
            }
        );
    }

    #[test]
    fn test_instructions_after_return_open_new_block() {
        let mut module = Module::new("test");
        let (mut builder, function) = function_with_entry(&mut module, IrType::I64);
        builder.build_return(&mut module, Some(Value::Param(0))).unwrap();
        assert!(builder.is_block_terminated(&module));

        builder.build_alloca(&mut module, IrType::I64, "late").unwrap();
        let blocks = module.function(function).blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].label, "bb1");
        assert!(!builder.is_block_terminated(&module));

        builder.build_unreachable(&mut module).unwrap();
        let f = module.function(function);
        assert_eq!(f.blocks()[1].terminator, Some(Terminator::Unreachable));
        assert_eq!(f.return_count(), 1);
    }

    #[test]
    fn test_return_type_is_checked() {
        let mut module = Module::new("test");
        let (mut builder, _) = function_with_entry(&mut module, IrType::I64);
        let err = builder.build_return(&mut module, None).unwrap_err();
        assert_eq!(
            err,
            BuilderError::ReturnTypeMismatch {
                expected: IrType::I64,
                found: IrType::Void
            }
        );
    }

    #[test]
    fn test_comparison_yields_i1() {
        let mut module = Module::new("test");
        let (mut builder, function) = function_with_entry(&mut module, IrType::Void);
        let cmp = builder
            .build_int_compare(&mut module, IntPredicate::Slt, Value::Param(0), Value::int(3), "")
            .unwrap();
        assert_eq!(module.function(function).value_type(&cmp), IrType::I1);
    }
}
