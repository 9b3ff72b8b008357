//! Binary operator dispatch
//!
//! String `+` goes to the runtime concatenation routine, integer and float
//! operands to the native instruction tables, everything else to an
//! `operator_<TAG>` overload function.

use super::LoweringContext;
use crate::error::{LowerError, LowerResult};
use crate::overload_name;
use em_ast::{BinaryOperator, Expr, TypeTag};
use em_ir::{BinaryOp, FloatPredicate, FunctionId, IntPredicate, IrType, Linkage, Signature, Value};
use tracing::{debug, trace};

/// Native lowering of an operator
enum NativeOp<P> {
    Arithmetic(BinaryOp),
    Compare(P),
}

fn integer_op(op: BinaryOperator) -> Option<NativeOp<IntPredicate>> {
    Some(match op {
        BinaryOperator::Plus => NativeOp::Arithmetic(BinaryOp::Add),
        BinaryOperator::Minus => NativeOp::Arithmetic(BinaryOp::Sub),
        BinaryOperator::Mul => NativeOp::Arithmetic(BinaryOp::Mul),
        BinaryOperator::Div => NativeOp::Arithmetic(BinaryOp::SDiv),
        BinaryOperator::Eq => NativeOp::Compare(IntPredicate::Eq),
        BinaryOperator::Ne => NativeOp::Compare(IntPredicate::Ne),
        BinaryOperator::Lt => NativeOp::Compare(IntPredicate::Slt),
        BinaryOperator::Gt => NativeOp::Compare(IntPredicate::Sgt),
        BinaryOperator::Le => NativeOp::Compare(IntPredicate::Sle),
        BinaryOperator::Ge => NativeOp::Compare(IntPredicate::Sge),
        BinaryOperator::Mod => return None,
    })
}

fn float_op(op: BinaryOperator) -> Option<NativeOp<FloatPredicate>> {
    Some(match op {
        BinaryOperator::Plus => NativeOp::Arithmetic(BinaryOp::FAdd),
        BinaryOperator::Minus => NativeOp::Arithmetic(BinaryOp::FSub),
        BinaryOperator::Mul => NativeOp::Arithmetic(BinaryOp::FMul),
        BinaryOperator::Div => NativeOp::Arithmetic(BinaryOp::FDiv),
        BinaryOperator::Eq => NativeOp::Compare(FloatPredicate::Oeq),
        BinaryOperator::Ne => NativeOp::Compare(FloatPredicate::One),
        BinaryOperator::Lt => NativeOp::Compare(FloatPredicate::Olt),
        BinaryOperator::Gt => NativeOp::Compare(FloatPredicate::Ogt),
        BinaryOperator::Le => NativeOp::Compare(FloatPredicate::Ole),
        BinaryOperator::Ge => NativeOp::Compare(FloatPredicate::Oge),
        BinaryOperator::Mod => return None,
    })
}

impl<'ast> LoweringContext<'ast> {
    pub(super) fn lower_binary(
        &mut self,
        lhs: &'ast Expr,
        op: BinaryOperator,
        rhs: &'ast Expr,
    ) -> LowerResult<Value> {
        let lhs_tag = self.static_type(lhs);
        let rhs_tag = self.static_type(rhs);
        if op == BinaryOperator::Plus && lhs_tag == TypeTag::String && rhs_tag == TypeTag::String {
            return self.lower_concat(lhs, rhs);
        }

        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;
        let lhs_ty = self.builder.value_type(&self.module, &lhs)?;
        let rhs_ty = self.builder.value_type(&self.module, &rhs)?;
        if lhs_tag != rhs_tag || lhs_ty != rhs_ty {
            return Err(LowerError::type_mismatch(op, (lhs_tag, lhs_ty), (rhs_tag, rhs_ty)));
        }

        if lhs_ty.is_integer() {
            self.lower_integer_op(op, lhs_ty, lhs, rhs)
        } else if lhs_ty.is_float() {
            self.lower_float_op(op, lhs_ty, lhs, rhs)
        } else {
            self.lower_overload(op, lhs, rhs)
        }
    }

    fn lower_integer_op(&mut self, op: BinaryOperator, ty: IrType, lhs: Value, rhs: Value) -> LowerResult<Value> {
        let native = integer_op(op).ok_or(LowerError::UnsupportedOperator { op, ty })?;
        let value = match native {
            NativeOp::Arithmetic(binop) => self
                .builder
                .build_int_binop(&mut self.module, binop, lhs, rhs, "")?,
            NativeOp::Compare(pred) => self
                .builder
                .build_int_compare(&mut self.module, pred, lhs, rhs, "")?,
        };
        Ok(value)
    }

    fn lower_float_op(&mut self, op: BinaryOperator, ty: IrType, lhs: Value, rhs: Value) -> LowerResult<Value> {
        let native = float_op(op).ok_or(LowerError::UnsupportedOperator { op, ty })?;
        let value = match native {
            NativeOp::Arithmetic(binop) => self
                .builder
                .build_float_binop(&mut self.module, binop, lhs, rhs, "")?,
            NativeOp::Compare(pred) => self
                .builder
                .build_float_compare(&mut self.module, pred, lhs, rhs, "")?,
        };
        Ok(value)
    }

    fn lower_overload(&mut self, op: BinaryOperator, lhs: Value, rhs: Value) -> LowerResult<Value> {
        let name = overload_name(op);
        let entry = self
            .interner
            .get(&name)
            .and_then(|symbol| self.functions.get(symbol))
            .copied()
            .filter(|entry| {
                self.module
                    .function(entry.function)
                    .signature
                    .accepts_arity(2)
            });
        let Some(entry) = entry else {
            return Err(LowerError::OverloadNotFound { op, name });
        };

        debug!(operator = %op, overload = %name, "resolved operator overload");
        Ok(self
            .builder
            .build_call(&mut self.module, entry.function, &[lhs, rhs], "")?)
    }

    fn lower_concat(&mut self, lhs: &'ast Expr, rhs: &'ast Expr) -> LowerResult<Value> {
        if let (Expr::StringLiteral(left), Expr::StringLiteral(right)) = (lhs, rhs) {
            trace!("folding string literals");
            let folded = self.module.add_global_string(format!("{left}{right}"));
            return Ok(Value::Global(folded));
        }

        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;
        let concat = self.runtime_concat()?;
        Ok(self
            .builder
            .build_call(&mut self.module, concat, &[lhs, rhs], "")?)
    }

    /// The concatenation routine: the unit's own declaration if it has one,
    /// otherwise an external `ptr (ptr, ptr)` declared on first use
    fn runtime_concat(&mut self) -> LowerResult<FunctionId> {
        let name = self.options.concat_symbol.clone();
        let declared = self
            .interner
            .get(&name)
            .and_then(|symbol| self.functions.get(symbol))
            .map(|entry| entry.function)
            .or_else(|| self.module.get_function(&name));
        if let Some(function) = declared {
            return Ok(function);
        }

        debug!(symbol = %name, "declaring runtime string concatenation");
        let signature = Signature::new(vec![IrType::Ptr, IrType::Ptr], IrType::Ptr, false);
        Ok(self.module.add_function(name, signature, Linkage::External)?)
    }
}
