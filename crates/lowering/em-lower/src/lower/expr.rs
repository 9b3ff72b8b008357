use super::LoweringContext;
use crate::error::{LowerError, LowerResult};
use crate::scope::BindingKind;
use em_ast::{Expr, Identifier};
use em_ir::Value;

fn undeclared(name: &Identifier) -> LowerError {
    LowerError::UndeclaredVariable {
        name: name.to_string(),
    }
}

impl<'ast> LoweringContext<'ast> {
    /// Lower an expression to the value it computes
    ///
    /// # Errors
    /// Fails on unresolved names, operand type errors and bad calls
    ///
    /// # Panics
    /// Panics when a name has to be resolved outside of any scope
    pub fn lower_expr(&mut self, expr: &'ast Expr) -> LowerResult<Value> {
        match expr {
            Expr::IntegerLiteral(value) => Ok(Value::int(*value)),
            Expr::FloatLiteral(value) => Ok(Value::float(*value)),
            Expr::StringLiteral(value) => Ok(Value::Global(self.module.add_global_string(value.as_str()))),
            Expr::Identifier(name) => self.lower_identifier(name),
            Expr::BinaryOp { lhs, op, rhs } => self.lower_binary(lhs, *op, rhs),
            Expr::Assignment { lhs, rhs } => self.lower_assignment(lhs, rhs),
            Expr::Call { callee, args } => self.lower_call(callee, args),
            Expr::AddressOf(name) => self.lower_address_of(name),
        }
    }

    fn lower_identifier(&mut self, name: &Identifier) -> LowerResult<Value> {
        let symbol = self.intern(name.as_str());
        let binding = *self.env.resolve(symbol).ok_or_else(|| undeclared(name))?;
        match binding.kind {
            BindingKind::Parameter => Ok(binding.value),
            BindingKind::Local => Ok(self.builder.build_load(
                &mut self.module,
                binding.ty,
                binding.value,
                name.as_str(),
            )?),
        }
    }

    fn lower_assignment(&mut self, target: &Identifier, rhs: &'ast Expr) -> LowerResult<Value> {
        // Parameters are values, not storage, so only locals can be assigned
        let symbol = self.intern(target.as_str());
        let binding = *self
            .env
            .resolve_local(symbol)
            .ok_or_else(|| undeclared(target))?;

        let value = self.lower_expr(rhs)?;
        self.builder.build_store(&mut self.module, value, binding.value)?;
        Ok(value)
    }

    fn lower_address_of(&mut self, name: &Identifier) -> LowerResult<Value> {
        let symbol = self.intern(name.as_str());
        self.env
            .resolve(symbol)
            .map(|binding| binding.value)
            .ok_or_else(|| undeclared(name))
    }

    fn lower_call(&mut self, callee: &Identifier, args: &'ast [Expr]) -> LowerResult<Value> {
        let symbol = self.intern(callee.as_str());
        let entry = *self
            .functions
            .get(symbol)
            .ok_or_else(|| LowerError::UndeclaredFunction {
                name: callee.to_string(),
            })?;

        let declared = &entry.decl.arguments;
        let accepted = if declared.variadic {
            args.len() >= declared.len()
        } else {
            args.len() == declared.len()
        };
        if !accepted {
            return Err(LowerError::ArgumentCountMismatch {
                name: callee.to_string(),
                expected: declared.len(),
                found: args.len(),
                variadic: declared.variadic,
            });
        }

        let values = args
            .iter()
            .map(|arg| self.lower_expr(arg))
            .collect::<LowerResult<Vec<_>>>()?;
        Ok(self
            .builder
            .build_call(&mut self.module, entry.function, &values, "")?)
    }
}
