use super::LoweringContext;
use crate::error::LowerResult;
use crate::scope::Binding;
use crate::types::resolve_type;
use em_ast::{Block, Expr, Stmt, VariableDeclaration};
use em_ir::Value;
use tracing::debug;

impl<'ast> LoweringContext<'ast> {
    /// Lower the statements of `block` in order
    ///
    /// Yields the value of the last statement, if it produced one.
    ///
    /// # Errors
    /// Fails with the first statement that fails
    pub fn lower_block(&mut self, block: &'ast Block) -> LowerResult<Option<Value>> {
        let mut last = None;
        for stmt in &block.statements {
            last = self.lower_stmt(stmt)?;
        }
        Ok(last)
    }

    /// Lower one statement
    ///
    /// # Errors
    /// Fails when the statement or one of its expressions cannot be lowered
    pub fn lower_stmt(&mut self, stmt: &'ast Stmt) -> LowerResult<Option<Value>> {
        match stmt {
            Stmt::Expression(expr) => self.lower_expr(expr).map(Some),
            Stmt::Return(expr) => self.lower_return(expr),
            Stmt::VariableDeclaration(decl) => self.lower_variable(decl),
            Stmt::FunctionDeclaration(decl) => {
                self.lower_function(decl)?;
                Ok(None)
            }
            Stmt::Block(block) => self.lower_block(block),
        }
    }

    fn lower_return(&mut self, expr: &'ast Expr) -> LowerResult<Option<Value>> {
        let value = self.lower_expr(expr)?;
        let ty = self.builder.value_type(&self.module, &value)?;
        let function = self.builder.current_function()?;
        self.fix_entry_return(function, ty);

        let value = ty.is_first_class().then_some(value);
        self.builder.build_return(&mut self.module, value)?;
        self.functions.mark_returned(function);
        Ok(None)
    }

    fn lower_variable(&mut self, decl: &'ast VariableDeclaration) -> LowerResult<Option<Value>> {
        // Unnamed declarations only describe parameter types
        let Some(id) = &decl.id else {
            return Ok(None);
        };

        let declared = resolve_type(decl.ty.as_ref());
        let (initial, ty, tag) = match &decl.initializer {
            Some(init) => {
                let tag = if decl.ty.is_some() {
                    declared.tag
                } else {
                    self.static_type(init)
                };
                let value = self.lower_expr(init)?;
                let ty = if decl.ty.is_some() {
                    declared.ir
                } else {
                    self.builder.value_type(&self.module, &value)?
                };
                (Some(value), ty, tag)
            }
            None => (None, declared.ir, declared.tag),
        };

        let slot = self.builder.build_alloca(&mut self.module, ty, id.as_str())?;
        let symbol = self.intern(id.as_str());
        if self
            .env
            .declare_local(symbol, Binding::local(decl, slot, ty, tag))
            .is_some()
        {
            debug!(name = id.as_str(), "local redeclared, last declaration wins");
        }

        if let Some(value) = initial {
            self.builder.build_store(&mut self.module, value, slot)?;
        }
        Ok(Some(slot))
    }
}
