use super::LoweringContext;
use crate::error::{LowerError, LowerResult};
use crate::scope::Binding;
use crate::symbol::{FunctionEntry, FunctionState};
use crate::types::{ResolvedType, resolve_return_type, resolve_type};
use crate::visibility::visibility_of;
use em_ast::FunctionDeclaration;
use em_intern::Symbol;
use em_ir::{FunctionId, Signature, Value};
use tracing::debug;

impl<'ast> LoweringContext<'ast> {
    /// Declare a function and lower its body, if it has one
    ///
    /// The function is registered before its body is lowered, so bodies may
    /// call themselves. The builder position is restored afterwards, so a
    /// declaration may appear in the middle of another body.
    ///
    /// # Errors
    /// Fails with [`LowerError::FunctionRedefinition`] for a second body or a
    /// conflicting signature, or with the first error of the body
    pub fn lower_function(&mut self, decl: &'ast FunctionDeclaration) -> LowerResult<FunctionId> {
        let name = decl.id.as_str();
        let symbol = self.intern(name);
        let ret = resolve_return_type(decl.return_type.as_ref());
        let params: Vec<ResolvedType> = decl
            .arguments
            .arguments
            .iter()
            .map(|arg| resolve_type(arg.ty.as_ref()))
            .collect();
        let signature = Signature::new(
            params.iter().map(|param| param.ir).collect(),
            ret.ir,
            decl.arguments.variadic,
        );

        let Some(function) = self.declare_function(symbol, decl, signature)? else {
            debug!(function = name, "redundant declaration of a defined function");
            return self.existing_function(name);
        };

        let state = if decl.has_body() {
            FunctionState::BodyInProgress
        } else {
            FunctionState::SignatureOnly
        };
        self.functions.insert(
            symbol,
            FunctionEntry {
                decl,
                function,
                return_tag: ret.tag,
                state,
            },
        );

        let Some(body) = &decl.body else {
            debug!(function = name, "declared function signature");
            return Ok(function);
        };

        debug!(function = name, "lowering function body");
        let saved = self.builder.insert_point();
        let entry = self.module.function_mut(function).append_block("entry");
        self.builder.position_at_end(function, entry);

        let result = self.with_scope(|cx| {
            for (arg, (resolved, index)) in decl.arguments.arguments.iter().zip(params.iter().zip(0_u32..)) {
                let Some(id) = &arg.id else { continue };
                let param = cx.intern(id.as_str());
                let binding = Binding::parameter(arg, Value::Param(index), *resolved);
                if cx.env.declare_parameter(param, binding).is_some() {
                    debug!(function = name, parameter = id.as_str(), "parameter redeclared, last one wins");
                }
            }

            cx.lower_block(body)?;
            cx.close_body(symbol, function)
        });
        self.builder.set_insert_point(saved);
        result?;

        self.functions.set_state(symbol, FunctionState::Terminated);
        Ok(function)
    }

    /// Terminate the block the body ended in
    ///
    /// After an explicit `return` the open block only holds dead code and is
    /// closed with `unreachable`; otherwise the implicit return goes there.
    fn close_body(&mut self, symbol: Symbol, function: FunctionId) -> LowerResult<()> {
        if self.builder.is_block_terminated(&self.module) {
            return Ok(());
        }
        let returned = self
            .functions
            .get(symbol)
            .is_some_and(|entry| entry.state == FunctionState::Terminated);
        if returned {
            self.builder.build_unreachable(&mut self.module)?;
            return Ok(());
        }
        self.build_implicit_return(function)
    }

    /// Find or create the module function for `decl`
    ///
    /// Yields `None` for a signature-only redeclaration of a function that
    /// already has a body; there is nothing to update in that case.
    fn declare_function(
        &mut self,
        symbol: Symbol,
        decl: &FunctionDeclaration,
        signature: Signature,
    ) -> LowerResult<Option<FunctionId>> {
        let name = decl.id.as_str();
        let function = match self.module.get_function(name) {
            Some(existing) => {
                let current = self.module.function(existing);
                let defined = self
                    .functions
                    .get(symbol)
                    .map_or(!current.is_declaration(), FunctionEntry::has_body);
                if current.signature != signature || (defined && decl.has_body()) {
                    return Err(LowerError::FunctionRedefinition {
                        name: name.to_owned(),
                    });
                }
                if defined {
                    return Ok(None);
                }
                existing
            }
            None => self
                .module
                .add_function(name, signature, visibility_of(name).into())?,
        };

        self.module.function_mut(function).param_names = decl
            .arguments
            .arguments
            .iter()
            .map(|arg| arg.id.as_ref().map(ToString::to_string))
            .collect();
        Ok(Some(function))
    }

    fn existing_function(&self, name: &str) -> LowerResult<FunctionId> {
        self.module
            .get_function(name)
            .ok_or_else(|| LowerError::UndeclaredFunction {
                name: name.to_owned(),
            })
    }
}
