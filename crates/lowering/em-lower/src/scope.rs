//! Stack of function scopes used during lowering

use crate::types::ResolvedType;
use em_ast::{TypeTag, VariableDeclaration};
use em_intern::Symbol;
use em_ir::{IrType, Value};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Which table of a scope a binding lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Incoming argument; the bound value is the argument itself
    Parameter,
    /// Local variable; the bound value is the address of its storage
    Local,
}

/// A name bound in a scope
#[derive(Debug, Clone, Copy)]
pub struct Binding<'ast> {
    /// Table the binding lives in
    pub kind: BindingKind,
    /// Declaration that introduced the name
    pub decl: &'ast VariableDeclaration,
    /// Argument value or storage address
    pub value: Value,
    /// Type of the argument or of the storage contents
    pub ty: IrType,
    /// Static tag of the declared or inferred type
    pub tag: TypeTag,
}

impl<'ast> Binding<'ast> {
    /// Binding for an incoming argument
    #[must_use]
    pub fn parameter(decl: &'ast VariableDeclaration, value: Value, resolved: ResolvedType) -> Self {
        Self {
            kind: BindingKind::Parameter,
            decl,
            value,
            ty: resolved.ir,
            tag: resolved.tag,
        }
    }

    /// Binding for a local's storage
    #[must_use]
    pub fn local(decl: &'ast VariableDeclaration, storage: Value, ty: IrType, tag: TypeTag) -> Self {
        Self {
            kind: BindingKind::Local,
            decl,
            value: storage,
            ty,
            tag,
        }
    }
}

/// Activation record of one function body
///
/// Nested blocks of a function share its scope.
#[derive(Debug, Default)]
pub struct Scope<'ast> {
    parameters: FxHashMap<Symbol, Binding<'ast>>,
    locals: FxHashMap<Symbol, Binding<'ast>>,
}

impl<'ast> Scope<'ast> {
    /// Parameter bound to `name`
    #[must_use]
    pub fn parameter(&self, name: Symbol) -> Option<&Binding<'ast>> {
        self.parameters.get(&name)
    }

    /// Local bound to `name`
    #[must_use]
    pub fn local(&self, name: Symbol) -> Option<&Binding<'ast>> {
        self.locals.get(&name)
    }

    /// Parameters first, then locals
    #[must_use]
    pub fn lookup(&self, name: Symbol) -> Option<&Binding<'ast>> {
        self.parameter(name).or_else(|| self.local(name))
    }

    /// Number of parameters and locals bound
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len() + self.locals.len()
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The scope stack
#[derive(Debug, Default)]
pub struct Environment<'ast> {
    scopes: Vec<Scope<'ast>>,
}

impl<'ast> Environment<'ast> {
    /// Empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a fresh scope; must be paired with [`Environment::pop_scope`]
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
        trace!(depth = self.scopes.len(), "pushed scope");
    }

    /// Deactivate the current scope, discarding its bindings
    pub fn pop_scope(&mut self) -> Option<Scope<'ast>> {
        let scope = self.scopes.pop();
        trace!(depth = self.scopes.len(), "popped scope");
        scope
    }

    /// Number of active scopes
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The innermost scope
    ///
    /// # Panics
    /// Panics when no scope is active: lowering was started outside of a
    /// function body, which is a bug in the caller.
    #[must_use]
    #[allow(clippy::panic, reason = "An empty scope stack is a caller bug, not a lowering error")]
    pub fn current_scope(&self) -> &Scope<'ast> {
        self.scopes
            .last()
            .unwrap_or_else(|| panic!("no active scope: lowering outside of a function body"))
    }

    #[allow(clippy::panic, reason = "An empty scope stack is a caller bug, not a lowering error")]
    fn current_scope_mut(&mut self) -> &mut Scope<'ast> {
        self.scopes
            .last_mut()
            .unwrap_or_else(|| panic!("no active scope: lowering outside of a function body"))
    }

    /// Bind a parameter in the current scope, returning the binding it
    /// replaced
    pub fn declare_parameter(&mut self, name: Symbol, binding: Binding<'ast>) -> Option<Binding<'ast>> {
        self.current_scope_mut().parameters.insert(name, binding)
    }

    /// Bind a local in the current scope, returning the binding it replaced
    pub fn declare_local(&mut self, name: Symbol, binding: Binding<'ast>) -> Option<Binding<'ast>> {
        self.current_scope_mut().locals.insert(name, binding)
    }

    /// Resolve `name` in the current scope: parameters first, then locals
    ///
    /// # Panics
    /// Panics when no scope is active
    #[must_use]
    pub fn resolve(&self, name: Symbol) -> Option<&Binding<'ast>> {
        self.current_scope().lookup(name)
    }

    /// Resolve `name` among the current scope's locals only
    ///
    /// # Panics
    /// Panics when no scope is active
    #[must_use]
    pub fn resolve_local(&self, name: Symbol) -> Option<&Binding<'ast>> {
        self.current_scope().local(name)
    }

    /// Like [`Environment::resolve`], but yields `None` outside of any scope
    #[must_use]
    pub fn lookup(&self, name: Symbol) -> Option<&Binding<'ast>> {
        self.scopes.last().and_then(|scope| scope.lookup(name))
    }
}
