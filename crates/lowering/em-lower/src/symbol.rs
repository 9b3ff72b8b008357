//! Function table

use em_ast::{FunctionDeclaration, TypeTag};
use em_intern::Symbol;
use em_ir::FunctionId;
use indexmap::IndexMap;

/// Lowering progress of a declared function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionState {
    /// Registered without a body; may still receive one
    SignatureOnly,
    /// Body is being lowered
    BodyInProgress,
    /// An explicit `return` was lowered, or the body is complete
    Terminated,
}

/// A function known to the unit
#[derive(Debug, Clone, Copy)]
pub struct FunctionEntry<'ast> {
    /// Most recent declaration of the function
    pub decl: &'ast FunctionDeclaration,
    /// The function in the module
    pub function: FunctionId,
    /// Static tag of the declared return type
    pub return_tag: TypeTag,
    /// Lowering progress
    pub state: FunctionState,
}

impl FunctionEntry<'_> {
    /// Whether a body has been (or is being) lowered
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.state != FunctionState::SignatureOnly
    }
}

/// Declared functions by name, in declaration order
#[derive(Debug, Default)]
pub struct FunctionTable<'ast> {
    entries: IndexMap<Symbol, FunctionEntry<'ast>>,
}

impl<'ast> FunctionTable<'ast> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the entry for `name`
    pub fn insert(&mut self, name: Symbol, entry: FunctionEntry<'ast>) -> Option<FunctionEntry<'ast>> {
        self.entries.insert(name, entry)
    }

    /// Entry for `name`
    #[must_use]
    pub fn get(&self, name: Symbol) -> Option<&FunctionEntry<'ast>> {
        self.entries.get(&name)
    }

    /// Update the lowering state of `name`
    pub fn set_state(&mut self, name: Symbol, state: FunctionState) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.state = state;
        }
    }

    /// Mark the function lowered into `function` as explicitly returned
    pub fn mark_returned(&mut self, function: FunctionId) {
        if let Some(entry) = self.entries.values_mut().find(|entry| entry.function == function) {
            entry.state = FunctionState::Terminated;
        }
    }

    /// Number of registered functions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no function has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &FunctionEntry<'ast>)> {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }
}
