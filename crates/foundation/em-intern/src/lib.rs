//! String interning for identifier and function names
//!
//! Every name the lowering engine looks up (parameters, locals, functions)
//! goes through one [`Interner`] owned by the lowering session, so scope
//! tables and the function table can key on a cheap `Copy` handle.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Shared string interner
#[derive(Clone, Default)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning the existing symbol if it was seen before
    pub fn intern(&self, name: &str) -> Symbol {
        self.inner.get_or_intern(name)
    }

    /// Look up a name without interning it
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.inner.get(name)
    }

    /// Number of distinct names interned so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Interner").field("len", &self.len()).finish()
    }
}
