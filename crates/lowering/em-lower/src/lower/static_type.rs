use super::LoweringContext;
use em_ast::{Expr, Identifier, TypeTag};

impl LoweringContext<'_> {
    /// Static tag of `expr`, used for operator dispatch
    ///
    /// Pure: nothing is emitted and no name is interned. Unknown names yield
    /// [`TypeTag::Invalid`] rather than an error; lowering the same
    /// expression reports them.
    #[must_use]
    pub fn static_type(&self, expr: &Expr) -> TypeTag {
        match expr {
            Expr::IntegerLiteral(_) => TypeTag::Integer,
            Expr::FloatLiteral(_) => TypeTag::Float,
            Expr::StringLiteral(_) => TypeTag::String,
            Expr::Identifier(name) => self.identifier_type(name),
            Expr::BinaryOp { lhs, rhs, .. } => self.static_type(lhs).join(self.static_type(rhs)),
            Expr::Assignment { rhs, .. } => self.static_type(rhs),
            Expr::Call { callee, .. } => self.return_tag(callee),
            Expr::AddressOf(_) => TypeTag::Invalid,
        }
    }

    fn identifier_type(&self, name: &Identifier) -> TypeTag {
        let Some(symbol) = self.interner.get(name.as_str()) else {
            return TypeTag::Invalid;
        };
        self.env
            .lookup(symbol)
            .map(|binding| binding.tag)
            .or_else(|| self.functions.get(symbol).map(|entry| entry.return_tag))
            .unwrap_or(TypeTag::Invalid)
    }

    fn return_tag(&self, callee: &Identifier) -> TypeTag {
        self.interner
            .get(callee.as_str())
            .and_then(|symbol| self.functions.get(symbol))
            .map_or(TypeTag::Invalid, |entry| entry.return_tag)
    }
}
