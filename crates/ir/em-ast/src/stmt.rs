//! Statement nodes and declarations

use crate::expr::{Expr, Identifier};
use serde::{Deserialize, Serialize};

/// A statement node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression evaluated for its value or side effects
    Expression(Expr),
    /// `return expr`
    Return(Expr),
    /// `var name: type = init`
    VariableDeclaration(VariableDeclaration),
    /// `function name(args): type { body }`
    FunctionDeclaration(FunctionDeclaration),
    /// Nested block, sharing the enclosing function's scope
    Block(Block),
}

/// Ordered statement list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    /// Statements in source order
    pub statements: Vec<Stmt>,
}

impl Block {
    /// Create a block from its statements
    #[must_use]
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Whether the block has no statements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl FromIterator<Stmt> for Block {
    fn from_iter<I: IntoIterator<Item = Stmt>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Variable or formal parameter declaration
///
/// A declaration without `id` only contributes its type to a function
/// signature (an unnamed parameter of an external declaration) and is never
/// materialized as storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Declared type name; absent defers to the initializer
    #[serde(default)]
    pub ty: Option<Identifier>,
    /// Declared name
    #[serde(default)]
    pub id: Option<Identifier>,
    /// Initial value
    #[serde(default)]
    pub initializer: Option<Expr>,
}

impl VariableDeclaration {
    /// `var name: ty`
    pub fn new(name: impl Into<String>, ty: Option<&str>) -> Self {
        Self {
            ty: ty.map(Identifier::from),
            id: Some(Identifier::new(name)),
            initializer: None,
        }
    }

    /// `var name: ty = initializer`
    pub fn with_initializer(name: impl Into<String>, ty: Option<&str>, initializer: Expr) -> Self {
        Self {
            initializer: Some(initializer),
            ..Self::new(name, ty)
        }
    }

    /// A typed, unnamed signature slot
    #[must_use]
    pub fn unnamed(ty: &str) -> Self {
        Self {
            ty: Some(Identifier::from(ty)),
            id: None,
            initializer: None,
        }
    }
}

/// Formal parameters of a function declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentList {
    /// Parameters in declaration order
    pub arguments: Vec<VariableDeclaration>,
    /// Whether callers may pass trailing extra arguments
    #[serde(default)]
    pub variadic: bool,
}

impl ArgumentList {
    /// Fixed-arity parameter list
    #[must_use]
    pub fn new(arguments: Vec<VariableDeclaration>) -> Self {
        Self {
            arguments,
            variadic: false,
        }
    }

    /// Parameter list accepting trailing extra arguments
    #[must_use]
    pub fn variadic(arguments: Vec<VariableDeclaration>) -> Self {
        Self {
            arguments,
            variadic: true,
        }
    }

    /// Number of declared parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether no parameters are declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// Function definition or signature-only declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Declared return type; absent means void
    #[serde(default)]
    pub return_type: Option<Identifier>,
    /// Function name
    pub id: Identifier,
    /// Formal parameters
    #[serde(default)]
    pub arguments: ArgumentList,
    /// Body; absent for forward and external declarations
    #[serde(default)]
    pub body: Option<Block>,
}

impl FunctionDeclaration {
    /// Function with a body
    pub fn new(
        name: impl Into<String>,
        arguments: ArgumentList,
        return_type: Option<&str>,
        body: Block,
    ) -> Self {
        Self {
            return_type: return_type.map(Identifier::from),
            id: Identifier::new(name),
            arguments,
            body: Some(body),
        }
    }

    /// Signature-only declaration
    pub fn external(name: impl Into<String>, arguments: ArgumentList, return_type: Option<&str>) -> Self {
        Self {
            return_type: return_type.map(Identifier::from),
            id: Identifier::new(name),
            arguments,
            body: None,
        }
    }

    /// Whether this declaration carries a body
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

impl From<VariableDeclaration> for Stmt {
    fn from(decl: VariableDeclaration) -> Self {
        Self::VariableDeclaration(decl)
    }
}

impl From<FunctionDeclaration> for Stmt {
    fn from(decl: FunctionDeclaration) -> Self {
        Self::FunctionDeclaration(decl)
    }
}

impl From<Expr> for Stmt {
    fn from(expr: Expr) -> Self {
        Self::Expression(expr)
    }
}

impl From<Block> for Stmt {
    fn from(block: Block) -> Self {
        Self::Block(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::BinaryOperator;

    #[test]
    fn test_function_round_trips_through_json() {
        let add = FunctionDeclaration::new(
            "add",
            ArgumentList::new(vec![
                VariableDeclaration::new("a", Some("int")),
                VariableDeclaration::new("b", Some("int")),
            ]),
            Some("int"),
            Block::new(vec![Stmt::Return(Expr::binary(
                Expr::ident("a"),
                BinaryOperator::Plus,
                Expr::ident("b"),
            ))]),
        );
        let json = serde_json::to_string(&Stmt::from(add.clone())).unwrap();
        let parsed: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Stmt::FunctionDeclaration(add));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"id":"puts","arguments":{"arguments":[{"ty":"string"}]}}"#;
        let decl: FunctionDeclaration = serde_json::from_str(json).unwrap();
        assert!(!decl.has_body());
        assert!(decl.return_type.is_none());
        assert!(!decl.arguments.variadic);
        assert_eq!(decl.arguments.arguments[0], VariableDeclaration::unnamed("string"));
    }
}
