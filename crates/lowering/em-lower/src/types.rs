//! Declared type names to IR types and static tags

use em_ast::{Identifier, TypeTag};
use em_ir::IrType;

/// Result of resolving a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    /// Representation in the IR
    pub ir: IrType,
    /// Static tag used for operator dispatch
    pub tag: TypeTag,
}

impl ResolvedType {
    /// Placeholder for unknown or missing type names: a pointer-sized opaque
    /// value whose tag is `Invalid`
    pub const UNTYPED: Self = Self {
        ir: IrType::Ptr,
        tag: TypeTag::Invalid,
    };

    /// Return type of a procedure
    pub const VOID: Self = Self {
        ir: IrType::Void,
        tag: TypeTag::Invalid,
    };
}

/// Resolve a declared variable or parameter type
///
/// `int` is a 64-bit integer, `double` and `float` are IEEE doubles and
/// `string` is a pointer to bytes. Everything else, including an absent name,
/// resolves to [`ResolvedType::UNTYPED`].
#[must_use]
pub fn resolve_type(name: Option<&Identifier>) -> ResolvedType {
    match name.map(Identifier::as_str) {
        Some("int") => ResolvedType {
            ir: IrType::I64,
            tag: TypeTag::Integer,
        },
        Some("double" | "float") => ResolvedType {
            ir: IrType::F64,
            tag: TypeTag::Float,
        },
        Some("string") => ResolvedType {
            ir: IrType::Ptr,
            tag: TypeTag::String,
        },
        _ => ResolvedType::UNTYPED,
    }
}

/// Resolve a declared return type; absence (or `void`) means the function
/// returns nothing
#[must_use]
pub fn resolve_return_type(name: Option<&Identifier>) -> ResolvedType {
    match name.map(Identifier::as_str) {
        None | Some("void") => ResolvedType::VOID,
        Some(_) => resolve_type(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> ResolvedType {
        resolve_type(Some(&Identifier::new(name)))
    }

    #[test]
    fn test_known_names() {
        assert_eq!(resolve("int").ir, IrType::I64);
        assert_eq!(resolve("int").tag, TypeTag::Integer);
        assert_eq!(resolve("double"), resolve("float"));
        assert_eq!(resolve("float").ir, IrType::F64);
        assert_eq!(resolve("string").ir, IrType::Ptr);
        assert_eq!(resolve("string").tag, TypeTag::String);
    }

    #[test]
    fn test_unknown_and_absent_names_are_untyped() {
        assert_eq!(resolve("vec3"), ResolvedType::UNTYPED);
        assert_eq!(resolve("void"), ResolvedType::UNTYPED);
        assert_eq!(resolve_type(None), ResolvedType::UNTYPED);
    }

    #[test]
    fn test_return_types() {
        assert_eq!(resolve_return_type(None), ResolvedType::VOID);
        assert_eq!(
            resolve_return_type(Some(&Identifier::new("void"))),
            ResolvedType::VOID
        );
        assert_eq!(
            resolve_return_type(Some(&Identifier::new("int"))).ir,
            IrType::I64
        );
    }
}
