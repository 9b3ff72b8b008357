//! Linkage policy

use em_ir::Linkage;

/// Whether a function is visible outside of the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Private to the unit
    Internal,
    /// Exported to the linker
    External,
}

/// Names that are empty or start with `_` are internal; everything else is
/// exported
#[must_use]
pub fn visibility_of(name: &str) -> Visibility {
    if name.is_empty() || name.starts_with('_') {
        Visibility::Internal
    } else {
        Visibility::External
    }
}

impl From<Visibility> for Linkage {
    fn from(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Internal => Self::Internal,
            Visibility::External => Self::External,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        assert_eq!(visibility_of("main"), Visibility::External);
        assert_eq!(visibility_of("_helper"), Visibility::Internal);
        assert_eq!(visibility_of("__main"), Visibility::Internal);
        assert_eq!(visibility_of(""), Visibility::Internal);
        assert_eq!(Linkage::from(visibility_of("add")), Linkage::External);
    }
}
