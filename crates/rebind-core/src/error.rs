use thiserror::Error;

use crate::property::PropertyId;

pub type Result<T> = std::result::Result<T, BindError>;

/// Rejections reported by the checked binding operations.
///
/// Everything else in the crate is infallible at runtime: incompatible
/// operand or value types fail to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("binding {property} would close a dependency cycle")]
    CircularDependency { property: PropertyId },
}

impl BindError {
    /// The property whose rebinding was rejected.
    #[must_use]
    pub fn property(&self) -> PropertyId {
        match self {
            Self::CircularDependency { property } => *property,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_property() {
        let id = PropertyId::from_raw(42);
        let err = BindError::CircularDependency { property: id };
        assert_eq!(err.to_string(), "binding property#42 would close a dependency cycle");
        assert_eq!(err.property(), id);
    }
}
