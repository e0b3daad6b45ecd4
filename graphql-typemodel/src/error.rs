use apollo_compiler::Name;
use itertools::Itertools;

/// Returns an [`TypeModelError::Internal`] error from the enclosing function.
///
/// Useful for bailing out of invariant violations that validated input should
/// never reach.
#[macro_export]
macro_rules! bail {
    ( $( $arg:tt )+ ) => {
        return Err($crate::error::TypeModelError::internal(format!( $( $arg )+ )).into())
    };
}

/// Returns an internal error from the enclosing function if the given
/// condition does not hold.
#[macro_export]
macro_rules! ensure {
    ( $expr:expr, $( $arg:tt )+ ) => {
        if !$expr {
            $crate::bail!( $( $arg )+ );
        }
    };
}

/// Errors raised while building a type model.
///
/// Per-document errors (`UnknownType`, `UnknownField`, `UnknownFragment`,
/// `FieldMergeConflict`) abort the owning document only; the assembler
/// records them as diagnostics and continues with the next document.
/// Naming collisions are never errors: the naming engine resolves them
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeModelError {
    #[error(r#"Unknown type "{name}""#)]
    UnknownType { name: Name },
    #[error(r#"Type "{type_name}" has no field "{field_name}""#)]
    UnknownField { type_name: Name, field_name: Name },
    #[error(r#"Unknown fragment "{name}""#)]
    UnknownFragment { name: Name },
    #[error(
        r#"Fragment "{name}" in document "{second_document}" is already defined in document "{first_document}""#
    )]
    DuplicateFragmentName {
        name: Name,
        first_document: String,
        second_document: String,
    },
    #[error(
        r#"Operation or fragment "{name}" in document "{second_document}" is already defined in document "{first_document}""#
    )]
    DuplicateRootName {
        name: String,
        first_document: String,
        second_document: String,
    },
    #[error("Fragment cycle: {}", .path.iter().join(" -> "))]
    FragmentCycle { path: Vec<Name> },
    #[error(r#"Cannot merge selections under response key "{response_key}": {message}"#)]
    FieldMergeConflict { response_key: Name, message: String },
    #[error("{message}")]
    Internal { message: String },
}

impl TypeModelError {
    pub fn internal(message: impl Into<String>) -> Self {
        TypeModelError::Internal {
            message: message.into(),
        }
    }
}
