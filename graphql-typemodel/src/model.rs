//! The output data model: named structural entities describing the shape of
//! response data, one per object-valued position of an operation or fragment.

use apollo_compiler::Name;
use serde::Serialize;

use crate::document::OperationVariable;
use crate::schema::WrappedTypeRef;

/// A leaf field of an entity: enum- or scalar-typed, no child entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalarField {
    /// The key this field occupies in the response object (alias-aware).
    pub response_key: Name,
    /// The schema field the key maps to.
    pub field_name: Name,
    pub ty: WrappedTypeRef,
}

/// A composite field of an entity. The child entity is referenced by its
/// assigned name; the wrapped type carries list depth and nullability while
/// the child carries the structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectField {
    pub response_key: Name,
    pub field_name: Name,
    pub ty: WrappedTypeRef,
    /// Name of the child entity in [`TypeModel::entities`].
    pub node_name: String,
}

/// One concrete narrowing of a polymorphic entity. The referenced entity
/// holds the shared fields merged with the branch-specific ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRef {
    /// The concrete object type this branch applies to.
    pub type_condition: Name,
    /// Name of the branch entity in [`TypeModel::entities`].
    pub node_name: String,
}

/// A named fragment kept as a reference instead of being inlined
/// (`flatten_fragments = false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentRef {
    pub fragment_name: Name,
}

/// One named entity of the output model.
///
/// Roots additionally carry the operation's variables; nested entities leave
/// `variables` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeModelNode {
    /// Globally unique assigned name.
    pub name: String,
    /// The schema type the entity's selections were validated against.
    pub schema_type: Name,
    pub scalar_fields: Vec<ScalarField>,
    pub object_fields: Vec<ObjectField>,
    pub branches: Vec<BranchRef>,
    pub fragment_refs: Vec<FragmentRef>,
    pub variables: Vec<OperationVariable>,
}
