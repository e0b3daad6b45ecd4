//! Read-only index over a validated GraphQL schema.
//!
//! The index is built once per generation run and shared by every
//! normalization afterwards; all lookups are pure.

use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Serialize;

use crate::document::OperationKind;
use crate::error::TypeModelError;

/// The kind of a schema type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

impl TypeKind {
    /// Object, interface and union types can carry a selection set.
    pub fn is_composite(self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    /// Abstract types resolve to a concrete object type per response instance.
    pub fn is_abstract(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }

    /// Leaf types terminate a selection path.
    pub fn is_leaf(self) -> bool {
        matches!(self, TypeKind::Enum | TypeKind::Scalar)
    }
}

/// A single list/non-null layer of a wrapped type reference, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeWrapper {
    NonNull,
    List,
}

/// A reference to a schema type together with its list/nullability wrapping,
/// e.g. `[Episode!]!` is base `Episode` with wrappers `[NonNull, List, NonNull]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WrappedTypeRef {
    pub base: Name,
    /// Outermost wrapper first. A leading `NonNull` applies to the whole value.
    pub wrappers: Vec<TypeWrapper>,
}

impl WrappedTypeRef {
    pub(crate) fn from_ast(ty: &ast::Type) -> Self {
        let mut wrappers = Vec::new();
        let mut current = ty;
        let base = loop {
            match current {
                ast::Type::Named(name) => break name.clone(),
                ast::Type::NonNullNamed(name) => {
                    wrappers.push(TypeWrapper::NonNull);
                    break name.clone();
                }
                ast::Type::List(inner) => {
                    wrappers.push(TypeWrapper::List);
                    current = inner;
                }
                ast::Type::NonNullList(inner) => {
                    wrappers.push(TypeWrapper::NonNull);
                    wrappers.push(TypeWrapper::List);
                    current = inner;
                }
            }
        };
        Self { base, wrappers }
    }

    /// A bare non-null reference to `base`, used for implicit `__typename`.
    pub(crate) fn required(base: Name) -> Self {
        Self {
            base,
            wrappers: vec![TypeWrapper::NonNull],
        }
    }

    pub fn list_depth(&self) -> usize {
        self.wrappers
            .iter()
            .filter(|wrapper| matches!(wrapper, TypeWrapper::List))
            .count()
    }

    /// Whether the outermost layer is non-null.
    pub fn is_required(&self) -> bool {
        matches!(self.wrappers.first(), Some(TypeWrapper::NonNull))
    }
}

impl std::fmt::Display for WrappedTypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_layers(
            f: &mut std::fmt::Formatter<'_>,
            base: &Name,
            wrappers: &[TypeWrapper],
        ) -> std::fmt::Result {
            match wrappers.split_first() {
                None => write!(f, "{base}"),
                Some((TypeWrapper::NonNull, rest)) => {
                    write_layers(f, base, rest)?;
                    write!(f, "!")
                }
                Some((TypeWrapper::List, rest)) => {
                    write!(f, "[")?;
                    write_layers(f, base, rest)?;
                    write!(f, "]")
                }
            }
        }
        write_layers(f, &self.base, &self.wrappers)
    }
}

/// An argument accepted by a field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentDescriptor {
    pub name: Name,
    pub ty: WrappedTypeRef,
}

/// A field definition on an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: Name,
    pub arguments: Vec<ArgumentDescriptor>,
    pub ty: WrappedTypeRef,
}

/// An immutable descriptor of one schema type.
///
/// `fields` is populated for object/interface types only; `possible_types`
/// for interface/union types only (implementing objects for interfaces,
/// members for unions, in schema order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTypeDescriptor {
    pub name: Name,
    pub kind: TypeKind,
    fields: IndexMap<Name, FieldDescriptor>,
    possible_types: IndexSet<Name>,
}

impl SchemaTypeDescriptor {
    pub fn field(&self, name: &Name) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn possible_types(&self) -> &IndexSet<Name> {
        &self.possible_types
    }
}

/// A read-only lookup over every type in a validated schema, plus the root
/// operation type names. Never changes after construction.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    types: IndexMap<Name, SchemaTypeDescriptor>,
    query_type: Name,
    mutation_type: Option<Name>,
    subscription_type: Option<Name>,
}

impl SchemaIndex {
    /// Indexes every type of the given schema.
    ///
    /// # Errors
    /// Returns an error if the schema defines no query root type. Failure
    /// here aborts the whole generation run since no document can be
    /// processed without a schema index.
    pub fn new(schema: &Valid<Schema>) -> Result<Self, TypeModelError> {
        let implementers = schema.implementers_map();
        let mut types = IndexMap::new();
        for (name, extended_type) in schema.types.iter() {
            let descriptor = match extended_type {
                ExtendedType::Object(object) => SchemaTypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Object,
                    fields: field_descriptors(object.fields.iter()),
                    possible_types: IndexSet::new(),
                },
                ExtendedType::Interface(interface) => SchemaTypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Interface,
                    fields: field_descriptors(interface.fields.iter()),
                    possible_types: implementers
                        .get(name)
                        .map(|types| types.objects.iter().cloned().collect())
                        .unwrap_or_default(),
                },
                ExtendedType::Union(union_) => SchemaTypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Union,
                    fields: IndexMap::new(),
                    possible_types: union_
                        .members
                        .iter()
                        .map(|member| member.name.clone())
                        .collect(),
                },
                ExtendedType::Enum(_) => leaf_descriptor(name.clone(), TypeKind::Enum),
                ExtendedType::Scalar(_) => leaf_descriptor(name.clone(), TypeKind::Scalar),
                ExtendedType::InputObject(_) => {
                    leaf_descriptor(name.clone(), TypeKind::InputObject)
                }
            };
            types.insert(name.clone(), descriptor);
        }
        let query_type = schema
            .root_operation(ast::OperationType::Query)
            .cloned()
            .ok_or_else(|| TypeModelError::internal("schema defines no query root type"))?;
        Ok(Self {
            types,
            query_type,
            mutation_type: schema
                .root_operation(ast::OperationType::Mutation)
                .cloned(),
            subscription_type: schema
                .root_operation(ast::OperationType::Subscription)
                .cloned(),
        })
    }

    /// Looks up a type descriptor by name.
    pub fn resolve(&self, name: &Name) -> Result<&SchemaTypeDescriptor, TypeModelError> {
        self.types
            .get(name)
            .ok_or_else(|| TypeModelError::UnknownType { name: name.clone() })
    }

    /// Looks up a field definition on an object or interface type.
    pub fn field_of(
        &self,
        type_name: &Name,
        field_name: &Name,
    ) -> Result<&FieldDescriptor, TypeModelError> {
        self.resolve(type_name)?.field(field_name).ok_or_else(|| {
            TypeModelError::UnknownField {
                type_name: type_name.clone(),
                field_name: field_name.clone(),
            }
        })
    }

    /// The set of concrete object types an abstract type may resolve to.
    /// Empty for non-abstract types.
    pub fn possible_types_of(&self, name: &Name) -> Result<&IndexSet<Name>, TypeModelError> {
        Ok(self.resolve(name)?.possible_types())
    }

    /// The root type name serving the given operation kind, if the schema
    /// defines one.
    pub fn root_operation(&self, kind: OperationKind) -> Option<&Name> {
        match kind {
            OperationKind::Query => Some(&self.query_type),
            OperationKind::Mutation => self.mutation_type.as_ref(),
            OperationKind::Subscription => self.subscription_type.as_ref(),
        }
    }
}

fn leaf_descriptor(name: Name, kind: TypeKind) -> SchemaTypeDescriptor {
    SchemaTypeDescriptor {
        name,
        kind,
        fields: IndexMap::new(),
        possible_types: IndexSet::new(),
    }
}

fn field_descriptors<'a>(
    fields: impl Iterator<Item = (&'a Name, &'a apollo_compiler::schema::Component<ast::FieldDefinition>)>,
) -> IndexMap<Name, FieldDescriptor> {
    fields
        .map(|(name, definition)| {
            (
                name.clone(),
                FieldDescriptor {
                    name: name.clone(),
                    arguments: definition
                        .arguments
                        .iter()
                        .map(|argument| ArgumentDescriptor {
                            name: argument.name.clone(),
                            ty: WrappedTypeRef::from_ast(&argument.ty),
                        })
                        .collect(),
                    ty: WrappedTypeRef::from_ast(&definition.ty),
                },
            )
        })
        .collect()
}
