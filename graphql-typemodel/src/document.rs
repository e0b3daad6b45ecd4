//! Input documents: parsed, schema-validated operation and fragment
//! definitions, converted into owned selection trees.
//!
//! Parsing and GraphQL validation are external concerns. The conversion from
//! [`apollo_compiler::ast`] deliberately goes through the AST rather than the
//! executable document so that duplicate fragment definitions survive long
//! enough for the fragment registry to diagnose them.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use serde::Serialize;

use crate::schema::WrappedTypeRef;

/// One input document: an ordered list of operation and fragment definitions
/// plus an identity used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub definitions: Vec<RootDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootDefinition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum OperationKind {
    #[strum(to_string = "query")]
    Query,
    #[strum(to_string = "mutation")]
    Mutation,
    #[strum(to_string = "subscription")]
    Subscription,
}

impl From<ast::OperationType> for OperationKind {
    fn from(value: ast::OperationType) -> Self {
        match value {
            ast::OperationType::Query => OperationKind::Query,
            ast::OperationType::Mutation => OperationKind::Mutation,
            ast::OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<Name>,
    pub variables: Vec<OperationVariable>,
    pub selection_set: Vec<SelectionNode>,
}

/// A variable declared by an operation, surfaced on its root model entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationVariable {
    pub name: Name,
    pub ty: WrappedTypeRef,
}

/// A named fragment declared `on` a schema type. Owned by the fragment
/// registry once registered; spreads reference it by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub selection_set: Vec<SelectionNode>,
}

/// One entry of a selection set. The set of selection kinds is fixed by the
/// GraphQL data model, so every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionNode {
    Field(FieldNode),
    FragmentSpread(FragmentSpreadNode),
    InlineFragment(InlineFragmentNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Node<ast::Argument>>,
    pub selection_set: Vec<SelectionNode>,
}

impl FieldNode {
    /// The key this field occupies in the response object.
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpreadNode {
    pub fragment_name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFragmentNode {
    pub type_condition: Option<Name>,
    pub selection_set: Vec<SelectionNode>,
}

impl Document {
    /// Converts a parsed AST document, keeping executable definitions in
    /// their original order and ignoring any type system definitions.
    pub fn from_ast(name: impl Into<String>, document: &ast::Document) -> Self {
        let definitions = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::OperationDefinition(operation) => {
                    Some(RootDefinition::Operation(convert_operation(operation)))
                }
                ast::Definition::FragmentDefinition(fragment) => {
                    Some(RootDefinition::Fragment(convert_fragment(fragment)))
                }
                _ => None,
            })
            .collect();
        Self {
            name: name.into(),
            definitions,
        }
    }

    /// Parse a document from a source string.
    #[cfg(any(test, doc))]
    pub fn parse(name: &str, source_text: &str) -> Result<Self, crate::error::TypeModelError> {
        let document = ast::Document::parse(source_text, format!("{name}.graphql"))
            .map_err(|errors| crate::error::TypeModelError::internal(errors.to_string()))?;
        Ok(Self::from_ast(name, &document))
    }
}

fn convert_operation(operation: &Node<ast::OperationDefinition>) -> OperationDefinition {
    OperationDefinition {
        kind: operation.operation_type.into(),
        name: operation.name.clone(),
        variables: operation
            .variables
            .iter()
            .map(|variable| OperationVariable {
                name: variable.name.clone(),
                ty: WrappedTypeRef::from_ast(&variable.ty),
            })
            .collect(),
        selection_set: convert_selection_set(&operation.selection_set),
    }
}

fn convert_fragment(fragment: &Node<ast::FragmentDefinition>) -> FragmentDefinition {
    FragmentDefinition {
        name: fragment.name.clone(),
        type_condition: fragment.type_condition.clone(),
        selection_set: convert_selection_set(&fragment.selection_set),
    }
}

fn convert_selection_set(selection_set: &[ast::Selection]) -> Vec<SelectionNode> {
    selection_set
        .iter()
        .map(|selection| match selection {
            ast::Selection::Field(field) => SelectionNode::Field(FieldNode {
                alias: field.alias.clone(),
                name: field.name.clone(),
                arguments: field.arguments.clone(),
                selection_set: convert_selection_set(&field.selection_set),
            }),
            ast::Selection::FragmentSpread(spread) => {
                SelectionNode::FragmentSpread(FragmentSpreadNode {
                    fragment_name: spread.fragment_name.clone(),
                })
            }
            ast::Selection::InlineFragment(inline) => {
                SelectionNode::InlineFragment(InlineFragmentNode {
                    type_condition: inline.type_condition.clone(),
                    selection_set: convert_selection_set(&inline.selection_set),
                })
            }
        })
        .collect()
}
