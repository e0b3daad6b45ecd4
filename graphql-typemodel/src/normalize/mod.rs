//! Normalization of selection sets into merged structural shapes.
//!
//! This is the central algorithm: given a parent schema type and a selection
//! set, produce one unnamed shape describing the merged response structure,
//! with fragment spreads flattened, same-response-key selections merged, and
//! polymorphic narrowings separated into per-concrete-type branches.
//!
//! A level is normalized from a list of *contributions*, each a selection set
//! together with the set of fragments open on the path that produced it.
//! Merging a response key unions the contributions of every occurrence, so a
//! nested level sees exactly the selections that can reach it and the cycle
//! guard stays scoped to real expansion paths.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::trace;

use crate::document::FieldNode;
use crate::document::SelectionNode;
use crate::error::TypeModelError;
use crate::fragments::FragmentRegistry;
use crate::schema::SchemaIndex;
use crate::schema::SchemaTypeDescriptor;
use crate::schema::WrappedTypeRef;


pub(crate) const TYPENAME_FIELD: Name = name!("__typename");

/// The merged, still unnamed shape of one object-valued position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeNode {
    pub schema_type: Name,
    /// Scalar and composite fields interleaved in first-occurrence order.
    pub fields: Vec<FieldShape>,
    pub branches: Vec<BranchShape>,
    /// Spreads kept as references when flattening is off, in spread order.
    pub fragment_refs: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub response_key: Name,
    pub field_name: Name,
    pub ty: WrappedTypeRef,
    /// `Some` for composite fields, `None` for enum/scalar leaves.
    pub selection: Option<ShapeNode>,
}

/// One concrete narrowing of a polymorphic shape; `shape` already contains
/// the shared fields merged with the branch-specific ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchShape {
    pub type_condition: Name,
    pub shape: ShapeNode,
}

/// One selection set entering a normalization level, with the fragments that
/// were open on the expansion path that produced it.
#[derive(Clone)]
struct Contribution<'a> {
    selections: &'a [SelectionNode],
    active: IndexSet<Name>,
}

struct CollectedField<'a> {
    node: &'a FieldNode,
    active: IndexSet<Name>,
    /// Type whose definition governs the field lookup. Differs from the
    /// parent inside a widening condition: `... on Node { uid }` under a
    /// parent that does not declare `uid` must resolve against `Node`.
    scope: Name,
}

#[derive(Default)]
struct Collected<'a> {
    fields: Vec<CollectedField<'a>>,
    /// Concrete types with at least one narrowing, in first-occurrence order.
    branch_types: IndexSet<Name>,
    fragment_refs: IndexSet<Name>,
}

enum Classification {
    /// The condition covers every possible type of the parent.
    Shared,
    /// The condition narrows; one branch per listed concrete type.
    Branches(Vec<Name>),
    /// The condition cannot apply to the parent; contributes nothing.
    Unreachable,
}

struct MergedField<'a> {
    field_name: Name,
    first: &'a FieldNode,
    ty: WrappedTypeRef,
    composite: bool,
    contributions: Vec<Contribution<'a>>,
}

pub struct Normalizer<'a> {
    schema: &'a SchemaIndex,
    fragments: &'a FragmentRegistry,
    flatten_fragments: bool,
    skip_typename_field: bool,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        schema: &'a SchemaIndex,
        fragments: &'a FragmentRegistry,
        flatten_fragments: bool,
        skip_typename_field: bool,
    ) -> Self {
        Self {
            schema,
            fragments,
            flatten_fragments,
            skip_typename_field,
        }
    }

    /// Normalizes one operation or fragment selection set against its parent
    /// type.
    ///
    /// `path` accumulates the response keys and branch type names leading to
    /// the position currently being normalized. On success it is restored to
    /// its input state; on error it is left pointing at the failing position
    /// so the caller can attach it to a diagnostic.
    pub fn normalize(
        &self,
        parent: &Name,
        selection_set: &'a [SelectionNode],
        path: &mut Vec<Name>,
    ) -> Result<ShapeNode, TypeModelError> {
        trace!(parent = %parent, "normalizing selection set");
        self.normalize_level(
            parent,
            vec![Contribution {
                selections: selection_set,
                active: IndexSet::new(),
            }],
            path,
        )
    }

    fn normalize_level(
        &self,
        parent_name: &Name,
        contributions: Vec<Contribution<'a>>,
        path: &mut Vec<Name>,
    ) -> Result<ShapeNode, TypeModelError> {
        let parent = self.schema.resolve(parent_name)?;

        let mut collected = Collected::default();
        let mut inlined = IndexSet::new();
        for contribution in &contributions {
            let mut active = contribution.active.clone();
            self.collect(
                parent,
                &parent.name,
                contribution.selections,
                &mut active,
                &mut inlined,
                &mut collected,
            )?;
        }

        let merged = self.merge_fields(collected.fields)?;

        let mut fields = Vec::with_capacity(merged.len());
        for (response_key, entry) in merged {
            let selection = if entry.composite {
                let base = entry.ty.base.clone();
                path.push(response_key.clone());
                let child = self.normalize_level(&base, entry.contributions, path)?;
                path.pop();
                Some(child)
            } else {
                None
            };
            fields.push(FieldShape {
                response_key,
                field_name: entry.field_name,
                ty: entry.ty,
                selection,
            });
        }

        let mut branches = Vec::with_capacity(collected.branch_types.len());
        for type_condition in collected.branch_types {
            path.push(type_condition.clone());
            let mut shape = self.normalize_level(&type_condition, contributions.clone(), path)?;
            path.pop();
            if !self.skip_typename_field {
                prepend_typename(&mut shape);
            }
            branches.push(BranchShape {
                type_condition,
                shape,
            });
        }

        Ok(ShapeNode {
            schema_type: parent.name.clone(),
            fields,
            branches,
            fragment_refs: collected.fragment_refs.into_iter().collect(),
        })
    }

    /// Walks one level of selections, inlining shared fragments in place and
    /// recording narrowing conditions as branch types. Branch selections are
    /// not resolved here: each branch re-normalizes the whole level against
    /// its concrete type, which folds shared conditions back in and drops
    /// conditions for other concrete types.
    fn collect(
        &self,
        parent: &SchemaTypeDescriptor,
        scope: &Name,
        selections: &'a [SelectionNode],
        active: &mut IndexSet<Name>,
        inlined: &mut IndexSet<Name>,
        out: &mut Collected<'a>,
    ) -> Result<(), TypeModelError> {
        for selection in selections {
            match selection {
                SelectionNode::Field(field) => out.fields.push(CollectedField {
                    node: field,
                    active: active.clone(),
                    scope: scope.clone(),
                }),
                SelectionNode::FragmentSpread(spread) => {
                    let name = &spread.fragment_name;
                    let fragment = self.fragments.lookup(name)?;
                    if !self.flatten_fragments {
                        out.fragment_refs.insert(name.clone());
                        continue;
                    }
                    match self.classify(parent, &fragment.type_condition)? {
                        Classification::Shared => {
                            // registry acyclicity is checked up front; this
                            // re-check keeps a bypassed cycle from recursing
                            // unboundedly
                            if let Some(position) = active.get_index_of(name) {
                                let mut cycle: Vec<Name> =
                                    active.iter().skip(position).cloned().collect();
                                cycle.push(name.clone());
                                return Err(TypeModelError::FragmentCycle { path: cycle });
                            }
                            if !inlined.insert(name.clone()) {
                                continue;
                            }
                            active.insert(name.clone());
                            self.collect(
                                parent,
                                &fragment.type_condition,
                                &fragment.selection_set,
                                active,
                                inlined,
                                out,
                            )?;
                            active.pop();
                        }
                        Classification::Branches(types) => out.branch_types.extend(types),
                        Classification::Unreachable => {}
                    }
                }
                SelectionNode::InlineFragment(inline) => {
                    let Some(condition) = &inline.type_condition else {
                        self.collect(parent, scope, &inline.selection_set, active, inlined, out)?;
                        continue;
                    };
                    match self.classify(parent, condition)? {
                        Classification::Shared => {
                            self.collect(
                                parent,
                                condition,
                                &inline.selection_set,
                                active,
                                inlined,
                                out,
                            )?;
                        }
                        Classification::Branches(types) => out.branch_types.extend(types),
                        Classification::Unreachable => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Relates a type condition to the parent type. Equal or wider
    /// conditions are shared; a narrower condition yields one branch per
    /// concrete type in the overlap of the possible-type sets, in the
    /// parent's possible-type order.
    fn classify(
        &self,
        parent: &SchemaTypeDescriptor,
        condition: &Name,
    ) -> Result<Classification, TypeModelError> {
        if *condition == parent.name {
            return Ok(Classification::Shared);
        }
        let target = self.schema.resolve(condition)?;
        if !parent.kind.is_abstract() {
            return Ok(
                if target.kind.is_abstract() && target.possible_types().contains(&parent.name) {
                    Classification::Shared
                } else {
                    Classification::Unreachable
                },
            );
        }
        let parent_possible = parent.possible_types();
        if target.kind.is_abstract() {
            let target_possible = target.possible_types();
            if parent_possible.is_subset(target_possible) {
                return Ok(Classification::Shared);
            }
            let overlap: Vec<Name> = parent_possible
                .iter()
                .filter(|possible| target_possible.contains(*possible))
                .cloned()
                .collect();
            return Ok(Classification::Branches(overlap));
        }
        Ok(if parent_possible.contains(condition) {
            Classification::Branches(vec![condition.clone()])
        } else {
            Classification::Unreachable
        })
    }

    /// Groups collected fields by response key in first-occurrence order and
    /// checks static compatibility within each group. Merging is additive on
    /// nested selections; the field definition is resolved once per group.
    fn merge_fields(
        &self,
        fields: Vec<CollectedField<'a>>,
    ) -> Result<IndexMap<Name, MergedField<'a>>, TypeModelError> {
        let mut merged: IndexMap<Name, MergedField<'a>> = IndexMap::new();
        for CollectedField {
            node,
            active,
            scope,
        } in fields
        {
            let response_key = node.response_key().clone();
            match merged.entry(response_key) {
                indexmap::map::Entry::Occupied(mut entry) => {
                    let key = entry.key().clone();
                    let existing = entry.get_mut();
                    if existing.field_name != node.name {
                        return Err(TypeModelError::FieldMergeConflict {
                            response_key: key,
                            message: format!(
                                r#"field "{}" conflicts with field "{}""#,
                                existing.field_name, node.name,
                            ),
                        });
                    }
                    if !same_arguments(&existing.first.arguments, &node.arguments) {
                        return Err(TypeModelError::FieldMergeConflict {
                            response_key: key,
                            message: format!(
                                r#"selections of field "{}" have differing arguments"#,
                                existing.field_name,
                            ),
                        });
                    }
                    if existing.composite && !node.selection_set.is_empty() {
                        existing.contributions.push(Contribution {
                            selections: &node.selection_set,
                            active,
                        });
                    }
                }
                indexmap::map::Entry::Vacant(entry) => {
                    let (ty, composite) = if node.name == TYPENAME_FIELD {
                        (WrappedTypeRef::required(name!("String")), false)
                    } else {
                        let descriptor = self.schema.field_of(&scope, &node.name)?;
                        let base_kind = self.schema.resolve(&descriptor.ty.base)?.kind;
                        (descriptor.ty.clone(), base_kind.is_composite())
                    };
                    let contributions = if composite && !node.selection_set.is_empty() {
                        vec![Contribution {
                            selections: &node.selection_set,
                            active,
                        }]
                    } else {
                        Vec::new()
                    };
                    entry.insert(MergedField {
                        field_name: node.name.clone(),
                        first: node,
                        ty,
                        composite,
                        contributions,
                    });
                }
            }
        }
        Ok(merged)
    }
}

/// Adds the implicit discriminator to a branch shape unless the selection
/// already asked for it under its own key.
fn prepend_typename(shape: &mut ShapeNode) {
    let queried = shape
        .fields
        .iter()
        .any(|field| field.response_key == TYPENAME_FIELD);
    if queried {
        return;
    }
    shape.fields.insert(
        0,
        FieldShape {
            response_key: TYPENAME_FIELD,
            field_name: TYPENAME_FIELD,
            ty: WrappedTypeRef::required(name!("String")),
            selection: None,
        },
    );
}

/// Order-independent comparison of two argument lists.
fn same_arguments(a: &[Node<ast::Argument>], b: &[Node<ast::Argument>]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let by_name: IndexMap<&Name, &Node<ast::Value>> =
        a.iter().map(|argument| (&argument.name, &argument.value)).collect();
    b.iter().all(|argument| {
        by_name
            .get(&argument.name)
            .is_some_and(|value| same_value(value, &argument.value))
    })
}

fn same_value(a: &ast::Value, b: &ast::Value) -> bool {
    match (a, b) {
        (ast::Value::Null, ast::Value::Null) => true,
        (ast::Value::Enum(x), ast::Value::Enum(y)) => x == y,
        (ast::Value::Variable(x), ast::Value::Variable(y)) => x == y,
        (ast::Value::String(x), ast::Value::String(y)) => x == y,
        (ast::Value::Float(x), ast::Value::Float(y)) => x == y,
        (ast::Value::Int(x), ast::Value::Int(y)) => x == y,
        (ast::Value::Boolean(x), ast::Value::Boolean(y)) => x == y,
        (ast::Value::List(x), ast::Value::List(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|(xv, yv)| same_value(xv, yv))
        }
        (ast::Value::Object(x), ast::Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(name, xv)| {
                    y.iter()
                        .find(|(other, _)| other == name)
                        .is_some_and(|(_, yv)| same_value(xv, yv))
                })
        }
        _ => false,
    }
}
