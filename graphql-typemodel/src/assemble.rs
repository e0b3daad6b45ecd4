//! Assembly of the final model: walks documents in input order, normalizes
//! each root, names every reachable entity and flattens the result into one
//! ordered entity list.
//!
//! Failures below the schema level never abort the run. Each failing root is
//! recorded as a [`Diagnostic`] and skipped, so one malformed operation does
//! not block generation for the rest of a large document set.

use apollo_compiler::Name;
use indexmap::IndexSet;
use tracing::debug;

use crate::document::Document;
use crate::document::OperationVariable;
use crate::document::RootDefinition;
use crate::error::TypeModelError;
use crate::fragments::FragmentRegistry;
use crate::model::BranchRef;
use crate::model::FragmentRef;
use crate::model::ObjectField;
use crate::model::ScalarField;
use crate::model::TypeModelNode;
use crate::naming::AssignedRoot;
use crate::naming::NamingConvention;
use crate::naming::NamingEngine;
use crate::normalize::Normalizer;
use crate::normalize::ShapeNode;
use crate::schema::SchemaIndex;

/// Options recognized by a generation run.
#[derive(Clone)]
pub struct TypeModelConfig {
    /// Case-convention hook applied to every candidate name.
    pub naming_convention: Option<NamingConvention>,
    /// When false, fragment spreads stay references instead of being inlined.
    pub flatten_fragments: bool,
    /// Omits the implicit discriminator from polymorphic branch shapes.
    pub skip_typename_field: bool,
}

impl Default for TypeModelConfig {
    fn default() -> Self {
        Self {
            naming_convention: None,
            flatten_fragments: true,
            skip_typename_field: false,
        }
    }
}

/// One recorded failure. The affected root contributed no entities; the run
/// continued past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Identity of the document the failure belongs to.
    pub document: String,
    /// Declared or assigned name of the root being assembled, when known.
    pub root: Option<String>,
    /// Response-key path from the root to the failing position.
    pub path: Vec<String>,
    pub error: TypeModelError,
}

/// The output of one generation run: every named entity reachable from every
/// successfully assembled root, in deterministic pre-order, plus the
/// diagnostics collected along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeModel {
    pub entities: Vec<TypeModelNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the engine over the given documents.
///
/// The schema index is built by the caller; its construction is the only
/// failure that aborts a whole run, since nothing can be produced without a
/// schema. Everything here is isolated per document.
pub fn assemble(
    schema: &SchemaIndex,
    documents: &[Document],
    config: &TypeModelConfig,
) -> TypeModel {
    let (registry, duplicate_fragments) = FragmentRegistry::build(documents);
    let mut diagnostics: Vec<Diagnostic> = duplicate_fragments
        .into_iter()
        .map(|(index, error)| Diagnostic {
            document: documents[index].name.clone(),
            root: match &error {
                TypeModelError::DuplicateFragmentName { name, .. } => Some(name.to_string()),
                _ => None,
            },
            path: Vec::new(),
            error,
        })
        .collect();

    // every member of a spread cycle is diagnosed once and contributes no
    // entities; roots that spread into a cycle fail individually below
    let mut poisoned: IndexSet<Name> = IndexSet::new();
    for cycle in registry.cycles() {
        let document = cycle
            .first()
            .and_then(|name| registry.document_of(name))
            .unwrap_or_default()
            .to_string();
        diagnostics.push(Diagnostic {
            document,
            root: cycle.first().map(|name| name.to_string()),
            path: Vec::new(),
            error: TypeModelError::FragmentCycle {
                path: cycle.clone(),
            },
        });
        poisoned.extend(cycle);
    }

    let normalizer = Normalizer::new(
        schema,
        &registry,
        config.flatten_fragments,
        config.skip_typename_field,
    );
    let mut engine = NamingEngine::new(config.naming_convention.clone());
    let mut entities = Vec::new();
    let mut assembled_fragments: IndexSet<Name> = IndexSet::new();

    for document in documents {
        debug!(document = %document.name, "assembling document");
        for definition in &document.definitions {
            match definition {
                RootDefinition::Operation(operation) => {
                    let root = match &operation.name {
                        Some(name) => match engine.assign_root(name, &document.name) {
                            Ok(root) => root,
                            Err(error) => {
                                diagnostics.push(Diagnostic {
                                    document: document.name.clone(),
                                    root: Some(name.to_string()),
                                    path: Vec::new(),
                                    error,
                                });
                                continue;
                            }
                        },
                        None => engine.assign_anonymous_root(),
                    };
                    let Some(parent) = schema.root_operation(operation.kind) else {
                        diagnostics.push(Diagnostic {
                            document: document.name.clone(),
                            root: Some(root.name),
                            path: Vec::new(),
                            error: TypeModelError::internal(format!(
                                "schema defines no {} root operation type",
                                operation.kind,
                            )),
                        });
                        continue;
                    };
                    let mut path = Vec::new();
                    match normalizer.normalize(parent, &operation.selection_set, &mut path) {
                        Ok(shape) => flatten_into(
                            &mut engine,
                            root,
                            &shape,
                            operation.variables.clone(),
                            &mut entities,
                        ),
                        Err(error) => diagnostics.push(Diagnostic {
                            document: document.name.clone(),
                            root: Some(root.name),
                            path: path.iter().map(|segment| segment.to_string()).collect(),
                            error,
                        }),
                    }
                }
                RootDefinition::Fragment(fragment) => {
                    if poisoned.contains(&fragment.name) {
                        continue;
                    }
                    // later duplicate definitions were already diagnosed at
                    // registration; only the first one is assembled
                    if !assembled_fragments.insert(fragment.name.clone()) {
                        continue;
                    }
                    let root = match engine.assign_root(&fragment.name, &document.name) {
                        Ok(root) => root,
                        Err(error) => {
                            diagnostics.push(Diagnostic {
                                document: document.name.clone(),
                                root: Some(fragment.name.to_string()),
                                path: Vec::new(),
                                error,
                            });
                            continue;
                        }
                    };
                    let mut path = Vec::new();
                    match normalizer.normalize(
                        &fragment.type_condition,
                        &fragment.selection_set,
                        &mut path,
                    ) {
                        Ok(shape) => {
                            flatten_into(&mut engine, root, &shape, Vec::new(), &mut entities);
                        }
                        Err(error) => diagnostics.push(Diagnostic {
                            document: document.name.clone(),
                            root: Some(root.name),
                            path: path.iter().map(|segment| segment.to_string()).collect(),
                            error,
                        }),
                    }
                }
            }
        }
    }

    TypeModel {
        entities,
        diagnostics,
    }
}

/// Emits one root shape and every reachable child as named entities, in
/// pre-order with object fields ahead of branches. Child candidate names
/// come from the response-key path rooted at the entity name.
fn flatten_into(
    engine: &mut NamingEngine,
    root: AssignedRoot,
    shape: &ShapeNode,
    variables: Vec<OperationVariable>,
    entities: &mut Vec<TypeModelNode>,
) {
    let mut segments = vec![root.candidate];
    flatten_node(engine, root.name, &mut segments, shape, variables, entities);
}

fn flatten_node(
    engine: &mut NamingEngine,
    name: String,
    segments: &mut Vec<String>,
    shape: &ShapeNode,
    variables: Vec<OperationVariable>,
    entities: &mut Vec<TypeModelNode>,
) {
    let mut scalar_fields = Vec::new();
    let mut object_fields = Vec::new();
    let mut branch_refs = Vec::new();
    let mut children: Vec<(String, String, &ShapeNode)> = Vec::new();

    for field in &shape.fields {
        match &field.selection {
            None => scalar_fields.push(ScalarField {
                response_key: field.response_key.clone(),
                field_name: field.field_name.clone(),
                ty: field.ty.clone(),
            }),
            Some(child) => {
                let segment = field.response_key.to_string();
                let node_name = assign_child(engine, segments, &segment);
                object_fields.push(ObjectField {
                    response_key: field.response_key.clone(),
                    field_name: field.field_name.clone(),
                    ty: field.ty.clone(),
                    node_name: node_name.clone(),
                });
                children.push((node_name, segment, child));
            }
        }
    }
    for branch in &shape.branches {
        let segment = branch.type_condition.to_string();
        let node_name = assign_child(engine, segments, &segment);
        branch_refs.push(BranchRef {
            type_condition: branch.type_condition.clone(),
            node_name: node_name.clone(),
        });
        children.push((node_name, segment, &branch.shape));
    }

    entities.push(TypeModelNode {
        name,
        schema_type: shape.schema_type.clone(),
        scalar_fields,
        object_fields,
        branches: branch_refs,
        fragment_refs: shape
            .fragment_refs
            .iter()
            .map(|fragment_name| FragmentRef {
                fragment_name: fragment_name.clone(),
            })
            .collect(),
        variables,
    });

    for (node_name, segment, child) in children {
        segments.push(segment);
        flatten_node(engine, node_name, segments, child, Vec::new(), entities);
        segments.pop();
    }
}

fn assign_child(engine: &mut NamingEngine, segments: &[String], segment: &str) -> String {
    let mut candidate: Vec<&str> = segments.iter().map(String::as_str).collect();
    candidate.push(segment);
    engine.assign_nested(&candidate)
}
