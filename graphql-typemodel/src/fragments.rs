//! Registry of named fragment definitions and their spread dependencies.
//!
//! Fragments are addressed by name; the registry owns every definition and
//! spreads only ever reference them. The spread dependency graph must be
//! acyclic: construction of a resolution order fails closed with the full
//! cycle rather than truncating it.

use std::sync::Arc;

use apollo_compiler::Name;
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;

use crate::document::Document;
use crate::document::FragmentDefinition;
use crate::document::RootDefinition;
use crate::document::SelectionNode;
use crate::error::TypeModelError;

struct FragmentRecord {
    definition: Arc<FragmentDefinition>,
    /// Identity of the document that defined this fragment, for diagnostics.
    document: String,
}

/// All named fragments of a generation run, keyed by name in registration
/// order. Immutable once built; shared read-only with every normalization.
#[derive(Default)]
pub struct FragmentRegistry {
    fragments: IndexMap<Name, FragmentRecord>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every fragment across the given documents in input order.
    /// Later definitions of an already-registered name are reported as
    /// diagnostics (paired with the index of the offending document) while
    /// the first definition stays authoritative.
    pub fn build(documents: &[Document]) -> (Self, Vec<(usize, TypeModelError)>) {
        let mut registry = Self::new();
        let mut errors = Vec::new();
        for (index, document) in documents.iter().enumerate() {
            for definition in &document.definitions {
                if let RootDefinition::Fragment(fragment) = definition {
                    if let Err(error) = registry.register(fragment.clone(), &document.name) {
                        errors.push((index, error));
                    }
                }
            }
        }
        (registry, errors)
    }

    /// Registers one fragment definition.
    ///
    /// # Errors
    /// Returns `DuplicateFragmentName` carrying both document identities if a
    /// fragment with the same name is already registered.
    pub fn register(
        &mut self,
        fragment: FragmentDefinition,
        document: impl Into<String>,
    ) -> Result<(), TypeModelError> {
        let document = document.into();
        match self.fragments.entry(fragment.name.clone()) {
            indexmap::map::Entry::Occupied(entry) => Err(TypeModelError::DuplicateFragmentName {
                name: fragment.name,
                first_document: entry.get().document.clone(),
                second_document: document,
            }),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(FragmentRecord {
                    definition: Arc::new(fragment),
                    document,
                });
                Ok(())
            }
        }
    }

    /// Looks up a fragment referenced by a spread.
    pub fn lookup(&self, name: &Name) -> Result<&FragmentDefinition, TypeModelError> {
        self.fragments
            .get(name)
            .map(|record| record.definition.as_ref())
            .ok_or_else(|| TypeModelError::UnknownFragment { name: name.clone() })
    }

    /// Identity of the document that defined the given fragment.
    pub(crate) fn document_of(&self, name: &Name) -> Option<&str> {
        self.fragments
            .get(name)
            .map(|record| record.document.as_str())
    }

    /// Returns every registered fragment name in an order where dependencies
    /// come before their dependents (fragments with no spreads first).
    ///
    /// # Errors
    /// Returns `FragmentCycle` with the full ordered cycle if the spread
    /// dependency graph is not acyclic.
    pub fn resolution_order(&self) -> Result<Vec<Name>, TypeModelError> {
        let graph = self.dependency_graph();
        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|index| graph[index].clone()).collect()),
            Err(_) => {
                let Some(cycle) = self.cycles().into_iter().next() else {
                    crate::bail!("fragment graph failed to sort but has no cycle");
                };
                Err(TypeModelError::FragmentCycle { path: cycle })
            }
        }
    }

    /// Every cyclic strongly-connected component of the spread graph, each
    /// reported as the ordered list of fragment names forming the cycle.
    pub(crate) fn cycles(&self) -> Vec<Vec<Name>> {
        let graph = self.dependency_graph();
        let mut cycles: Vec<Vec<Name>> = Vec::new();
        for component in tarjan_scc(&graph) {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&index| graph.contains_edge(index, index));
            if is_cycle {
                let mut members: Vec<NodeIndex> = component;
                // tarjan's member order is algorithm-defined; registration
                // order keeps the report deterministic
                members.sort_unstable();
                cycles.push(
                    members
                        .into_iter()
                        .map(|index| graph[index].clone())
                        .collect(),
                );
            }
        }
        // components come out in reverse topological order; registration
        // order of the first member keeps the diagnostics stable
        cycles.sort_by_key(|cycle| {
            cycle
                .first()
                .and_then(|name| self.fragments.get_index_of(name))
        });
        cycles
    }

    /// Edge direction is dependency -> dependent, so a topological sort
    /// yields spread-free fragments first.
    fn dependency_graph(&self) -> DiGraph<Name, ()> {
        let mut graph = DiGraph::new();
        let mut nodes: IndexMap<Name, NodeIndex> = IndexMap::new();
        for name in self.fragments.keys() {
            let index = graph.add_node(name.clone());
            nodes.insert(name.clone(), index);
        }
        for (name, record) in &self.fragments {
            let dependent = nodes[name];
            let mut spreads = Vec::new();
            collect_spreads(&record.definition.selection_set, &mut spreads);
            for spread in spreads {
                // spreads of unregistered fragments surface later as
                // UnknownFragment during normalization
                if let Some(&dependency) = nodes.get(&spread) {
                    if !graph.contains_edge(dependency, dependent) {
                        graph.add_edge(dependency, dependent, ());
                    }
                }
            }
        }
        graph
    }
}

fn collect_spreads(selection_set: &[SelectionNode], out: &mut Vec<Name>) {
    for selection in selection_set {
        match selection {
            SelectionNode::Field(field) => collect_spreads(&field.selection_set, out),
            SelectionNode::FragmentSpread(spread) => out.push(spread.fragment_name.clone()),
            SelectionNode::InlineFragment(inline) => {
                collect_spreads(&inline.selection_set, out)
            }
        }
    }
}
