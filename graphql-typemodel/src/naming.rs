//! Deterministic assignment of globally unique entity names.
//!
//! All naming state is confined to a per-run context owned by the engine, so
//! concurrent runs and repeated runs over the same input cannot observe each
//! other. Collisions are never errors except for duplicate root names, which
//! indicate conflicting declarations across input documents.

use std::sync::Arc;

use itertools::Itertools;

use crate::error::TypeModelError;

/// An injected hook transforming a candidate name before uniqueness checks,
/// e.g. a pascal-case or prefixing convention. `None` keeps candidates as-is.
pub type NamingConvention = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A claimed root name. Nested candidates concatenate onto `candidate`, not
/// onto the final name, so the convention applies to a path exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedRoot {
    /// Final unique entity name.
    pub name: String,
    /// The pre-conversion candidate the root was derived from.
    pub candidate: String,
}

/// Mutable naming state of one generation run.
#[derive(Default)]
struct NamingContext {
    /// Converted name -> number of times it was requested.
    used: indexmap::IndexMap<String, usize>,
    /// Converted root name -> identity of the document that claimed it.
    roots: indexmap::IndexMap<String, String>,
    anonymous: usize,
}

/// Assigns names to model entities. One engine per generation run; the
/// assembler serializes all assignment through it so that name uniqueness
/// holds across every document of the run.
pub struct NamingEngine {
    convention: Option<NamingConvention>,
    context: NamingContext,
}

impl NamingEngine {
    pub fn new(convention: Option<NamingConvention>) -> Self {
        Self {
            convention,
            context: NamingContext::default(),
        }
    }

    /// Claims the declared name of an operation or fragment root.
    ///
    /// # Errors
    /// Returns `DuplicateRootName` if another root already claimed the same
    /// converted name, carrying both document identities.
    pub fn assign_root(
        &mut self,
        declared: &str,
        document: &str,
    ) -> Result<AssignedRoot, TypeModelError> {
        let converted = self.convert(declared);
        if let Some(first_document) = self.context.roots.get(&converted) {
            return Err(TypeModelError::DuplicateRootName {
                name: converted,
                first_document: first_document.clone(),
                second_document: document.to_string(),
            });
        }
        self.context
            .roots
            .insert(converted.clone(), document.to_string());
        Ok(AssignedRoot {
            name: self.disambiguate(converted),
            candidate: declared.to_string(),
        })
    }

    /// Synthesizes a name for an anonymous operation. The counter is scoped
    /// to this engine, so a fresh run starts over at `Unnamed_1`.
    pub fn assign_anonymous_root(&mut self) -> AssignedRoot {
        self.context.anonymous += 1;
        let candidate = format!("Unnamed_{}", self.context.anonymous);
        let converted = self.convert(&candidate);
        AssignedRoot {
            name: self.disambiguate(converted),
            candidate,
        }
    }

    /// Assigns a name for a nested entity from its path of response keys and
    /// branch type names, root name first.
    pub fn assign_nested(&mut self, segments: &[&str]) -> String {
        let converted = self.convert(&segments.iter().join("_"));
        self.disambiguate(converted)
    }

    fn convert(&self, candidate: &str) -> String {
        match &self.convention {
            Some(convention) => convention(candidate),
            None => candidate.to_string(),
        }
    }

    /// First request for a name keeps it; later requests get a counter
    /// suffix. A suffixed candidate may itself already be taken by an
    /// explicit name, so the counter keeps advancing until free.
    fn disambiguate(&mut self, converted: String) -> String {
        let uses = {
            let counter = self.context.used.entry(converted.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        if uses == 1 {
            return converted;
        }
        let mut n = uses;
        loop {
            let candidate = format!("{converted}_{n}");
            if !self.context.used.contains_key(&candidate) {
                self.context.used.insert(candidate.clone(), 1);
                return candidate;
            }
            n += 1;
        }
    }
}
