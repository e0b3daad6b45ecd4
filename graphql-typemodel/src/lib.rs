//! Deterministic structural type models for GraphQL operations.
//!
//! Given a validated schema and a set of parsed operation and fragment
//! documents, this crate produces a named, merged description of the shape of
//! data each root will return: fields reached through different fragment
//! spreads but sharing a response key are merged, polymorphic narrowings are
//! separated into per-concrete-type branches, and every emitted entity gets a
//! globally unique, deterministic name. Renderers that turn the model into
//! source text in some output language are consumers of this crate, not part
//! of it.
//!
//! The produced model is scoped to one call to [`assemble`]; nothing is
//! cached or shared across runs.

mod assemble;
pub mod document;
pub mod error;
pub mod fragments;
pub mod model;
pub mod naming;
pub mod normalize;
pub mod schema;

pub use crate::assemble::Diagnostic;
pub use crate::assemble::TypeModel;
pub use crate::assemble::TypeModelConfig;
pub use crate::assemble::assemble;
pub use crate::document::Document;
pub use crate::error::TypeModelError;
pub use crate::fragments::FragmentRegistry;
pub use crate::model::TypeModelNode;
pub use crate::naming::NamingConvention;
pub use crate::naming::NamingEngine;
pub use crate::normalize::Normalizer;
pub use crate::schema::SchemaIndex;
