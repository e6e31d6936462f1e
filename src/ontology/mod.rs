//! Ontology primitives used by the hierarchy-aware metrics.
//!
//! The module keeps only pure domain constructs: validated identifiers and
//! the subsumption closure computed from `rdfs:subClassOf` /
//! `rdfs:subPropertyOf` style edges.

pub mod closure;
pub mod value_objects;

pub use closure::HierarchyClosure;
pub use value_objects::{Iri, IriError};
