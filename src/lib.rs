#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![doc = "Graph evaluation metrics for RDF mapping pipelines.\n\nCompares a candidate knowledge graph against a reference graph and reports precision, recall and F1 at the level of triples, subjects, classes, predicates, objects and ontology hierarchies."]

pub use self::errors::Error;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
mod errors;
pub mod graph;
pub mod loader;
pub mod logger;
pub mod metrics;
pub mod ontology;
pub mod query;
pub mod report;

pub use config::EvaluationConfig;
pub use graph::{KnowledgeGraph, Term, Triple};
pub use metrics::{
    compute_metrics, EvaluationErrors, EvaluationMode, EvaluationResult, GraphEvaluator,
    MetricRecord,
};

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
