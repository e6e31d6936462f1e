//! Graph comparison metrics.
//!
//! Every component receives the same [`EvaluationContext`] (candidate graph,
//! reference graph, configuration) and returns its own serialisable report.
//! [`GraphEvaluator`] decides which components run for an
//! [`EvaluationMode`] and merges their reports.

pub mod basic;
pub mod domain;
pub mod evaluator;
pub mod hierarchy;
pub mod object;
pub mod overlap;
pub mod property;
pub mod scores;

pub use evaluator::{
    compute_metrics, EvaluationErrors, EvaluationMode, EvaluationResult, GraphEvaluator,
};
pub use overlap::overlapping_lists;
pub use scores::{average, calculate_metrics, f1, precision, recall, ListComparison, MetricRecord};

use crate::{config::EvaluationConfig, graph::KnowledgeGraph};

/// Inputs shared by every metric component.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub candidate: &'a KnowledgeGraph,
    pub reference: &'a KnowledgeGraph,
    pub config: &'a EvaluationConfig,
    /// Extra hierarchy statements merged with the reference graph when
    /// building subsumption closures.
    pub ontology: Option<&'a KnowledgeGraph>,
}

impl<'a> EvaluationContext<'a> {
    #[must_use]
    pub fn new(
        candidate: &'a KnowledgeGraph,
        reference: &'a KnowledgeGraph,
        config: &'a EvaluationConfig,
    ) -> Self {
        Self {
            candidate,
            reference,
            config,
            ontology: None,
        }
    }

    #[must_use]
    pub fn with_ontology(mut self, ontology: Option<&'a KnowledgeGraph>) -> Self {
        self.ontology = ontology;
        self
    }

    /// Same configuration over a different pair of graphs.
    #[must_use]
    pub fn with_graphs(
        &self,
        candidate: &'a KnowledgeGraph,
        reference: &'a KnowledgeGraph,
    ) -> Self {
        Self {
            candidate,
            reference,
            ..*self
        }
    }
}

/// A group of metrics computed from one [`EvaluationContext`].
pub trait MetricSuite {
    type Output;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Self::Output;
}
