//! Orchestration of the metric components.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    basic::{BasicMetrics, BasicReport},
    domain::{DomainMetrics, DomainReport},
    hierarchy::{HierarchyMetrics, HierarchyReport},
    object::{ObjectMetrics, ObjectReport},
    property::{PropertyMetrics, PropertyReport},
    EvaluationContext, MetricSuite,
};
use crate::{config::EvaluationConfig, graph::KnowledgeGraph};

/// Which component groups run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Every component.
    #[default]
    All,
    /// Triple, subject, class, predicate and object comparisons.
    Common,
    /// Coverage, usage and hierarchy-aware comparisons.
    InDomain,
}

impl EvaluationMode {
    #[must_use]
    pub fn runs_common(self) -> bool {
        matches!(self, Self::All | Self::Common)
    }

    #[must_use]
    pub fn runs_in_domain(self) -> bool {
        matches!(self, Self::All | Self::InDomain)
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Common => f.write_str("common"),
            Self::InDomain => f.write_str("in_domain"),
        }
    }
}

/// Ontology-independent metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonReport {
    #[serde(flatten)]
    pub basic: BasicReport,
    #[serde(flatten)]
    pub property: PropertyReport,
    #[serde(flatten)]
    pub object: ObjectReport,
}

impl CommonReport {
    #[must_use]
    pub fn compute(ctx: &EvaluationContext<'_>) -> Self {
        Self {
            basic: run(&BasicMetrics, ctx),
            property: run(&PropertyMetrics, ctx),
            object: run(&ObjectMetrics, ctx),
        }
    }
}

/// Metrics that depend on the configuration's domain knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InDomainReport {
    #[serde(flatten)]
    pub domain: DomainReport,
    #[serde(flatten)]
    pub hierarchy: HierarchyReport,
}

impl InDomainReport {
    #[must_use]
    pub fn compute(ctx: &EvaluationContext<'_>) -> Self {
        Self {
            domain: run(&DomainMetrics, ctx),
            hierarchy: run(&HierarchyMetrics, ctx),
        }
    }
}

fn run<S: MetricSuite>(suite: &S, ctx: &EvaluationContext<'_>) -> S::Output {
    let span = tracing::debug_span!("metric_suite", suite = suite.name());
    let _guard = span.enter();
    suite.evaluate(ctx)
}

/// Degenerate-input flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationErrors {
    /// The candidate graph has no statements.
    #[serde(rename = "NoTriples")]
    pub no_triples: bool,
    /// No usable mapping produced the candidate graph.
    #[serde(rename = "NoCorrectMapping")]
    pub no_correct_mapping: bool,
}

impl EvaluationErrors {
    #[must_use]
    pub fn any(&self) -> bool {
        self.no_triples || self.no_correct_mapping
    }
}

/// Outcome of one evaluation. Sections that did not run are omitted when
/// serialised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    pub common: Option<CommonReport>,
    #[serde(flatten)]
    pub in_domain: Option<InDomainReport>,
    pub errors: EvaluationErrors,
}

impl EvaluationResult {
    /// A result carrying only error flags.
    #[must_use]
    pub fn degenerate(errors: EvaluationErrors) -> Self {
        Self {
            common: None,
            in_domain: None,
            errors,
        }
    }
}

/// Runs metric components over one candidate/reference pair.
#[derive(Debug, Clone, Copy)]
pub struct GraphEvaluator<'a> {
    ctx: EvaluationContext<'a>,
    mapping_present: bool,
}

impl<'a> GraphEvaluator<'a> {
    #[must_use]
    pub fn new(
        candidate: &'a KnowledgeGraph,
        reference: &'a KnowledgeGraph,
        config: &'a EvaluationConfig,
    ) -> Self {
        Self {
            ctx: EvaluationContext::new(candidate, reference, config),
            mapping_present: true,
        }
    }

    /// Adds ontology statements to the hierarchy closures.
    #[must_use]
    pub fn with_ontology(mut self, ontology: Option<&'a KnowledgeGraph>) -> Self {
        self.ctx = self.ctx.with_ontology(ontology);
        self
    }

    /// Records whether a mapping artifact produced the candidate graph.
    #[must_use]
    pub fn with_mapping_present(mut self, present: bool) -> Self {
        self.mapping_present = present;
        self
    }

    #[must_use]
    pub fn context(&self) -> &EvaluationContext<'a> {
        &self.ctx
    }

    fn errors(&self) -> EvaluationErrors {
        EvaluationErrors {
            no_triples: self.ctx.candidate.is_empty(),
            no_correct_mapping: !self.mapping_present,
        }
    }

    /// Runs the components selected by `mode`. Nothing is compared when the
    /// candidate graph is empty or no mapping was supplied.
    #[must_use]
    pub fn evaluate(&self, mode: EvaluationMode) -> EvaluationResult {
        let errors = self.errors();
        if errors.any() {
            warn!(
                no_triples = errors.no_triples,
                no_correct_mapping = errors.no_correct_mapping,
                "degenerate input, metrics skipped"
            );
            return EvaluationResult::degenerate(errors);
        }

        info!(
            %mode,
            candidate_triples = self.ctx.candidate.len(),
            reference_triples = self.ctx.reference.len(),
            "evaluation started"
        );
        let result = EvaluationResult {
            common: mode.runs_common().then(|| CommonReport::compute(&self.ctx)),
            in_domain: mode.runs_in_domain().then(|| InDomainReport::compute(&self.ctx)),
            errors,
        };
        if let Some(common) = &result.common {
            info!(
                triples_f1 = common.basic.triples.f1,
                subjects_f1 = common.basic.subjects.f1,
                "evaluation finished"
            );
        } else {
            info!("evaluation finished");
        }
        result
    }

    #[must_use]
    pub fn evaluate_all(&self) -> EvaluationResult {
        self.evaluate(EvaluationMode::All)
    }

    #[must_use]
    pub fn evaluate_common(&self) -> EvaluationResult {
        self.evaluate(EvaluationMode::Common)
    }

    #[must_use]
    pub fn evaluate_in_domain(&self) -> EvaluationResult {
        self.evaluate(EvaluationMode::InDomain)
    }
}

/// Evaluates `pred` against `gold`.
///
/// `pred_mapping` is the text of the mapping that produced `pred`; a missing
/// or blank mapping sets `errors.NoCorrectMapping` and skips every metric.
#[must_use]
pub fn compute_metrics(
    gold: &KnowledgeGraph,
    pred: &KnowledgeGraph,
    config: &EvaluationConfig,
    ontology: Option<&KnowledgeGraph>,
    pred_mapping: Option<&str>,
    mode: EvaluationMode,
) -> EvaluationResult {
    let mapping_present = pred_mapping.is_some_and(|mapping| !mapping.trim().is_empty());
    GraphEvaluator::new(pred, gold, config)
        .with_ontology(ontology)
        .with_mapping_present(mapping_present)
        .evaluate(mode)
}
