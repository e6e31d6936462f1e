//! Entity coverage, expected ids per type, and per-predicate usage checks.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    evaluator::CommonReport,
    hierarchy::SubjectAlignment,
    overlap::overlapping_lists,
    scores::recall,
    EvaluationContext, MetricSuite,
};
use crate::{
    config::EvaluationConfig,
    graph::{KnowledgeGraph, Term, Triple},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
    pub entity_coverage: EntityCoverage,
    /// Common metrics over the covered subjects only.
    pub in_domain: CommonReport,
    pub predicate_usage: BTreeMap<String, PredicateUsage>,
}

/// Recall-only coverage of reference subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCoverage {
    pub tp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub recall: f64,
    pub covered_subjects: Vec<String>,
    /// Keyed by class IRI from `ids_by_type`.
    pub by_type: BTreeMap<String, TypeCoverage>,
}

/// How many expected ids of one class the candidate produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCoverage {
    /// Candidate subjects containing one of the expected ids.
    pub ids_found: usize,
    pub all_ids_present: bool,
    /// Candidate subjects containing an expected id and typed with the class.
    pub ids_with_correct_type: usize,
    pub expected_count: usize,
}

/// Usage of a single predicate in the candidate graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateUsage {
    pub used: bool,
    pub usage_count: usize,
    pub used_with_iris: usize,
    pub used_with_literals: usize,
    /// Statements using the predicate in the reference graph.
    pub expected_count: usize,
    /// Statements matching a reference statement after subject alignment.
    pub correct_usage_count: usize,
    /// Statements matching a reference statement with subject and object
    /// swapped.
    pub inverse_usage_count: usize,
    pub outdegree_correct: bool,
    pub fuzzy_match_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype_correct: Option<bool>,
}

impl MetricSuite for DomainMetrics {
    type Output = DomainReport;

    fn name(&self) -> &'static str {
        "domain"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DomainReport {
        let entity_coverage = entity_coverage(ctx.candidate, ctx.reference, ctx.config);
        let in_domain = in_domain(ctx);
        let alignment = SubjectAlignment::new(ctx.candidate, ctx.reference);
        let predicate_usage = predicate_usage(ctx.candidate, ctx.reference, ctx.config, &alignment);
        debug!(
            coverage = entity_coverage.recall,
            predicates = predicate_usage.len(),
            "domain metrics computed"
        );
        DomainReport {
            entity_coverage,
            in_domain,
            predicate_usage,
        }
    }
}

fn covered_subjects(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> BTreeSet<Term> {
    let candidate_subjects = candidate.subjects();
    reference
        .subjects()
        .into_iter()
        .filter(|subject| candidate_subjects.contains(subject))
        .cloned()
        .collect()
}

/// Fraction of reference subjects that are also candidate subjects.
#[must_use]
pub fn entity_coverage(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
) -> EntityCoverage {
    let covered = covered_subjects(candidate, reference);
    let tp = covered.len();
    let fn_ = reference.subjects().len().saturating_sub(tp);
    EntityCoverage {
        tp,
        fn_,
        recall: recall(tp, fn_),
        covered_subjects: covered.iter().map(|subject| subject.lexical().to_string()).collect(),
        by_type: config
            .ids_by_type
            .iter()
            .map(|(class, ids)| (class.clone(), type_coverage(candidate, config, class, ids)))
            .collect(),
    }
}

/// Expected-id checks over candidate subjects under `base_iri`.
#[must_use]
pub fn type_coverage(
    candidate: &KnowledgeGraph,
    config: &EvaluationConfig,
    class: &str,
    ids: &[String],
) -> TypeCoverage {
    let type_uri = config.rdf_type_uri.as_str();
    let subjects: Vec<&Term> = candidate
        .subjects()
        .into_iter()
        .filter(|subject| subject.lexical().starts_with(&config.base_iri))
        .collect();
    let has_id = |subject: &Term| ids.iter().any(|id| subject.lexical().contains(id.as_str()));

    let ids_found = subjects.iter().filter(|subject| has_id(subject)).count();
    let all_ids_present = ids
        .iter()
        .all(|id| subjects.iter().any(|subject| subject.lexical().contains(id.as_str())));
    let ids_with_correct_type = subjects
        .iter()
        .filter(|subject| has_id(subject))
        .filter(|subject| {
            candidate
                .types_of(subject, type_uri)
                .any(|class_term| class_term.as_iri() == Some(class))
        })
        .count();

    TypeCoverage {
        ids_found,
        all_ids_present,
        ids_with_correct_type,
        expected_count: ids.len(),
    }
}

/// Common metrics recomputed on both graphs restricted to covered subjects.
#[must_use]
pub fn in_domain(ctx: &EvaluationContext<'_>) -> CommonReport {
    let covered = covered_subjects(ctx.candidate, ctx.reference);
    let candidate = ctx.candidate.restricted_to_subjects(&covered);
    let reference = ctx.reference.restricted_to_subjects(&covered);
    debug!(
        subjects = covered.len(),
        candidate_triples = candidate.len(),
        reference_triples = reference.len(),
        "graphs restricted to covered subjects"
    );
    CommonReport::compute(&ctx.with_graphs(&candidate, &reference))
}

/// Trailing segment of an IRI after the last `/` or `#`.
fn local_name(iri: &str) -> &str {
    iri.rsplit(|c| c == '/' || c == '#').next().unwrap_or(iri)
}

/// Predicates reported by [`predicate_usage`]: every reference predicate,
/// the configured evaluation list, and candidate predicates whose local name
/// ends with one of `property_suffixes`.
#[must_use]
pub fn usage_predicates(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
) -> BTreeSet<String> {
    let mut predicates: BTreeSet<String> = reference
        .iter()
        .map(|triple| triple.predicate.lexical().to_string())
        .collect();
    predicates.extend(config.predicates_to_evaluate.iter().cloned());
    predicates.extend(
        candidate
            .iter()
            .map(|triple| triple.predicate.lexical())
            .filter(|predicate| {
                let name = local_name(predicate);
                config
                    .property_suffixes
                    .iter()
                    .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()))
            })
            .map(str::to_string),
    );
    predicates
}

fn statement_key(subject: &Term, predicate: &str, object: &Term) -> String {
    format!("{} {predicate} {}", subject.lexical(), object.lexical())
}

fn typed_statement_key(triple: &Triple, subject: &Term) -> Option<String> {
    triple.object.datatype().map(|datatype| {
        format!(
            "{} {datatype}",
            statement_key(subject, triple.predicate.lexical(), &triple.object)
        )
    })
}

/// Per-predicate usage report.
///
/// Candidate subjects and objects are renamed through `alignment` before
/// statements are compared by plain value with the reference.
#[must_use]
pub fn predicate_usage(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
    alignment: &SubjectAlignment,
) -> BTreeMap<String, PredicateUsage> {
    usage_predicates(candidate, reference, config)
        .into_iter()
        .map(|predicate| {
            let usage = usage_of(candidate, reference, alignment, &predicate);
            (predicate, usage)
        })
        .collect()
}

fn usage_of(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    alignment: &SubjectAlignment,
    predicate: &str,
) -> PredicateUsage {
    let uses = |graph: &KnowledgeGraph| -> Vec<Triple> {
        graph
            .iter()
            .filter(|triple| triple.predicate.as_iri() == Some(predicate))
            .cloned()
            .collect()
    };
    let candidate_uses = uses(candidate);
    let reference_uses = uses(reference);

    let reference_keys: Vec<String> = reference_uses
        .iter()
        .map(|triple| statement_key(&triple.subject, predicate, &triple.object))
        .collect();
    let direct_keys: Vec<String> = candidate_uses
        .iter()
        .map(|triple| {
            statement_key(
                alignment.to_reference(&triple.subject),
                predicate,
                alignment.to_reference(&triple.object),
            )
        })
        .collect();
    let inverse_keys: Vec<String> = candidate_uses
        .iter()
        .filter(|triple| triple.object.is_resource())
        .map(|triple| {
            statement_key(
                alignment.to_reference(&triple.object),
                predicate,
                alignment.to_reference(&triple.subject),
            )
        })
        .collect();

    let usage_count = candidate_uses.len();
    let used_with_literals = candidate_uses
        .iter()
        .filter(|triple| triple.object.is_literal())
        .count();
    let expected_count = reference_uses.len();
    let correct_usage_count = overlapping_lists(&direct_keys, &reference_keys).len();

    let datatype_correct = (used_with_literals > 0).then(|| {
        let reference_typed: Vec<String> = reference_uses
            .iter()
            .filter_map(|triple| typed_statement_key(triple, &triple.subject))
            .collect();
        let candidate_typed: Vec<String> = candidate_uses
            .iter()
            .filter_map(|triple| typed_statement_key(triple, alignment.to_reference(&triple.subject)))
            .collect();
        overlapping_lists(&candidate_typed, &reference_typed).len() == reference_typed.len()
    });

    PredicateUsage {
        used: usage_count > 0,
        usage_count,
        used_with_iris: usage_count - used_with_literals,
        used_with_literals,
        expected_count,
        correct_usage_count,
        inverse_usage_count: overlapping_lists(&inverse_keys, &reference_keys).len(),
        outdegree_correct: usage_count == expected_count,
        fuzzy_match_correct: correct_usage_count == expected_count,
        datatype_correct,
    }
}
