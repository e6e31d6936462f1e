//! Predicate usage and predicate value-range comparisons.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    overlap::{compare_multiset, multiset_comparison, set_comparison},
    scores::{ListComparison, MetricRecord},
    EvaluationContext, MetricSuite,
};
use crate::{config::EvaluationConfig, graph::KnowledgeGraph};

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyReport {
    pub predicates: MetricRecord,
    pub predicates_unique: PredicateSetComparison,
    pub predicate_datatype_range: RangeComparison,
    pub predicate_datatype_range_unique: ListComparison,
}

/// Distinct predicate comparison with presence checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateSetComparison {
    #[serde(flatten)]
    pub comparison: ListComparison,
    /// Every reference predicate is used by the candidate.
    pub all_reference_present: bool,
    /// The candidate uses no predicate outside the reference.
    pub only_reference_present: bool,
}

/// Multiset `(predicate, range)` comparison with a per-predicate breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeComparison {
    #[serde(flatten)]
    pub comparison: ListComparison,
    pub per_predicate: BTreeMap<String, MetricRecord>,
}

impl MetricSuite for PropertyMetrics {
    type Output = PropertyReport;

    fn name(&self) -> &'static str {
        "property"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> PropertyReport {
        let report = PropertyReport {
            predicates: predicates(ctx.candidate, ctx.reference, ctx.config),
            predicates_unique: predicates_unique(ctx.candidate, ctx.reference, ctx.config),
            predicate_datatype_range: predicate_datatype_range(
                ctx.candidate,
                ctx.reference,
                ctx.config,
            ),
            predicate_datatype_range_unique: predicate_datatype_range_unique(
                ctx.candidate,
                ctx.reference,
                ctx.config,
            ),
        };
        debug!(
            predicates_f1 = report.predicates.f1,
            ranges_f1 = report.predicate_datatype_range.comparison.record.f1,
            "property metrics computed"
        );
        report
    }
}

/// Predicate of every statement, limited to the evaluated predicates.
#[must_use]
pub fn predicate_list(graph: &KnowledgeGraph, config: &EvaluationConfig) -> Vec<String> {
    graph
        .iter()
        .map(|triple| triple.predicate.lexical())
        .filter(|predicate| config.evaluates_predicate(predicate))
        .map(str::to_string)
        .collect()
}

/// Predicate occurrences.
#[must_use]
pub fn predicates(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
) -> MetricRecord {
    compare_multiset(&predicate_list(candidate, config), &predicate_list(reference, config))
}

/// Distinct predicates.
#[must_use]
pub fn predicates_unique(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
) -> PredicateSetComparison {
    let candidate: BTreeSet<String> = predicate_list(candidate, config).into_iter().collect();
    let reference: BTreeSet<String> = predicate_list(reference, config).into_iter().collect();
    let all_reference_present = reference.is_subset(&candidate);
    let only_reference_present = candidate.is_subset(&reference);
    PredicateSetComparison {
        comparison: set_comparison(candidate, reference),
        all_reference_present,
        only_reference_present,
    }
}

/// `(predicate, range)` for every evaluated statement.
///
/// The range of a literal is its datatype. The range of a resource is each
/// class it is typed with in the same graph; untyped resources yield nothing.
#[must_use]
pub fn range_pairs(graph: &KnowledgeGraph, config: &EvaluationConfig) -> Vec<(String, String)> {
    let type_uri = config.rdf_type_uri.as_str();
    let mut pairs = Vec::new();
    for triple in graph {
        let predicate = triple.predicate.lexical();
        if !config.evaluates_predicate(predicate) {
            continue;
        }
        match triple.object.datatype() {
            Some(datatype) => pairs.push((predicate.to_string(), datatype.to_string())),
            None => pairs.extend(
                graph
                    .types_of(&triple.object, type_uri)
                    .map(|class| (predicate.to_string(), class.lexical().to_string())),
            ),
        }
    }
    pairs
}

fn render(pairs: &[(String, String)]) -> Vec<String> {
    pairs
        .iter()
        .map(|(predicate, range)| format!("{predicate} {range}"))
        .collect()
}

/// Range pairs counted per occurrence.
#[must_use]
pub fn predicate_datatype_range(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
) -> RangeComparison {
    let candidate = range_pairs(candidate, config);
    let reference = range_pairs(reference, config);

    let mut grouped: BTreeMap<&str, (Vec<&str>, Vec<&str>)> = BTreeMap::new();
    for (predicate, range) in &candidate {
        grouped.entry(predicate).or_default().0.push(range);
    }
    for (predicate, range) in &reference {
        grouped.entry(predicate).or_default().1.push(range);
    }
    let per_predicate = grouped
        .into_iter()
        .map(|(predicate, (candidate, reference))| {
            (predicate.to_string(), compare_multiset(&candidate, &reference))
        })
        .collect();

    RangeComparison {
        comparison: multiset_comparison(render(&candidate), render(&reference)),
        per_predicate,
    }
}

/// Distinct range pairs.
#[must_use]
pub fn predicate_datatype_range_unique(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    config: &EvaluationConfig,
) -> ListComparison {
    set_comparison(
        render(&range_pairs(candidate, config)).into_iter().collect(),
        render(&range_pairs(reference, config)).into_iter().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Term, Triple},
        query::{RDF_TYPE, XSD},
    };

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://ex.org/{local}"))
    }

    fn name_only() -> EvaluationConfig {
        EvaluationConfig::from_yaml_str(
            "namespaces:\n  ex: http://ex.org/\npredicates_to_evaluate:\n  ex: [name]\n",
        )
        .expect("valid config")
    }

    #[test]
    fn occurrence_and_unique_predicates_differ() {
        let config = name_only();
        let reference: KnowledgeGraph = [
            Triple::new(ex("a"), ex("name"), Term::literal("A")),
            Triple::new(ex("a"), ex("age"), Term::literal("3")),
        ]
        .into_iter()
        .collect();
        let candidate: KnowledgeGraph = [
            Triple::new(ex("a"), ex("name"), Term::literal("A")),
            Triple::new(ex("b"), ex("name"), Term::literal("B")),
        ]
        .into_iter()
        .collect();

        let occurrences = predicates(&candidate, &reference, &config);
        assert_eq!((occurrences.tp, occurrences.fp, occurrences.fn_), (1, 1, 0));

        let unique = predicates_unique(&candidate, &reference, &config);
        let record = unique.comparison.record;
        assert_eq!((record.tp, record.fp, record.fn_), (1, 0, 0));
        assert!(unique.all_reference_present);
        assert!(unique.only_reference_present);
    }

    #[test]
    fn empty_predicate_list_evaluates_everything() {
        let config = EvaluationConfig::default();
        let graph: KnowledgeGraph = [
            Triple::new(ex("a"), ex("name"), Term::literal("A")),
            Triple::new(ex("a"), ex("age"), Term::literal("3")),
        ]
        .into_iter()
        .collect();
        assert_eq!(predicate_list(&graph, &config).len(), 2);
    }

    #[test]
    fn ranges_use_datatypes_and_object_classes() {
        let config = EvaluationConfig::default();
        let graph: KnowledgeGraph = [
            Triple::new(ex("film"), ex("year"), Term::typed_literal("1994", format!("{XSD}gYear"))),
            Triple::new(ex("film"), ex("director"), ex("frank")),
            Triple::new(ex("frank"), Term::iri(RDF_TYPE), ex("Person")),
            Triple::new(ex("film"), ex("related"), ex("untyped")),
        ]
        .into_iter()
        .collect();

        let pairs = range_pairs(&graph, &config);
        assert!(pairs.contains(&(
            "http://ex.org/year".to_string(),
            format!("{XSD}gYear")
        )));
        assert!(pairs.contains(&(
            "http://ex.org/director".to_string(),
            "http://ex.org/Person".to_string()
        )));
        assert!(!pairs.iter().any(|(predicate, _)| predicate == "http://ex.org/related"));
    }

    #[test]
    fn range_breakdown_is_per_predicate() {
        let config = EvaluationConfig::default();
        let reference: KnowledgeGraph = [
            Triple::new(ex("a"), ex("age"), Term::typed_literal("3", format!("{XSD}integer"))),
            Triple::new(ex("a"), ex("name"), Term::literal("A")),
        ]
        .into_iter()
        .collect();
        let candidate: KnowledgeGraph = [
            Triple::new(ex("a"), ex("age"), Term::literal("3")),
            Triple::new(ex("a"), ex("name"), Term::literal("A")),
        ]
        .into_iter()
        .collect();

        let ranges = predicate_datatype_range(&candidate, &reference, &config);
        assert_eq!(ranges.comparison.record.tp, 1);
        assert_eq!(ranges.per_predicate["http://ex.org/age"].tp, 0);
        assert_eq!(ranges.per_predicate["http://ex.org/name"].tp, 1);

        let unique = predicate_datatype_range_unique(&candidate, &reference, &config);
        assert_eq!((unique.record.tp, unique.record.fp, unique.record.fn_), (1, 1, 1));
    }
}
