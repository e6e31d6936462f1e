//! Triple, subject and class comparisons.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    overlap::{compare_sets, multiset_comparison, set_comparison},
    scores::{ListComparison, MetricRecord},
    EvaluationContext, MetricSuite,
};
use crate::graph::{KnowledgeGraph, Triple};

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicReport {
    pub triples: MetricRecord,
    pub subjects: MetricRecord,
    pub subjects_fuzzy: MetricRecord,
    pub classes: ListComparison,
    pub classes_unique: ListComparison,
}

impl MetricSuite for BasicMetrics {
    type Output = BasicReport;

    fn name(&self) -> &'static str {
        "basic"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> BasicReport {
        let type_uri = ctx.config.rdf_type_uri.as_str();
        let report = BasicReport {
            triples: triples(ctx.candidate, ctx.reference),
            subjects: subjects(ctx.candidate, ctx.reference),
            subjects_fuzzy: subjects_fuzzy(ctx.candidate, ctx.reference),
            classes: classes(ctx.candidate, ctx.reference, type_uri),
            classes_unique: classes_unique(ctx.candidate, ctx.reference, type_uri),
        };
        debug!(
            triples_f1 = report.triples.f1,
            subjects_f1 = report.subjects.f1,
            classes_f1 = report.classes.record.f1,
            "basic metrics computed"
        );
        report
    }
}

/// Exact statement matches, compared through their canonical N-Triples key.
#[must_use]
pub fn triples(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> MetricRecord {
    let keys = |graph: &KnowledgeGraph| graph.iter().map(Triple::key).collect::<BTreeSet<_>>();
    compare_sets(&keys(candidate), &keys(reference))
}

/// Distinct subjects, exact identity.
#[must_use]
pub fn subjects(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> MetricRecord {
    compare_sets(&candidate.subjects(), &reference.subjects())
}

/// Subjects matched by local id.
///
/// A candidate subject is a hit when the trailing `/` segment of any
/// reference subject occurs anywhere in it. This is a plain substring test:
/// reference id `42` also matches `http://other.org/item/423`. Empty ids
/// (IRIs ending in `/`) are ignored.
#[must_use]
pub fn subjects_fuzzy(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> MetricRecord {
    let reference_subjects = reference.subjects();
    let ids: BTreeSet<&str> = reference_subjects
        .iter()
        .map(|subject| subject.local_id())
        .filter(|id| !id.is_empty())
        .collect();

    let candidate_subjects = candidate.subjects();
    let tp = candidate_subjects
        .iter()
        .filter(|subject| ids.iter().any(|id| subject.lexical().contains(*id)))
        .count();

    MetricRecord::from_counts(candidate_subjects.len(), reference_subjects.len(), tp)
}

/// Objects of type assertions, one entry per assertion.
#[must_use]
pub fn class_list(graph: &KnowledgeGraph, type_uri: &str) -> Vec<String> {
    graph
        .iter()
        .filter(|triple| triple.predicate.as_iri() == Some(type_uri))
        .map(|triple| triple.object.lexical().to_string())
        .collect()
}

/// Class usage counted per assertion.
#[must_use]
pub fn classes(candidate: &KnowledgeGraph, reference: &KnowledgeGraph, type_uri: &str) -> ListComparison {
    multiset_comparison(class_list(candidate, type_uri), class_list(reference, type_uri))
}

/// Distinct classes.
#[must_use]
pub fn classes_unique(
    candidate: &KnowledgeGraph,
    reference: &KnowledgeGraph,
    type_uri: &str,
) -> ListComparison {
    set_comparison(
        class_list(candidate, type_uri).into_iter().collect(),
        class_list(reference, type_uri).into_iter().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::Term,
        query::RDF_TYPE,
    };

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://ex.org/{local}"))
    }

    fn typed(subject: &str, class: &str) -> Triple {
        Triple::new(ex(subject), Term::iri(RDF_TYPE), ex(class))
    }

    #[test]
    fn triples_are_datatype_sensitive() {
        let reference: KnowledgeGraph = [Triple::new(
            ex("a"),
            ex("age"),
            Term::typed_literal("3", "http://www.w3.org/2001/XMLSchema#integer"),
        )]
        .into_iter()
        .collect();
        let candidate: KnowledgeGraph = [Triple::new(ex("a"), ex("age"), Term::literal("3"))]
            .into_iter()
            .collect();

        let record = triples(&candidate, &reference);
        assert_eq!((record.tp, record.fp, record.fn_), (0, 1, 1));
        assert!(triples(&reference, &reference).is_perfect());
    }

    #[test]
    fn fuzzy_subjects_match_by_substring() {
        let reference: KnowledgeGraph = [Triple::new(
            Term::iri("http://ex.org/dataset/42"),
            ex("p"),
            Term::literal("v"),
        )]
        .into_iter()
        .collect();
        let candidate: KnowledgeGraph = [
            Triple::new(Term::iri("http://other.org/item/42"), ex("p"), Term::literal("v")),
            Triple::new(Term::iri("http://other.org/item/423"), ex("p"), Term::literal("v")),
            Triple::new(Term::iri("http://other.org/item/7"), ex("p"), Term::literal("v")),
        ]
        .into_iter()
        .collect();

        let record = subjects_fuzzy(&candidate, &reference);
        // `423` contains `42`: substring matching is the contract.
        assert_eq!((record.tp, record.fp, record.fn_), (2, 1, 0));
        assert_eq!(subjects(&candidate, &reference).tp, 0);
    }

    #[test]
    fn classes_count_every_assertion() {
        let reference: KnowledgeGraph = (0..5).map(|i| typed(&format!("r{i}"), "Film")).collect();
        let candidate: KnowledgeGraph = (0..5)
            .map(|i| typed(&format!("c{i}"), "Film"))
            .chain([typed("c9", "Person")])
            .collect();

        let multiset = classes(&candidate, &reference, RDF_TYPE);
        assert_eq!((multiset.record.tp, multiset.record.fp, multiset.record.fn_), (5, 1, 0));
        assert_eq!(multiset.candidate.len(), 6);

        let unique = classes_unique(&candidate, &reference, RDF_TYPE);
        assert_eq!((unique.record.tp, unique.record.fp, unique.record.fn_), (1, 1, 0));
        assert_eq!(unique.reference, vec!["http://ex.org/Film"]);
    }

    #[test]
    fn empty_candidate_scores_zero() {
        let reference: KnowledgeGraph = [typed("a", "Person")].into_iter().collect();
        let candidate = KnowledgeGraph::new();
        for record in [
            triples(&candidate, &reference),
            subjects(&candidate, &reference),
            subjects_fuzzy(&candidate, &reference),
            classes(&candidate, &reference, RDF_TYPE).record,
        ] {
            assert_eq!(record.fp, 0);
            assert!(record.recall.abs() < f64::EPSILON);
        }
    }
}
