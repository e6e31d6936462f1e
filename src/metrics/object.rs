//! Object comparisons partitioned by term kind.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{overlap::multiset_comparison, scores::ListComparison, EvaluationContext, MetricSuite};
use crate::graph::{KnowledgeGraph, Term};

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub objects: ListComparison,
    pub objects_uris: ListComparison,
    pub objects_literals: ListComparison,
}

impl MetricSuite for ObjectMetrics {
    type Output = ObjectReport;

    fn name(&self) -> &'static str {
        "object"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> ObjectReport {
        let report = ObjectReport {
            objects: objects(ctx.candidate, ctx.reference),
            objects_uris: objects_uris(ctx.candidate, ctx.reference),
            objects_literals: objects_literals(ctx.candidate, ctx.reference),
        };
        debug!(
            objects_f1 = report.objects.record.f1,
            uris_f1 = report.objects_uris.record.f1,
            literals_f1 = report.objects_literals.record.f1,
            "object metrics computed"
        );
        report
    }
}

fn object_values(graph: &KnowledgeGraph, keep: fn(&Term) -> bool) -> Vec<String> {
    graph
        .iter()
        .map(|triple| &triple.object)
        .filter(|object| keep(object))
        .map(|object| object.lexical().to_string())
        .collect()
}

/// Every object by plain value.
#[must_use]
pub fn objects(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> ListComparison {
    multiset_comparison(
        object_values(candidate, |_| true),
        object_values(reference, |_| true),
    )
}

/// IRI objects only.
#[must_use]
pub fn objects_uris(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> ListComparison {
    multiset_comparison(
        object_values(candidate, Term::is_iri),
        object_values(reference, Term::is_iri),
    )
}

/// Literal objects by lexical value, ignoring datatype and language.
#[must_use]
pub fn objects_literals(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> ListComparison {
    multiset_comparison(
        object_values(candidate, Term::is_literal),
        object_values(reference, Term::is_literal),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://ex.org/{local}"))
    }

    #[test]
    fn partitions_by_object_kind() {
        let reference: KnowledgeGraph = [
            Triple::new(ex("a"), ex("knows"), ex("b")),
            Triple::new(ex("a"), ex("name"), Term::literal("Alice")),
            Triple::new(ex("a"), ex("age"), Term::typed_literal("30", "http://www.w3.org/2001/XMLSchema#integer")),
        ]
        .into_iter()
        .collect();
        let candidate: KnowledgeGraph = [
            Triple::new(ex("a"), ex("knows"), ex("c")),
            Triple::new(ex("a"), ex("name"), Term::lang_literal("Alice", "en")),
            Triple::new(ex("a"), ex("age"), Term::literal("30")),
        ]
        .into_iter()
        .collect();

        let uris = objects_uris(&candidate, &reference);
        assert_eq!((uris.record.tp, uris.record.fp, uris.record.fn_), (0, 1, 1));

        let literals = objects_literals(&candidate, &reference);
        assert_eq!((literals.record.tp, literals.record.fp, literals.record.fn_), (2, 0, 0));

        let all = objects(&candidate, &reference);
        assert_eq!(all.record.tp, 2);
        assert_eq!(all.candidate.len(), 3);
    }

    #[test]
    fn blank_objects_count_only_in_all_objects() {
        let graph: KnowledgeGraph = [Triple::new(ex("a"), ex("knows"), Term::blank("b0"))]
            .into_iter()
            .collect();
        assert_eq!(objects(&graph, &graph).record.tp, 1);
        assert_eq!(objects_uris(&graph, &graph).candidate.len(), 0);
        assert_eq!(objects_literals(&graph, &graph).candidate.len(), 0);
    }
}
