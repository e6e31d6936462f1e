//! Subsumption-aware class and predicate matching.
//!
//! A candidate assignment is credited when it is identical to the reference
//! one (**exact**), more specific (**direct**: the candidate is a descendant)
//! or more general (**inverse**: the candidate is an ancestor). Closures come
//! from the configured `subclass` / `subproperty` queries evaluated on the
//! reference graph, merged with the ontology graph when one is loaded.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    basic::class_list,
    property::predicate_list,
    scores::{average, calculate_metrics, MetricRecord},
    EvaluationContext, MetricSuite,
};
use crate::{
    config::EvaluationConfig,
    graph::{KnowledgeGraph, Term},
    ontology::HierarchyClosure,
    query::ClosureQuery,
};

/// How a candidate assignment relates to the reference one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Direct,
    Inverse,
    Miss,
}

impl MatchKind {
    #[must_use]
    pub fn is_match(self) -> bool {
        self != Self::Miss
    }

    #[must_use]
    pub fn is_direct_match(self) -> bool {
        matches!(self, Self::Exact | Self::Direct)
    }

    #[must_use]
    pub fn is_inverse_match(self) -> bool {
        matches!(self, Self::Exact | Self::Inverse)
    }
}

/// Classifies `candidate` against `reference`.
#[must_use]
pub fn relation(closure: &HierarchyClosure, reference: &str, candidate: &str) -> MatchKind {
    if reference == candidate {
        MatchKind::Exact
    } else if closure.is_ancestor(reference, candidate) {
        MatchKind::Direct
    } else if closure.is_ancestor(candidate, reference) {
        MatchKind::Inverse
    } else {
        MatchKind::Miss
    }
}

/// `0.5^n` where `n` is the number of subsumption steps between the two
/// items; `0.0` for a miss.
#[must_use]
pub fn similarity(closure: &HierarchyClosure, kind: MatchKind, reference: &str, candidate: &str) -> f64 {
    let distance = match kind {
        MatchKind::Exact => Some(0),
        MatchKind::Direct => closure.distance(candidate, reference),
        MatchKind::Inverse => closure.distance(reference, candidate),
        MatchKind::Miss => None,
    };
    distance
        .and_then(|steps| i32::try_from(steps).ok())
        .map_or(0.0, |steps| 0.5_f64.powi(steps))
}

/// Best accepted candidate for `reference`, preferring exact over direct over
/// inverse.
fn best_match<'c>(
    closure: &HierarchyClosure,
    reference: &str,
    candidates: &'c BTreeSet<String>,
    accept: fn(MatchKind) -> bool,
) -> (MatchKind, Option<&'c str>) {
    candidates
        .iter()
        .map(|candidate| (relation(closure, reference, candidate), candidate.as_str()))
        .filter(|(kind, _)| accept(*kind))
        .min_by_key(|(kind, _)| *kind)
        .map_or((MatchKind::Miss, None), |(kind, candidate)| (kind, Some(candidate)))
}

/// Reference subject to candidate subject mapping.
///
/// A reference subject aligns with the identical candidate subject when
/// there is one, otherwise with the first candidate subject (in term order)
/// that has the same local id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAlignment {
    to_candidate: BTreeMap<Term, Term>,
    to_reference: BTreeMap<Term, Term>,
}

impl SubjectAlignment {
    #[must_use]
    pub fn new(candidate: &KnowledgeGraph, reference: &KnowledgeGraph) -> Self {
        let candidate_subjects = candidate.subjects();
        let mut by_local_id: BTreeMap<&str, &Term> = BTreeMap::new();
        for &subject in &candidate_subjects {
            let id = subject.local_id();
            if !id.is_empty() {
                by_local_id.entry(id).or_insert(subject);
            }
        }

        let mut alignment = Self::default();
        for subject in reference.subjects() {
            let aligned = if candidate_subjects.contains(&subject) {
                Some(subject)
            } else {
                by_local_id.get(subject.local_id()).copied()
            };
            if let Some(aligned) = aligned {
                alignment
                    .to_candidate
                    .insert(subject.clone(), aligned.clone());
                alignment
                    .to_reference
                    .entry(aligned.clone())
                    .or_insert_with(|| subject.clone());
            }
        }
        alignment
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.to_candidate.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_candidate.is_empty()
    }

    /// Candidate subject aligned with a reference subject.
    #[must_use]
    pub fn candidate_for(&self, reference: &Term) -> Option<&Term> {
        self.to_candidate.get(reference)
    }

    /// Rewrites a candidate term into the reference naming when it is an
    /// aligned subject.
    #[must_use]
    pub fn to_reference<'a>(&'a self, candidate: &'a Term) -> &'a Term {
        self.to_reference.get(candidate).unwrap_or(candidate)
    }
}

/// Closure relations for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyScorer {
    pub classes: HierarchyClosure,
    pub properties: HierarchyClosure,
}

impl HierarchyScorer {
    #[must_use]
    pub fn from_context(ctx: &EvaluationContext<'_>) -> Self {
        let source = match ctx.ontology {
            Some(ontology) => Cow::Owned(ctx.reference.union(ontology)),
            None => Cow::Borrowed(ctx.reference),
        };
        let scorer = Self {
            classes: HierarchyClosure::from_query(&ctx.config.queries.subclass, &source),
            properties: HierarchyClosure::from_query(&ctx.config.queries.subproperty, &source),
        };
        debug!(
            classes = scorer.classes.len(),
            properties = scorer.properties.len(),
            "hierarchy closures ready"
        );
        scorer
    }
}

/// Hierarchy-tolerant comparison outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    #[serde(flatten)]
    pub record: MetricRecord,
    pub exact: usize,
    pub direct: usize,
    pub inverse: usize,
    /// Mean `0.5^distance` over matched items.
    pub similarity: f64,
}

/// Classification of one reference (subject, class) or (subject, predicate)
/// assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDetail {
    pub subject: String,
    pub candidate_subject: Option<String>,
    pub reference: String,
    pub candidate: Option<String>,
    pub kind: MatchKind,
    pub similarity: f64,
    /// Whether the matched candidate predicate shares a value with the
    /// reference one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_match: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyReport {
    pub classes_with_hierarchy: HierarchyRecord,
    pub predicates_with_hierarchy: HierarchyRecord,
    pub predicates_direct: HierarchyRecord,
    pub predicates_inverse: HierarchyRecord,
    pub single_property_hierarchy_scores: BTreeMap<String, HierarchyRecord>,
    pub predicate_details: Vec<AssignmentDetail>,
    pub class_details: Vec<AssignmentDetail>,
}

#[derive(Debug, Default)]
struct Tally {
    exact: usize,
    direct: usize,
    inverse: usize,
    missed: usize,
    unused: usize,
    similarities: Vec<f64>,
}

impl Tally {
    fn add(&mut self, kind: MatchKind, similarity: f64) {
        match kind {
            MatchKind::Exact => self.exact += 1,
            MatchKind::Direct => self.direct += 1,
            MatchKind::Inverse => self.inverse += 1,
            MatchKind::Miss => self.missed += 1,
        }
        if kind.is_match() {
            self.similarities.push(similarity);
        }
    }

    /// Scores `reference` items against `candidate` items; candidates that
    /// match no reference item count as false positives.
    fn compare(
        &mut self,
        closure: &HierarchyClosure,
        reference: &BTreeSet<String>,
        candidate: &BTreeSet<String>,
        accept: fn(MatchKind) -> bool,
    ) {
        for item in reference {
            let (kind, found) = best_match(closure, item, candidate, accept);
            let score = found.map_or(0.0, |found| similarity(closure, kind, item, found));
            self.add(kind, score);
        }
        self.unused += candidate
            .iter()
            .filter(|c| !reference.iter().any(|r| accept(relation(closure, r, c))))
            .count();
    }

    fn record(&self) -> HierarchyRecord {
        let tp = self.exact + self.direct + self.inverse;
        HierarchyRecord {
            record: calculate_metrics(tp, self.unused, self.missed, 0),
            exact: self.exact,
            direct: self.direct,
            inverse: self.inverse,
            similarity: average(&self.similarities),
        }
    }
}

/// First-column resources of a per-subject template.
fn resources_for(query: &ClosureQuery, graph: &KnowledgeGraph, subject: &Term) -> BTreeSet<String> {
    query
        .select_for_subject(graph, subject)
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter(Term::is_resource)
        .map(|term| term.lexical().to_string())
        .collect()
}

/// `(property, value)` rows of a per-subject template, grouped by property.
fn values_for(
    query: &ClosureQuery,
    graph: &KnowledgeGraph,
    subject: &Term,
    rename: impl Fn(&Term) -> String,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut values: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in query.select_for_subject(graph, subject) {
        if let [property, value, ..] = row.as_slice() {
            values
                .entry(property.lexical().to_string())
                .or_default()
                .insert(rename(value));
        }
    }
    values
}

/// What both graphs say about one reference subject.
struct SubjectView {
    subject: String,
    candidate_subject: Option<String>,
    reference_classes: BTreeSet<String>,
    candidate_classes: BTreeSet<String>,
    reference_properties: BTreeSet<String>,
    candidate_properties: BTreeSet<String>,
    reference_values: BTreeMap<String, BTreeSet<String>>,
    candidate_values: BTreeMap<String, BTreeSet<String>>,
}

impl SubjectView {
    fn build(
        ctx: &EvaluationContext<'_>,
        alignment: &SubjectAlignment,
        subject: &Term,
    ) -> Self {
        let queries = &ctx.config.queries;
        let evaluated = |properties: BTreeSet<String>| -> BTreeSet<String> {
            properties
                .into_iter()
                .filter(|property| ctx.config.evaluates_predicate(property))
                .collect()
        };

        let reference_classes = resources_for(&queries.subject_class, ctx.reference, subject);
        let reference_properties =
            evaluated(resources_for(&queries.subject_property, ctx.reference, subject));
        let reference_values = values_for(
            &queries.subject_property_value,
            ctx.reference,
            subject,
            |value| value.lexical().to_string(),
        );

        let candidate_subject = alignment.candidate_for(subject);
        let (candidate_classes, candidate_properties, candidate_values) = match candidate_subject {
            Some(candidate) => (
                resources_for(&queries.subject_class, ctx.candidate, candidate),
                evaluated(resources_for(&queries.subject_property, ctx.candidate, candidate)),
                values_for(
                    &queries.subject_property_value,
                    ctx.candidate,
                    candidate,
                    |value| alignment.to_reference(value).lexical().to_string(),
                ),
            ),
            None => Default::default(),
        };

        Self {
            subject: subject.lexical().to_string(),
            candidate_subject: candidate_subject.map(|term| term.lexical().to_string()),
            reference_classes,
            candidate_classes,
            reference_properties,
            candidate_properties,
            reference_values,
            candidate_values,
        }
    }

    fn value_match(&self, reference: &str, candidate: &str) -> bool {
        match (
            self.reference_values.get(reference),
            self.candidate_values.get(candidate),
        ) {
            (Some(reference), Some(candidate)) => !reference.is_disjoint(candidate),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyMetrics;

impl MetricSuite for HierarchyMetrics {
    type Output = HierarchyReport;

    fn name(&self) -> &'static str {
        "hierarchy"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> HierarchyReport {
        let scorer = HierarchyScorer::from_context(ctx);
        let alignment = SubjectAlignment::new(ctx.candidate, ctx.reference);
        let views: Vec<SubjectView> = ctx
            .reference
            .subjects()
            .into_iter()
            .map(|subject| SubjectView::build(ctx, &alignment, subject))
            .collect();
        debug!(
            subjects = views.len(),
            aligned = alignment.len(),
            "subjects aligned"
        );

        let report = HierarchyReport {
            classes_with_hierarchy: classes_with_hierarchy(&scorer, ctx),
            predicates_with_hierarchy: predicates_with_hierarchy(&scorer, ctx),
            predicates_direct: assignments(&scorer.properties, &views, MatchKind::is_direct_match),
            predicates_inverse: assignments(&scorer.properties, &views, MatchKind::is_inverse_match),
            single_property_hierarchy_scores: single_property_scores(&scorer, ctx.config, &views),
            predicate_details: predicate_details(&scorer, &views),
            class_details: class_details(&scorer, &views),
        };
        debug!(
            classes_recall = report.classes_with_hierarchy.record.recall,
            predicates_recall = report.predicates_with_hierarchy.record.recall,
            "hierarchy metrics computed"
        );
        report
    }
}

/// Distinct reference classes matched by some related candidate class.
#[must_use]
pub fn classes_with_hierarchy(scorer: &HierarchyScorer, ctx: &EvaluationContext<'_>) -> HierarchyRecord {
    let type_uri = ctx.config.rdf_type_uri.as_str();
    let reference = class_list(ctx.reference, type_uri).into_iter().collect();
    let candidate = class_list(ctx.candidate, type_uri).into_iter().collect();
    let mut tally = Tally::default();
    tally.compare(&scorer.classes, &reference, &candidate, MatchKind::is_match);
    tally.record()
}

/// Distinct evaluated reference predicates matched by some related candidate
/// predicate.
#[must_use]
pub fn predicates_with_hierarchy(
    scorer: &HierarchyScorer,
    ctx: &EvaluationContext<'_>,
) -> HierarchyRecord {
    let reference = predicate_list(ctx.reference, ctx.config).into_iter().collect();
    let candidate = predicate_list(ctx.candidate, ctx.config).into_iter().collect();
    let mut tally = Tally::default();
    tally.compare(&scorer.properties, &reference, &candidate, MatchKind::is_match);
    tally.record()
}

/// Per-subject predicate assignments, crediting only the accepted direction.
/// Subjects without a candidate counterpart contribute misses only.
fn assignments(
    closure: &HierarchyClosure,
    views: &[SubjectView],
    accept: fn(MatchKind) -> bool,
) -> HierarchyRecord {
    let mut tally = Tally::default();
    for view in views {
        tally.compare(
            closure,
            &view.reference_properties,
            &view.candidate_properties,
            accept,
        );
    }
    tally.record()
}

fn single_property_scores(
    scorer: &HierarchyScorer,
    config: &EvaluationConfig,
    views: &[SubjectView],
) -> BTreeMap<String, HierarchyRecord> {
    let predicates: BTreeSet<&str> = if config.predicates_to_evaluate.is_empty() {
        views
            .iter()
            .flat_map(|view| view.reference_properties.iter().map(String::as_str))
            .collect()
    } else {
        config.predicates_to_evaluate.iter().map(String::as_str).collect()
    };

    predicates
        .into_iter()
        .map(|predicate| {
            let mut tally = Tally::default();
            for view in views {
                if view.reference_properties.contains(predicate) {
                    let (kind, found) = best_match(
                        &scorer.properties,
                        predicate,
                        &view.candidate_properties,
                        MatchKind::is_match,
                    );
                    let score = found.map_or(0.0, |found| {
                        similarity(&scorer.properties, kind, predicate, found)
                    });
                    tally.add(kind, score);
                } else if view.candidate_properties.iter().any(|candidate| {
                    relation(&scorer.properties, predicate, candidate).is_direct_match()
                }) {
                    // asserted where the reference does not
                    tally.unused += 1;
                }
            }
            (predicate.to_string(), tally.record())
        })
        .collect()
}

fn detail(
    closure: &HierarchyClosure,
    view: &SubjectView,
    reference: &str,
    candidates: &BTreeSet<String>,
) -> AssignmentDetail {
    let (kind, found) = best_match(closure, reference, candidates, MatchKind::is_match);
    AssignmentDetail {
        subject: view.subject.clone(),
        candidate_subject: view.candidate_subject.clone(),
        reference: reference.to_string(),
        candidate: found.map(str::to_string),
        kind,
        similarity: found.map_or(0.0, |found| similarity(closure, kind, reference, found)),
        value_match: None,
    }
}

fn predicate_details(scorer: &HierarchyScorer, views: &[SubjectView]) -> Vec<AssignmentDetail> {
    views
        .iter()
        .flat_map(|view| {
            view.reference_properties.iter().map(move |property| {
                let mut assignment = detail(
                    &scorer.properties,
                    view,
                    property,
                    &view.candidate_properties,
                );
                assignment.value_match = assignment
                    .candidate
                    .as_deref()
                    .map(|candidate| view.value_match(property, candidate));
                assignment
            })
        })
        .collect()
}

fn class_details(scorer: &HierarchyScorer, views: &[SubjectView]) -> Vec<AssignmentDetail> {
    views
        .iter()
        .flat_map(|view| {
            view.reference_classes
                .iter()
                .map(move |class| detail(&scorer.classes, view, class, &view.candidate_classes))
        })
        .collect()
}
