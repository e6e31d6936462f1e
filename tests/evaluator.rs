use grapheval::{
    compute_metrics,
    loader::{load_str, RdfFormat},
    metrics::hierarchy::MatchKind,
    EvaluationConfig, EvaluationMode, GraphEvaluator, KnowledgeGraph,
};
use rstest::rstest;

const GOLD: &str = r#"
@prefix ex: <http://ex.org/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

ex:film1 a ex:Film ;
    ex:title "Brazil" ;
    ex:year "1985"^^xsd:gYear ;
    ex:director ex:terry .

ex:terry a ex:Person ;
    ex:name "Terry Gilliam"@en .

ex:film2 a ex:Film ;
    ex:title "Twelve Monkeys" .
"#;

fn turtle(data: &str) -> KnowledgeGraph {
    load_str(data, RdfFormat::Turtle).expect("valid turtle")
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[test]
fn graph_against_itself_is_perfect() {
    let config = EvaluationConfig::default();
    let gold = turtle(GOLD);
    let result = compute_metrics(&gold, &gold, &config, None, Some("mapping"), EvaluationMode::All);

    assert!(!result.errors.no_triples && !result.errors.no_correct_mapping);
    let common = result.common.expect("common metrics");
    assert!(common.basic.triples.is_perfect());
    assert!(common.basic.subjects.is_perfect());
    assert!(common.basic.classes_unique.record.is_perfect());
    assert!(common.property.predicates_unique.comparison.record.is_perfect());
    assert!(common.object.objects.record.is_perfect());

    let in_domain = result.in_domain.expect("in domain metrics");
    assert!(close(in_domain.domain.entity_coverage.recall, 1.0));
    assert!(close(in_domain.hierarchy.classes_with_hierarchy.record.f1, 1.0));
}

#[test]
fn empty_candidate_only_reports_errors() {
    let config = EvaluationConfig::default();
    let gold = turtle(GOLD);
    let empty = KnowledgeGraph::new();
    let result = compute_metrics(&gold, &empty, &config, None, Some("mapping"), EvaluationMode::All);

    assert!(result.errors.no_triples);
    let value = serde_json::to_value(&result).expect("serializable");
    let keys: Vec<&String> = value.as_object().expect("object").keys().collect();
    assert_eq!(keys, vec!["errors"]);
    assert_eq!(value["errors"]["NoTriples"], true);
}

#[rstest]
#[case(None)]
#[case(Some(""))]
fn missing_mapping_is_flagged(#[case] mapping: Option<&str>) {
    let config = EvaluationConfig::default();
    let gold = turtle(GOLD);
    let result = compute_metrics(&gold, &gold, &config, None, mapping, EvaluationMode::Common);
    assert!(result.errors.no_correct_mapping);
    assert!(result.common.is_none());
}

#[test]
fn more_specific_class_scores_with_ontology() {
    let config = EvaluationConfig::default();
    let gold = turtle("@prefix ex: <http://ex.org/> . ex:alice a ex:Person .");
    let pred = turtle("@prefix ex: <http://ex.org/> . ex:alice a ex:Employee .");
    let ontology = turtle(
        "@prefix ex: <http://ex.org/> .
         @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
         ex:Employee rdfs:subClassOf ex:Person .",
    );

    let result = GraphEvaluator::new(&pred, &gold, &config)
        .with_ontology(Some(&ontology))
        .evaluate_all();

    let common = result.common.expect("common metrics");
    assert_eq!(common.basic.classes_unique.record.tp, 0);

    let hierarchy = result.in_domain.expect("in domain metrics").hierarchy;
    assert_eq!(hierarchy.classes_with_hierarchy.record.tp, 1);
    assert_eq!(hierarchy.classes_with_hierarchy.direct, 1);
    assert!(close(hierarchy.classes_with_hierarchy.record.recall, 1.0));
    assert_eq!(hierarchy.class_details[0].kind, MatchKind::Direct);
}

#[test]
fn hierarchy_recall_never_below_exact_recall() {
    let config = EvaluationConfig::default();
    let gold = turtle(GOLD);
    let pred = turtle(
        "@prefix ex: <http://ex.org/> .
         ex:film1 a ex:Film ; ex:title \"Brazil\" .
         ex:terry a ex:Director .",
    );
    let result = compute_metrics(&gold, &pred, &config, None, Some("mapping"), EvaluationMode::All);

    let unique = result.common.expect("common metrics").basic.classes_unique.record.recall;
    let hierarchy = result
        .in_domain
        .expect("in domain metrics")
        .hierarchy
        .classes_with_hierarchy
        .record
        .recall;
    assert!(hierarchy >= unique);
}

#[test]
fn half_of_the_entities_covered() {
    let config = EvaluationConfig::default();
    let gold = turtle(
        "@prefix ex: <http://ex.org/> .
         ex:a ex:p \"1\" .
         ex:b ex:p \"2\" .",
    );
    let pred = turtle("@prefix ex: <http://ex.org/> . ex:a ex:p \"1\" .");
    let result = compute_metrics(&gold, &pred, &config, None, Some("mapping"), EvaluationMode::InDomain);

    let coverage = result.in_domain.expect("in domain metrics").domain.entity_coverage;
    assert_eq!((coverage.tp, coverage.fn_), (1, 1));
    assert!(close(coverage.recall, 0.5));
}

#[test]
fn wrong_predicate_is_a_false_positive() {
    let config = EvaluationConfig::default();
    let gold = turtle(
        "@prefix ex: <http://ex.org/> .
         ex:s ex:p1 ex:o .
         ex:s ex:p2 ex:o .",
    );
    let pred = turtle(
        "@prefix ex: <http://ex.org/> .
         ex:s ex:p1 ex:o .
         ex:s ex:p3 ex:o .",
    );
    let result = compute_metrics(&gold, &pred, &config, None, Some("mapping"), EvaluationMode::Common);

    let predicates = result.common.expect("common metrics").property.predicates;
    assert_eq!((predicates.tp, predicates.fp, predicates.fn_), (1, 1, 1));
    assert!(close(predicates.precision, 0.5));
}

#[test]
fn fuzzy_subjects_match_on_local_id() {
    let config = EvaluationConfig::default();
    let gold = turtle("@prefix ex: <http://ex.org/> . ex:42 ex:p \"x\" .");
    let pred = turtle(
        "@prefix a: <http://a.org/> .
         a:42 a:p \"x\" .
         a:423 a:p \"x\" .
         a:7 a:p \"x\" .",
    );
    let result = compute_metrics(&gold, &pred, &config, None, Some("mapping"), EvaluationMode::Common);

    let fuzzy = result.common.expect("common metrics").basic.subjects_fuzzy;
    assert_eq!((fuzzy.tp, fuzzy.fp), (2, 1));
    assert!(close(fuzzy.recall, 1.0));
}

#[test]
fn restricted_predicates_ignore_others() {
    let config = EvaluationConfig::from_yaml_str(
        "
namespaces:
  ex: http://ex.org/
predicates_to_evaluate:
  ex: [title]
",
    )
    .expect("valid config");
    let gold = turtle(GOLD);
    let pred = turtle(
        "@prefix ex: <http://ex.org/> .
         ex:film1 ex:title \"Brazil\" ; ex:rating \"5\" .",
    );
    let result = compute_metrics(&gold, &pred, &config, None, Some("mapping"), EvaluationMode::Common);

    let unique = result.common.expect("common metrics").property.predicates_unique;
    assert_eq!(unique.comparison.candidate, vec!["http://ex.org/title"]);
    assert!(unique.comparison.record.is_perfect());
}
