//! Console summary of an [`EvaluationResult`].
//!
//! Metrics are split in a "common" section (ontology-independent
//! comparisons) and an "in domain" section (coverage and hierarchy-aware
//! scores). Each row shows precision, recall and F1; values a metric does
//! not define print as `N/A`.

use std::fmt::Write as _;

use colored::Colorize;

use crate::metrics::{EvaluationResult, MetricRecord};

const LINE_WIDTH: usize = 80;
const COLUMNS: [&str; 3] = ["p", "r", "f1"];

/// One printable line of the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
}

impl SummaryRow {
    fn from_record(name: &str, record: &MetricRecord) -> Self {
        Self {
            name: name.to_string(),
            precision: Some(record.precision),
            recall: Some(record.recall),
            f1: Some(record.f1),
        }
    }

    fn recall_only(name: &str, recall: f64) -> Self {
        Self {
            name: name.to_string(),
            precision: None,
            recall: Some(recall),
            f1: None,
        }
    }
}

/// Rows of the ontology-independent metrics.
#[must_use]
pub fn common_rows(result: &EvaluationResult) -> Vec<SummaryRow> {
    let Some(common) = &result.common else {
        return Vec::new();
    };
    [
        ("triples", &common.basic.triples),
        ("subjects", &common.basic.subjects),
        ("subjects_fuzzy", &common.basic.subjects_fuzzy),
        ("classes", &common.basic.classes.record),
        ("classes_unique", &common.basic.classes_unique.record),
        ("predicates", &common.property.predicates),
        ("predicates_unique", &common.property.predicates_unique.comparison.record),
        (
            "predicate_datatype_range",
            &common.property.predicate_datatype_range.comparison.record,
        ),
        (
            "predicate_datatype_range_unique",
            &common.property.predicate_datatype_range_unique.record,
        ),
        ("objects", &common.object.objects.record),
        ("objects_uris", &common.object.objects_uris.record),
        ("objects_literals", &common.object.objects_literals.record),
    ]
    .into_iter()
    .map(|(name, record)| SummaryRow::from_record(name, record))
    .collect()
}

/// Rows of the coverage and hierarchy-aware metrics.
#[must_use]
pub fn in_domain_rows(result: &EvaluationResult) -> Vec<SummaryRow> {
    let Some(in_domain) = &result.in_domain else {
        return Vec::new();
    };
    let hierarchy = &in_domain.hierarchy;
    let mut rows = vec![SummaryRow::recall_only(
        "entity_coverage",
        in_domain.domain.entity_coverage.recall,
    )];
    rows.extend(
        [
            ("in_domain_triples", &in_domain.domain.in_domain.basic.triples),
            ("classes_with_hierarchy", &hierarchy.classes_with_hierarchy.record),
            ("predicates_with_hierarchy", &hierarchy.predicates_with_hierarchy.record),
            ("predicates_direct", &hierarchy.predicates_direct.record),
            ("predicates_inverse", &hierarchy.predicates_inverse.record),
        ]
        .into_iter()
        .map(|(name, record)| SummaryRow::from_record(name, record)),
    );
    rows
}

fn header(title: &str) -> String {
    let inner = LINE_WIDTH - 2;
    let padding = inner.saturating_sub(title.len());
    let left = padding / 2;
    let right = padding - left;
    let rule = format!("+{}+", "=".repeat(inner));
    format!(
        "{rule}\n+{}{title}{}+\n{rule}\n",
        "=".repeat(left),
        "=".repeat(right)
    )
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(value) => {
            let text = format!("{value:<.2}");
            if value >= 0.8 {
                text.green().to_string()
            } else if value >= 0.5 {
                text.yellow().to_string()
            } else {
                text.red().to_string()
            }
        }
        None => "N/A".dimmed().to_string(),
    }
}

fn render_rows(out: &mut String, rows: &[SummaryRow], width: usize) {
    for row in rows {
        let cells: Vec<String> = [row.precision, row.recall, row.f1]
            .into_iter()
            .map(cell)
            .collect();
        let _ = writeln!(out, "{:<width$}{}", row.name, cells.join("\t"));
    }
}

/// Renders the summary table. Sections that did not run are left out; a
/// degenerate result prints its error flags instead.
#[must_use]
pub fn render_table(result: &EvaluationResult) -> String {
    let mut out = header("SUMMARY");
    if result.errors.any() {
        let _ = writeln!(
            out,
            "{} NoTriples={} NoCorrectMapping={}",
            "errors:".red().bold(),
            result.errors.no_triples,
            result.errors.no_correct_mapping
        );
        return out;
    }

    let common = common_rows(result);
    let in_domain = in_domain_rows(result);
    let width = common
        .iter()
        .chain(&in_domain)
        .map(|row| row.name.len())
        .max()
        .unwrap_or(0)
        + 1;

    let _ = writeln!(out, "{:<width$}{}", "", COLUMNS.join("\t").bold());
    if !common.is_empty() {
        let _ = writeln!(out, "{}", "common".bold());
        render_rows(&mut out, &common, width);
    }
    if !in_domain.is_empty() {
        let _ = writeln!(out, "{}", "in domain".bold());
        render_rows(&mut out, &in_domain, width);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EvaluationConfig,
        graph::{KnowledgeGraph, Term, Triple},
        metrics::{EvaluationErrors, GraphEvaluator},
    };

    fn strip_ansi(text: &str) -> String {
        regex::Regex::new(r"\x1b\[[0-9;]*m")
            .expect("valid pattern")
            .replace_all(text, "")
            .into_owned()
    }

    fn graph() -> KnowledgeGraph {
        [Triple::new(
            Term::iri("http://ex.org/a"),
            Term::iri("http://ex.org/p"),
            Term::literal("v"),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn strips_color_codes() {
        let colored = format!("{} {}", "p".green(), "N/A".red().bold());
        assert_eq!(strip_ansi(&colored), "p N/A");
        assert_eq!(strip_ansi("\x1b[1;31mSUMMARY\x1b[0m"), "SUMMARY");
    }

    #[test]
    fn header_is_centered() {
        let header = header("SUMMARY");
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.len() == LINE_WIDTH));
        assert!(lines[1].contains("SUMMARY"));
    }

    #[test]
    fn sections_follow_mode() {
        let config = EvaluationConfig::default();
        let graph = graph();
        let evaluator = GraphEvaluator::new(&graph, &graph, &config);

        let common = evaluator.evaluate_common();
        assert_eq!(common_rows(&common).len(), 12);
        assert!(in_domain_rows(&common).is_empty());

        let in_domain = evaluator.evaluate_in_domain();
        let rows = in_domain_rows(&in_domain);
        assert_eq!(rows[0].name, "entity_coverage");
        assert_eq!(rows[0].precision, None);
        assert_eq!(rows[0].recall, Some(1.0));
    }

    #[test]
    fn degenerate_table() {
        let result = EvaluationResult::degenerate(EvaluationErrors {
            no_triples: true,
            no_correct_mapping: false,
        });
        insta::assert_snapshot!(strip_ansi(&render_table(&result)), @r###"
        +==============================================================================+
        +===================================SUMMARY====================================+
        +==============================================================================+
        errors: NoTriples=true NoCorrectMapping=false
        "###);
    }
}
