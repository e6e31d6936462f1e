//! In-memory RDF graph model consumed by the metrics engine.
//!
//! Terms are [`oxrdf`] terms with a total order on top, so they can be sorted
//! and hashed by every metric. A [`KnowledgeGraph`] is an ordered set of triples:
//! inserting the same statement twice is a no-op, and subject lookups are
//! range scans because triples sort by subject first.

use std::{
    cmp::Ordering,
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
};

use oxrdf::{BlankNode, Literal, NamedNode};

/// A node of an RDF statement.
///
/// Wraps [`oxrdf::Term`] and adds a total order (IRIs, then blank nodes,
/// then literals) so graphs and reports iterate deterministically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Term(oxrdf::Term);

impl Term {
    #[must_use]
    pub fn iri(value: impl Into<String>) -> Self {
        Self(NamedNode::new_unchecked(value).into())
    }

    #[must_use]
    pub fn blank(id: impl Into<String>) -> Self {
        Self(BlankNode::new_unchecked(id).into())
    }

    /// Creates a simple (`xsd:string`) literal.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self(Literal::new_simple_literal(value).into())
    }

    #[must_use]
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self(Literal::new_typed_literal(value, NamedNode::new_unchecked(datatype)).into())
    }

    #[must_use]
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self(Literal::new_language_tagged_literal_unchecked(value, language).into())
    }

    #[must_use]
    pub fn is_iri(&self) -> bool {
        matches!(self.0, oxrdf::Term::NamedNode(_))
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self.0, oxrdf::Term::BlankNode(_))
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self.0, oxrdf::Term::Literal(_))
    }

    /// Returns `true` for IRIs and blank nodes.
    #[must_use]
    pub fn is_resource(&self) -> bool {
        self.is_iri() || self.is_blank()
    }

    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match &self.0 {
            oxrdf::Term::NamedNode(node) => Some(node.as_str()),
            _ => None,
        }
    }

    /// Plain textual value: the IRI, the blank node label or the literal's
    /// lexical form without datatype or language.
    #[must_use]
    pub fn lexical(&self) -> &str {
        match &self.0 {
            oxrdf::Term::NamedNode(node) => node.as_str(),
            oxrdf::Term::BlankNode(node) => node.as_str(),
            oxrdf::Term::Literal(literal) => literal.value(),
            #[allow(unreachable_patterns)]
            _ => "",
        }
    }

    /// Datatype IRI of a literal.
    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        match &self.0 {
            oxrdf::Term::Literal(literal) => Some(literal.datatype().as_str()),
            _ => None,
        }
    }

    /// Trailing `/`-delimited segment of the plain value.
    #[must_use]
    pub fn local_id(&self) -> &str {
        local_id(self.lexical())
    }

    fn rank(&self) -> u8 {
        match &self.0 {
            oxrdf::Term::NamedNode(_) => 0,
            oxrdf::Term::BlankNode(_) => 1,
            oxrdf::Term::Literal(_) => 2,
            #[allow(unreachable_patterns)]
            _ => 3,
        }
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| match (&self.0, &other.0) {
                (oxrdf::Term::NamedNode(a), oxrdf::Term::NamedNode(b)) => a.as_str().cmp(b.as_str()),
                (oxrdf::Term::BlankNode(a), oxrdf::Term::BlankNode(b)) => a.as_str().cmp(b.as_str()),
                (oxrdf::Term::Literal(a), oxrdf::Term::Literal(b)) => {
                    (a.value(), a.datatype().as_str(), a.language())
                        .cmp(&(b.value(), b.datatype().as_str(), b.language()))
                }
                _ => self.0.to_string().cmp(&other.0.to_string()),
            })
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<oxrdf::Term> for Term {
    fn from(term: oxrdf::Term) -> Self {
        Self(term)
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Self(node.into())
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Self(node.into())
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Self(literal.into())
    }
}

/// N-Triples rendering.
impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Trailing `/`-delimited segment of `value`; the whole value when it has no
/// `/`.
#[must_use]
pub fn local_id(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

/// A single RDF statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    #[must_use]
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Canonical key used for exact triple comparison.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Deduplicated, ordered collection of triples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnowledgeGraph {
    triples: BTreeSet<Triple>,
}

impl KnowledgeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a triple, returning `false` when it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> + '_ {
        self.triples.iter()
    }

    /// Distinct subjects in lexical order.
    #[must_use]
    pub fn subjects(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|triple| &triple.subject).collect()
    }

    /// All triples whose subject is `subject`.
    pub fn triples_for_subject<'a>(
        &'a self,
        subject: &'a Term,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        let lower = Triple::new(subject.clone(), Term::iri(""), Term::iri(""));
        self.triples
            .range(lower..)
            .take_while(move |triple| &triple.subject == subject)
    }

    /// Triples matching the bound positions of a pattern.
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
    ) -> Box<dyn Iterator<Item = &'a Triple> + 'a> {
        let candidates: Box<dyn Iterator<Item = &'a Triple> + 'a> = match subject {
            Some(subject) => Box::new(self.triples_for_subject(subject)),
            None => Box::new(self.triples.iter()),
        };
        Box::new(candidates.filter(move |triple| {
            predicate.map_or(true, |p| &triple.predicate == p)
                && object.map_or(true, |o| &triple.object == o)
        }))
    }

    /// Objects of `type_predicate` statements about `subject`.
    pub fn types_of<'a>(
        &'a self,
        subject: &'a Term,
        type_predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples_for_subject(subject)
            .filter(move |triple| triple.predicate.as_iri() == Some(type_predicate))
            .map(|triple| &triple.object)
    }

    /// Copy of the graph keeping only statements about the given subjects.
    #[must_use]
    pub fn restricted_to_subjects(&self, subjects: &BTreeSet<Term>) -> Self {
        self.triples
            .iter()
            .filter(|triple| subjects.contains(&triple.subject))
            .cloned()
            .collect()
    }

    /// Set union of two graphs.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.triples.union(&other.triples).cloned().collect()
    }
}

impl FromIterator<Triple> for KnowledgeGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<Triple> for KnowledgeGraph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl<'a> IntoIterator for &'a KnowledgeGraph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://ex.org/{local}"))
    }

    fn sample() -> KnowledgeGraph {
        [
            Triple::new(ex("a"), ex("name"), Term::literal("Alice")),
            Triple::new(ex("a"), ex("knows"), ex("b")),
            Triple::new(ex("b"), ex("name"), Term::lang_literal("Bob", "en")),
            Triple::new(ex("c"), ex("age"), Term::typed_literal("3", "http://www.w3.org/2001/XMLSchema#integer")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn duplicate_triples_are_collapsed() {
        let mut graph = sample();
        assert_eq!(graph.len(), 4);
        assert!(!graph.insert(Triple::new(ex("a"), ex("knows"), ex("b"))));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn subject_lookup_is_scoped() {
        let graph = sample();
        let a = ex("a");
        let found: Vec<_> = graph.triples_for_subject(&a).collect();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|triple| triple.subject == a));
    }

    #[test]
    fn matching_filters_bound_positions() {
        let graph = sample();
        let name = ex("name");
        assert_eq!(graph.matching(None, Some(&name), None).count(), 2);
        let b = ex("b");
        assert_eq!(graph.matching(None, None, Some(&b)).count(), 1);
    }

    #[test]
    fn renders_ntriples() {
        assert_eq!(ex("a").to_string(), "<http://ex.org/a>");
        assert_eq!(Term::literal("say \"hi\"").to_string(), "\"say \\\"hi\\\"\"");
        assert_eq!(Term::lang_literal("Bob", "en").to_string(), "\"Bob\"@en");
        assert_eq!(
            Term::typed_literal("3", "http://www.w3.org/2001/XMLSchema#integer").to_string(),
            "\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(Term::blank("n1").to_string(), "_:n1");
    }

    #[test]
    fn terms_order_by_kind_then_value() {
        let mut terms = vec![
            Term::literal("a"),
            Term::blank("b0"),
            ex("z"),
            Term::lang_literal("a", "en"),
            ex("a"),
        ];
        terms.sort();
        assert_eq!(terms[0], ex("a"));
        assert_eq!(terms[1], ex("z"));
        assert_eq!(terms[2], Term::blank("b0"));
        assert!(terms[3..].iter().all(Term::is_literal));
    }

    #[test]
    fn explicit_string_datatype_is_a_simple_literal() {
        let explicit = Term::typed_literal("v", "http://www.w3.org/2001/XMLSchema#string");
        assert_eq!(explicit, Term::literal("v"));
        let triple = Triple::new(ex("a"), ex("p"), explicit);
        assert_eq!(triple.key(), "<http://ex.org/a> <http://ex.org/p> \"v\" .");
    }

    #[test]
    fn restricting_subjects_drops_other_statements() {
        let graph = sample();
        let keep = BTreeSet::from([ex("a")]);
        let restricted = graph.restricted_to_subjects(&keep);
        assert_eq!(restricted.len(), 2);
        assert_eq!(restricted.subjects().len(), 1);
    }

    #[test]
    fn local_id_takes_last_segment() {
        assert_eq!(local_id("http://ex.org/dataset/42"), "42");
        assert_eq!(local_id("urn:isbn"), "urn:isbn");
        assert_eq!(local_id("http://ex.org/"), "");
    }
}
