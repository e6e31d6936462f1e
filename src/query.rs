//! Closure query templates.
//!
//! The configuration describes hierarchy and per-subject lookups as small
//! SPARQL `SELECT` queries over a basic graph pattern:
//!
//! ```text
//! PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
//! SELECT ?superClass ?subClass
//! WHERE { ?subClass rdfs:subClassOf ?superClass . }
//! ```
//!
//! Templates are parsed with [`spargebra`]. Only `SELECT [DISTINCT]` over
//! joined basic graph patterns is evaluated; property paths, filters,
//! optionals and the rest of the algebra are rejected when the configuration
//! is built. Subject-parametrised templates are evaluated with the variable
//! `?s` pre-bound through [`ClosureQuery::select_with`].

use std::collections::{BTreeMap, BTreeSet};

use spargebra::{
    algebra::GraphPattern,
    term::{NamedNodePattern, TermPattern},
    Query, SparqlParser, SparqlSyntaxError,
};

use crate::graph::{KnowledgeGraph, Term};

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Variable bound to the subject in per-subject templates.
pub const SUBJECT_VARIABLE: &str = "s";

/// Variable name to value assignment.
pub type Bindings = BTreeMap<String, Term>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("only SELECT queries are supported")]
    NotSelect,

    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),

    #[error("namespace `{prefix}:` is not a valid IRI: {message}")]
    Namespace { prefix: String, message: String },

    #[error("unsupported query pattern: {0}")]
    Unsupported(String),

    #[error("query projects no variables")]
    EmptyProjection,

    #[error("projected variable `?{0}` does not occur in the pattern")]
    UnboundProjection(String),
}

/// Position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTerm {
    Variable(String),
    Constant(Term),
}

impl PatternTerm {
    fn resolve<'a>(&'a self, bindings: &'a Bindings) -> Option<&'a Term> {
        match self {
            Self::Constant(term) => Some(term),
            Self::Variable(name) => bindings.get(name),
        }
    }

    fn variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            Self::Constant(_) => None,
        }
    }

    fn from_term(term: &TermPattern) -> Result<Self, QueryError> {
        #[allow(unreachable_patterns)]
        match term {
            TermPattern::Variable(variable) => Ok(Self::Variable(variable.as_str().to_string())),
            // blank nodes in a pattern behave as variables that cannot be projected
            TermPattern::BlankNode(node) => Ok(Self::Variable(node.to_string())),
            TermPattern::NamedNode(node) => Ok(Self::Constant(node.clone().into())),
            TermPattern::Literal(literal) => Ok(Self::Constant(literal.clone().into())),
            other => Err(QueryError::Unsupported(other.to_string())),
        }
    }

    fn from_predicate(predicate: &NamedNodePattern) -> Self {
        match predicate {
            NamedNodePattern::Variable(variable) => Self::Variable(variable.as_str().to_string()),
            NamedNodePattern::NamedNode(node) => Self::Constant(node.clone().into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

/// A parsed `SELECT` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureQuery {
    source: String,
    projection: Vec<String>,
    distinct: bool,
    patterns: Vec<TriplePattern>,
}

/// Shape of a `SELECT` once the algebra has been flattened.
#[derive(Default)]
struct Selection {
    projection: Option<Vec<String>>,
    distinct: bool,
    patterns: Vec<TriplePattern>,
}

impl Selection {
    fn collect(&mut self, pattern: &GraphPattern) -> Result<(), QueryError> {
        match pattern {
            GraphPattern::Project { inner, variables } if self.projection.is_none() => {
                self.projection = Some(
                    variables
                        .iter()
                        .map(|variable| variable.as_str().to_string())
                        .collect(),
                );
                self.collect(inner)
            }
            GraphPattern::Distinct { inner } => {
                self.distinct = true;
                self.collect(inner)
            }
            GraphPattern::Reduced { inner } => self.collect(inner),
            GraphPattern::Join { left, right } => {
                self.collect(left)?;
                self.collect(right)
            }
            GraphPattern::Bgp { patterns } => {
                for triple in patterns {
                    self.patterns.push(TriplePattern {
                        subject: PatternTerm::from_term(&triple.subject)?,
                        predicate: PatternTerm::from_predicate(&triple.predicate),
                        object: PatternTerm::from_term(&triple.object)?,
                    });
                }
                Ok(())
            }
            other => Err(QueryError::Unsupported(other.to_string())),
        }
    }

    fn mentioned(&self) -> Vec<&str> {
        let mut ordered = Vec::new();
        for name in self
            .patterns
            .iter()
            .flat_map(|p| [&p.subject, &p.predicate, &p.object])
            .filter_map(PatternTerm::variable)
            .filter(|name| !name.starts_with("_:"))
        {
            if !ordered.contains(&name) {
                ordered.push(name);
            }
        }
        ordered
    }
}

fn parser(namespaces: &BTreeMap<String, String>) -> Result<SparqlParser, QueryError> {
    let builtin = [("rdf", RDF), ("rdfs", RDFS), ("owl", OWL), ("xsd", XSD)];
    let configured = namespaces
        .iter()
        .filter(|(_, namespace)| !namespace.is_empty())
        .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()));

    let mut parser = SparqlParser::new();
    for (prefix, namespace) in builtin.into_iter().chain(configured) {
        parser = parser
            .with_prefix(prefix, namespace)
            .map_err(|err| QueryError::Namespace {
                prefix: prefix.to_string(),
                message: err.to_string(),
            })?;
    }
    Ok(parser)
}

impl ClosureQuery {
    /// Parses a template. `namespaces` extends the built-in `rdf`, `rdfs`,
    /// `owl` and `xsd` prefixes; `PREFIX` declarations in the text win over
    /// both.
    pub fn parse(text: &str, namespaces: &BTreeMap<String, String>) -> Result<Self, QueryError> {
        let query = parser(namespaces)?.parse_query(text)?;
        let Query::Select {
            dataset, pattern, ..
        } = query
        else {
            return Err(QueryError::NotSelect);
        };
        if dataset.is_some() {
            return Err(QueryError::Unsupported("FROM clause".to_string()));
        }

        let mut selection = Selection::default();
        selection.collect(&pattern)?;

        let mentioned = selection.mentioned();
        let projection = match selection.projection.clone() {
            Some(projection) => {
                if let Some(missing) = projection
                    .iter()
                    .find(|name| !mentioned.contains(&name.as_str()))
                {
                    return Err(QueryError::UnboundProjection(missing.clone()));
                }
                projection
            }
            None => mentioned.iter().map(ToString::to_string).collect(),
        };
        if projection.is_empty() {
            return Err(QueryError::EmptyProjection);
        }

        Ok(Self {
            source: text.to_string(),
            projection,
            distinct: selection.distinct,
            patterns: selection.patterns,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Projected variable names, in column order.
    #[must_use]
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    #[must_use]
    pub fn patterns(&self) -> &[TriplePattern] {
        &self.patterns
    }

    /// Evaluates the template against `graph`.
    #[must_use]
    pub fn select(&self, graph: &KnowledgeGraph) -> Vec<Vec<Term>> {
        self.select_with(graph, &Bindings::new())
    }

    /// Evaluates the template with some variables already bound.
    #[must_use]
    pub fn select_with(&self, graph: &KnowledgeGraph, bound: &Bindings) -> Vec<Vec<Term>> {
        let mut solutions = vec![bound.clone()];
        for pattern in &self.patterns {
            let mut extended = Vec::new();
            for solution in &solutions {
                let subject = pattern.subject.resolve(solution);
                let predicate = pattern.predicate.resolve(solution);
                let object = pattern.object.resolve(solution);
                for triple in graph.matching(subject, predicate, object) {
                    let mut next = solution.clone();
                    if bind(&mut next, &pattern.subject, &triple.subject)
                        && bind(&mut next, &pattern.predicate, &triple.predicate)
                        && bind(&mut next, &pattern.object, &triple.object)
                    {
                        extended.push(next);
                    }
                }
            }
            solutions = extended;
            if solutions.is_empty() {
                break;
            }
        }

        let rows = solutions.into_iter().filter_map(|solution| {
            self.projection
                .iter()
                .map(|name| solution.get(name).cloned())
                .collect::<Option<Vec<_>>>()
        });
        if self.distinct {
            let mut seen = BTreeSet::new();
            rows.filter(|row| seen.insert(row.clone())).collect()
        } else {
            rows.collect()
        }
    }

    /// Convenience for the per-subject templates: binds `?s` to `subject`.
    #[must_use]
    pub fn select_for_subject(&self, graph: &KnowledgeGraph, subject: &Term) -> Vec<Vec<Term>> {
        let bound = Bindings::from([(SUBJECT_VARIABLE.to_string(), subject.clone())]);
        self.select_with(graph, &bound)
    }
}

fn bind(solution: &mut Bindings, position: &PatternTerm, value: &Term) -> bool {
    match position {
        PatternTerm::Constant(_) => true,
        PatternTerm::Variable(name) => match solution.get(name) {
            Some(existing) => existing == value,
            None => {
                solution.insert(name.clone(), value.clone());
                true
            }
        },
    }
}
