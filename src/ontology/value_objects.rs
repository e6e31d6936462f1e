use std::fmt;

use oxrdf::NamedNode;
use thiserror::Error;

use crate::graph::Term;

/// A checked absolute IRI.
///
/// Configuration values (type-assertion URI, evaluated predicates) are
/// parsed into this type so a typo fails the run before any graph is read.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(NamedNode);

impl Iri {
    pub fn parse(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        match NamedNode::new(value.as_str()) {
            Ok(node) => Ok(Self(node)),
            Err(err) => Err(IriError::Invalid {
                value,
                reason: err.to_string(),
            }),
        }
    }

    /// Concatenates a namespace and a local name, e.g. `dbo:` + `director`.
    pub fn join(namespace: &str, local: &str) -> Result<Self, IriError> {
        Self::parse(format!("{namespace}{local}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0.into_string()
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        iri.0.into()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    #[error("`{value}` is not an absolute IRI: {reason}")]
    Invalid { value: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_and_blank_text() {
        for value in ["director", "not an iri", ""] {
            let err = Iri::parse(value).expect_err("not an IRI");
            assert!(matches!(err, IriError::Invalid { value: v, .. } if v == value));
        }
    }

    #[test]
    fn joins_namespace_and_local_part() {
        let iri = Iri::join("http://dbpedia.org/ontology/", "director").expect("valid IRI");
        assert_eq!(iri.as_str(), "http://dbpedia.org/ontology/director");
        assert_eq!(Term::from(iri), Term::iri("http://dbpedia.org/ontology/director"));
        assert!(Iri::join("dbo", " director").is_err());
    }
}
