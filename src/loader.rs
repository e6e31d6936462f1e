//! Turtle and N-Triples loading into [`KnowledgeGraph`].

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use oxttl::{NTriplesParser, TurtleParser};
use tracing::debug;

use crate::graph::{KnowledgeGraph, Triple};

/// Serialization understood by the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RdfFormat {
    Turtle,
    NTriples,
}

impl RdfFormat {
    /// Guesses the format from a file extension, falling back to Turtle
    /// (which also accepts N-Triples documents).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("nt") => Self::NTriples,
            _ => Self::Turtle,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot open graph `{path}`: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid RDF in {origin}: {message}")]
    Syntax { origin: String, message: String },
}

/// Parses a graph file, choosing the format from its extension.
pub fn load_path(path: &Path) -> Result<KnowledgeGraph, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse(
        BufReader::new(file),
        RdfFormat::from_path(path),
        &path.display().to_string(),
    )?;
    debug!(path = %path.display(), triples = graph.len(), "graph loaded");
    Ok(graph)
}

/// Parses an in-memory document.
pub fn load_str(data: &str, format: RdfFormat) -> Result<KnowledgeGraph, LoadError> {
    parse(data.as_bytes(), format, "inline document")
}

/// Parses a document from any reader.
pub fn parse<R: Read>(
    reader: R,
    format: RdfFormat,
    origin: &str,
) -> Result<KnowledgeGraph, LoadError> {
    let syntax = |message: String| LoadError::Syntax {
        origin: origin.to_string(),
        message,
    };
    let mut graph = KnowledgeGraph::new();
    match format {
        RdfFormat::Turtle => {
            for triple in TurtleParser::new().for_reader(reader) {
                let triple = triple.map_err(|err| syntax(err.to_string()))?;
                graph.insert(convert(triple));
            }
        }
        RdfFormat::NTriples => {
            for triple in NTriplesParser::new().for_reader(reader) {
                let triple = triple.map_err(|err| syntax(err.to_string()))?;
                graph.insert(convert(triple));
            }
        }
    }
    Ok(graph)
}

fn convert(triple: oxrdf::Triple) -> Triple {
    Triple::new(
        oxrdf::Term::from(triple.subject).into(),
        triple.predicate.into(),
        triple.object.into(),
    )
}

#[cfg(test)]
mod tests {
    use oxrdf::vocab::xsd;

    use super::*;
    use crate::graph::Term;

    const TURTLE: &str = r#"
        @prefix ex: <http://ex.org/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        ex:alice a ex:Person ;
            ex:name "Alice" ;
            ex:age "30"^^xsd:integer ;
            ex:label "Alicia"@es ;
            ex:knows [ ex:name "Bob" ] .
    "#;

    #[test]
    fn parses_turtle_terms() {
        let graph = load_str(TURTLE, RdfFormat::Turtle).expect("valid turtle");
        assert_eq!(graph.len(), 6);

        let alice = Term::iri("http://ex.org/alice");
        let name = graph
            .triples_for_subject(&alice)
            .find(|triple| triple.predicate.as_iri() == Some("http://ex.org/name"))
            .expect("name triple");
        assert_eq!(name.object.datatype(), Some(xsd::STRING.as_str()));

        let age = graph
            .triples_for_subject(&alice)
            .find(|triple| triple.predicate.as_iri() == Some("http://ex.org/age"))
            .expect("age triple");
        assert_eq!(
            age.object.datatype(),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );
        assert!(graph
            .iter()
            .any(|triple| triple.subject.is_blank()));
    }

    #[test]
    fn parses_ntriples() {
        let data = "<http://ex.org/a> <http://ex.org/p> \"v\" .\n";
        let graph = load_str(data, RdfFormat::NTriples).expect("valid n-triples");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn reports_syntax_errors() {
        let err = load_str("ex:a ex:b", RdfFormat::Turtle).expect_err("invalid turtle");
        assert!(matches!(err, LoadError::Syntax { .. }));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(RdfFormat::from_path(Path::new("gold.nt")), RdfFormat::NTriples);
        assert_eq!(RdfFormat::from_path(Path::new("gold.ttl")), RdfFormat::Turtle);
        assert_eq!(RdfFormat::from_path(Path::new("gold")), RdfFormat::Turtle);
    }
}
