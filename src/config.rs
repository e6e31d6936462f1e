//! # Configuration Management
//!
//! Evaluation runs are described by a YAML file:
//!
//! ```yaml
//! ontology_file: ontology.ttl
//! base_iri: http://example.org/resource/
//! namespaces:
//!   dbo: http://dbpedia.org/ontology/
//! predicates_to_evaluate:
//!   dbo: [director, starring]
//! ids_by_type:
//!   http://dbpedia.org/ontology/Film: ["tt0111161"]
//! sparql_queries:
//!   subclass: |
//!     SELECT ?superClass ?subClass WHERE { ?subClass rdfs:subClassOf ?superClass . }
//! ```
//!
//! Every key is optional. Missing queries fall back to the built-in templates
//! below. The file itself must exist and must not be empty, and every query
//! and IRI must be valid: those problems fail fast as [`ConfigError`].

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    ontology::{Iri, IriError},
    query::{ClosureQuery, QueryError, RDF_TYPE},
};

pub const DEFAULT_SUBCLASS_QUERY: &str = "
SELECT ?superClass ?subClass
WHERE {
    ?subClass rdfs:subClassOf ?superClass .
}
";

pub const DEFAULT_SUBPROPERTY_QUERY: &str = "
SELECT ?superProperty ?subProperty
WHERE {
    ?subProperty rdfs:subPropertyOf ?superProperty .
}
";

pub const DEFAULT_SUBJECT_CLASS_QUERY: &str = "
SELECT ?class
WHERE {
    ?s a ?class .
}
";

pub const DEFAULT_SUBJECT_PROPERTY_QUERY: &str = "
SELECT ?property
WHERE {
    ?s ?property ?o .
}
";

pub const DEFAULT_SUBJECT_PROPERTY_VALUE_QUERY: &str = "
SELECT ?property ?value
WHERE {
    ?s ?property ?value .
}
";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file is empty: {0}")]
    Empty(String),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid `{name}` query: {source}")]
    Query {
        name: &'static str,
        source: QueryError,
    },

    #[error("invalid `{field}`: {source}")]
    Iri {
        field: &'static str,
        source: IriError,
    },
}

fn default_rdf_type_uri() -> String {
    RDF_TYPE.to_string()
}

/// Raw YAML document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Ontology whose hierarchy complements the reference graph.
    pub ontology_file: Option<PathBuf>,
    #[serde(default = "default_rdf_type_uri")]
    pub rdf_type_uri: String,
    pub base_iri: String,
    /// Expected entity ids keyed by class IRI.
    pub ids_by_type: BTreeMap<String, Vec<String>>,
    /// Local-name suffixes of candidate predicates to report on even when
    /// the reference never uses them.
    pub property_suffixes: Vec<String>,
    /// Prefix to namespace IRI.
    pub namespaces: BTreeMap<String, String>,
    /// Prefix to list of local names; combined with `namespaces`.
    pub predicates_to_evaluate: BTreeMap<String, Vec<String>>,
    pub sparql_queries: QueryTemplates,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            ontology_file: None,
            rdf_type_uri: default_rdf_type_uri(),
            base_iri: String::new(),
            ids_by_type: BTreeMap::new(),
            property_suffixes: Vec::new(),
            namespaces: BTreeMap::new(),
            predicates_to_evaluate: BTreeMap::new(),
            sparql_queries: QueryTemplates::default(),
        }
    }
}

/// Closure query template texts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryTemplates {
    pub subclass: String,
    pub subproperty: String,
    pub subject_class: String,
    pub subject_property: String,
    pub subject_property_value: String,
}

impl Default for QueryTemplates {
    fn default() -> Self {
        Self {
            subclass: DEFAULT_SUBCLASS_QUERY.to_string(),
            subproperty: DEFAULT_SUBPROPERTY_QUERY.to_string(),
            subject_class: DEFAULT_SUBJECT_CLASS_QUERY.to_string(),
            subject_property: DEFAULT_SUBJECT_PROPERTY_QUERY.to_string(),
            subject_property_value: DEFAULT_SUBJECT_PROPERTY_VALUE_QUERY.to_string(),
        }
    }
}

/// Parsed closure queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureQueries {
    /// Rows of `(super, sub)` class pairs.
    pub subclass: ClosureQuery,
    /// Rows of `(super, sub)` property pairs.
    pub subproperty: ClosureQuery,
    /// Classes of the subject bound to `?s`.
    pub subject_class: ClosureQuery,
    /// Properties of the subject bound to `?s`.
    pub subject_property: ClosureQuery,
    /// `(property, value)` pairs of the subject bound to `?s`.
    pub subject_property_value: ClosureQuery,
}

impl ClosureQueries {
    fn parse(
        templates: &QueryTemplates,
        namespaces: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let parse = |name: &'static str, text: &str| {
            ClosureQuery::parse(text, namespaces).map_err(|source| ConfigError::Query { name, source })
        };
        Ok(Self {
            subclass: parse("subclass", &templates.subclass)?,
            subproperty: parse("subproperty", &templates.subproperty)?,
            subject_class: parse("subject_class", &templates.subject_class)?,
            subject_property: parse("subject_property", &templates.subject_property)?,
            subject_property_value: parse(
                "subject_property_value",
                &templates.subject_property_value,
            )?,
        })
    }
}

/// Validated, immutable configuration for one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationConfig {
    pub ontology_file: Option<PathBuf>,
    pub rdf_type_uri: String,
    pub base_iri: String,
    pub ids_by_type: BTreeMap<String, Vec<String>>,
    pub property_suffixes: Vec<String>,
    pub namespaces: BTreeMap<String, String>,
    /// Fully qualified predicates under evaluation; empty means "all".
    pub predicates_to_evaluate: Vec<String>,
    pub queries: ClosureQueries,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::from_file_config(ConfigFile::default())
            .expect("built-in query templates are valid")
    }
}

impl EvaluationConfig {
    /// Loads and validates a YAML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str_named(&content, &path.display().to_string())?;
        debug!(path = %path.display(), predicates = config.predicates_to_evaluate.len(), "configuration loaded");
        Ok(config)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_str_named(content, "<inline>")
    }

    fn from_yaml_str_named(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let is_empty = match &value {
            serde_yaml::Value::Null => true,
            serde_yaml::Value::Mapping(mapping) => mapping.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(ConfigError::Empty(origin.to_string()));
        }
        let file: ConfigFile = serde_yaml::from_value(value)?;
        Self::from_file_config(file)
    }

    /// Validates a raw document.
    pub fn from_file_config(file: ConfigFile) -> Result<Self, ConfigError> {
        Iri::parse(file.rdf_type_uri.as_str()).map_err(|source| ConfigError::Iri {
            field: "rdf_type_uri",
            source,
        })?;

        let predicates_to_evaluate =
            build_predicates_list(&file.namespaces, &file.predicates_to_evaluate)?;
        let queries = ClosureQueries::parse(&file.sparql_queries, &file.namespaces)?;

        Ok(Self {
            ontology_file: file.ontology_file,
            rdf_type_uri: file.rdf_type_uri,
            base_iri: file.base_iri,
            ids_by_type: file.ids_by_type,
            property_suffixes: file.property_suffixes,
            namespaces: file.namespaces,
            predicates_to_evaluate,
            queries,
        })
    }

    /// `true` when `predicate` is under evaluation.
    #[must_use]
    pub fn evaluates_predicate(&self, predicate: &str) -> bool {
        self.predicates_to_evaluate.is_empty()
            || self.predicates_to_evaluate.iter().any(|p| p == predicate)
    }
}

/// Expands `prefix → [suffix]` into full IRIs. Prefixes missing from the
/// namespace table are skipped.
fn build_predicates_list(
    namespaces: &BTreeMap<String, String>,
    predicates: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<String>, ConfigError> {
    let mut list: Vec<String> = Vec::new();
    for (prefix, suffixes) in predicates {
        let Some(namespace) = namespaces.get(prefix).filter(|ns| !ns.is_empty()) else {
            warn!(prefix, "prefix has no namespace, predicates skipped");
            continue;
        };
        for suffix in suffixes {
            let iri = Iri::join(namespace, suffix)
                .map_err(|source| ConfigError::Iri {
                    field: "predicates_to_evaluate",
                    source,
                })?
                .into_string();
            if !list.contains(&iri) {
                list.push(iri);
            }
        }
    }
    Ok(list)
}
