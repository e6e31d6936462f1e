//! `grapheval` command line.
//!
//! ```text
//! grapheval --config config.yaml --gold_graph gold.nt --pred_mapping mapping.yml < pred.ttl
//! ```
//!
//! The candidate graph is read from `--pred_graph` or, when absent, from
//! standard input. The result is written to stdout as JSON (or as a summary
//! table with `--format table`).

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use crate::{
    config::EvaluationConfig,
    graph::KnowledgeGraph,
    loader::{self, RdfFormat},
    logger::{self, Format, LogLevel, LoggerConfig},
    metrics::{compute_metrics, EvaluationMode, EvaluationResult},
    report, Error, Result,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Console summary table
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "grapheval")]
#[command(version)]
#[command(about = "Compare a predicted RDF graph against a gold graph", long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Path to the gold standard RDF graph
    #[arg(long = "gold_graph", value_name = "PATH")]
    pub gold_graph: PathBuf,

    /// Path to the mapping that produced the predicted graph
    #[arg(long = "pred_mapping", value_name = "PATH")]
    pub pred_mapping: PathBuf,

    /// Path to the predicted RDF graph; read from stdin when omitted
    #[arg(long = "pred_graph", value_name = "PATH")]
    pub pred_graph: Option<PathBuf>,

    /// Evaluate only the common metrics
    #[arg(long = "only_common", conflicts_with = "only_in_domain")]
    pub only_common: bool,

    /// Evaluate only the in-domain metrics
    #[arg(long = "only_in_domain")]
    pub only_in_domain: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Log level, overridden by RUST_LOG
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log line format
    #[arg(long = "log-format", value_enum, default_value_t = Format::Compact)]
    pub log_format: Format,
}

impl Cli {
    #[must_use]
    pub fn mode(&self) -> EvaluationMode {
        if self.only_common {
            EvaluationMode::Common
        } else if self.only_in_domain {
            EvaluationMode::InDomain
        } else {
            EvaluationMode::All
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves `ontology_file` against the configuration file's directory.
fn ontology_path(config_path: &Path, ontology: &Path) -> PathBuf {
    if ontology.is_absolute() {
        return ontology.to_path_buf();
    }
    config_path
        .parent()
        .map_or_else(|| ontology.to_path_buf(), |dir| dir.join(ontology))
}

fn load_candidate(path: Option<&Path>) -> Result<KnowledgeGraph> {
    let graph = match path {
        Some(path) => loader::load_path(path)?,
        None => loader::parse(io::stdin().lock(), RdfFormat::Turtle, "<stdin>")?,
    };
    Ok(graph)
}

/// Loads every input named by `cli` and evaluates it.
pub fn evaluate(cli: &Cli) -> Result<EvaluationResult> {
    let config = EvaluationConfig::from_path(&cli.config)?;
    let mapping = read_file(&cli.pred_mapping)?;
    let gold = loader::load_path(&cli.gold_graph)?;
    let ontology = config
        .ontology_file
        .as_deref()
        .map(|path| loader::load_path(&ontology_path(&cli.config, path)))
        .transpose()?;
    let pred = load_candidate(cli.pred_graph.as_deref())?;
    debug!(
        gold = gold.len(),
        pred = pred.len(),
        ontology = ontology.as_ref().map_or(0, KnowledgeGraph::len),
        "inputs loaded"
    );

    Ok(compute_metrics(
        &gold,
        &pred,
        &config,
        ontology.as_ref(),
        Some(mapping.as_str()),
        cli.mode(),
    ))
}

/// Formats a result for stdout.
pub fn render(result: &EvaluationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Table => Ok(report::render_table(result)),
    }
}

/// Entry point of the `grapheval` binary.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(&LoggerConfig {
        level: cli.log_level,
        format: cli.log_format,
    })?;
    info!(mode = %cli.mode(), config = %cli.config.display(), "grapheval starting");

    let result = evaluate(&cli)?;
    println!("{}", render(&result, cli.format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_flags_are_exclusive() {
        let err = Cli::try_parse_from([
            "grapheval",
            "--config",
            "c.yaml",
            "--gold_graph",
            "g.nt",
            "--pred_mapping",
            "m.yml",
            "--only_common",
            "--only_in_domain",
        ])
        .expect_err("conflicting flags");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_mode_and_format() {
        let cli = Cli::try_parse_from([
            "grapheval",
            "--config",
            "c.yaml",
            "--gold_graph",
            "g.nt",
            "--pred_mapping",
            "m.yml",
            "--pred_graph",
            "p.ttl",
            "--only_in_domain",
            "--format",
            "table",
        ])
        .expect("valid arguments");
        assert_eq!(cli.mode(), EvaluationMode::InDomain);
        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.pred_graph.as_deref(), Some(Path::new("p.ttl")));
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn ontology_is_relative_to_config() {
        assert_eq!(
            ontology_path(Path::new("conf/run.yaml"), Path::new("onto.ttl")),
            PathBuf::from("conf/onto.ttl")
        );
        assert_eq!(
            ontology_path(Path::new("conf/run.yaml"), Path::new("/abs/onto.ttl")),
            PathBuf::from("/abs/onto.ttl")
        );
    }
}
