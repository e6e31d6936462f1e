//! # Application Error Handling
//!
//! Every fallible operation in the crate returns [`crate::Result`]. Failures
//! are grouped by the concern that raised them so the CLI can decide what is
//! fatal: configuration and I/O problems stop the run, while degenerate graph
//! content never reaches this type (it is reported through
//! [`crate::metrics::EvaluationErrors`] instead).

use std::path::PathBuf;

use crate::{config::ConfigError, loader::LoadError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("cannot read `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    JSON(#[from] serde_json::Error),
}

