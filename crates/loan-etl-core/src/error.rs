// crates/loan-etl-core/src/error.rs

use std::path::PathBuf;

use polars::prelude::DataType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required column '{column}' is missing from {source_name}")]
    MissingColumn {
        column: &'static str,
        source_name: String,
    },

    #[error("column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: &'static str,
        expected: DataType,
        found: DataType,
    },

    #[error("column '{column}' has no observed values to compute a median from")]
    NoObservedValues { column: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl EtlError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
