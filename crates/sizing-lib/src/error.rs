//! Error types for ingestion and the sizing pipeline

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::ingest::TableKind;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A required column is absent from a source table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "table '{table}' is missing required column(s): {}; expected columns: {}",
    .missing.join(", "),
    .expected.join(", ")
)]
pub struct SchemaError {
    pub table: TableKind,
    pub missing: Vec<String>,
    pub expected: Vec<String>,
}

/// Data-quality finding. Never raised unless validation runs in strict mode.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityError {
    #[error("duplicate join key '{key}' in table '{table}' ({count} rows)")]
    DuplicateJoinKey {
        table: TableKind,
        key: String,
        count: usize,
    },

    #[error("{column} = {value} for '{key}' in table '{table}' is outside [0, 100]")]
    PercentOutOfRange {
        table: TableKind,
        key: String,
        column: String,
        value: f64,
    },

    #[error("join key '{key}' in table '{table}' has no inventory row")]
    OrphanMetricRow { table: TableKind, key: String },
}

impl DataQualityError {
    /// Orphans are expected when the inventory is authoritative
    pub fn is_informational(&self) -> bool {
        matches!(self, DataQualityError::OrphanMetricRow { .. })
    }
}

/// Errors that abort ingestion of a dataset.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid value '{value}' in table '{table}', row {row}, column '{column}': {reason}")]
    InvalidValue {
        table: TableKind,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("data quality validation failed with {} finding(s):\n{}", .0.len(), Findings(.0.as_slice()))]
    DataQuality(Vec<DataQualityError>),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failure reading a source sheet from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Renders a finding list one per line for user-facing output
pub struct Findings<'a>(pub &'a [DataQualityError]);

impl fmt::Display for Findings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in self.0 {
            writeln!(f, "  - {}", finding)?;
        }
        Ok(())
    }
}
