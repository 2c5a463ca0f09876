//! Error types for artifact loading, feature alignment and batch parsing

use std::path::PathBuf;
use thiserror::Error;

/// Failure to locate or deserialize a model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("unsupported artifact format for {} (expected .json or .onnx)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid model artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Input columns that cannot be lined up with what the model expects
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("missing feature column '{0}'")]
    MissingColumn(String),

    #[error("column '{0}' is not a feature of this model")]
    UnexpectedColumn(String),

    #[error("model expects {expected} features, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Malformed batch input
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Csv(#[from] csv::Error),

    #[error("batch file has no header row")]
    MissingHeader,

    #[error("batch file has no feature columns")]
    NoFeatureColumns,

    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}
