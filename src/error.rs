//! Error types for the Achilles results decoder.
//!
//! Every failure in a batch run is fatal: the tool processes one complete
//! snapshot per invocation and never commits partial output. The enums here
//! exist to name the offending table, stratum, or path precisely, not to
//! support retries.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all decoder operations.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Errors reading the results or concept exports
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Errors building the concept lookup
    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    /// Errors in the decoding pass itself
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Errors reshaping a decoded table for presentation
    #[error("Reshape error: {0}")]
    Reshape(#[from] ReshapeError),

    /// Errors writing or reading the columnar snapshot
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading the flat-file inputs (results export, concept export,
/// analysis-details reference).
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read '{path}': {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("Malformed record in '{path}': {source}")]
    Malformed { path: PathBuf, source: csv::Error },
}

/// Errors building the concept vocabulary lookup.
#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Concept table has duplicate concept_id {concept_id}; the lookup key must be unique")]
    DuplicateConceptId { concept_id: i64 },
}

/// Errors in the decoding pass.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(
        "Results table has non-numeric code '{value}' in stratum_{position} of analysis \
         {analysis_id}, but that stratum is classified as concept-coded"
    )]
    NonNumericStratum {
        analysis_id: i32,
        position: usize,
        value: String,
    },

    #[error("Candidate concept set has {count} ids, over the hard limit of {limit}")]
    TooManyConcepts { count: usize, limit: usize },
}

/// Errors reshaping a decoded table into the presentation table.
#[derive(Error, Debug)]
pub enum ReshapeError {
    #[error("Age report found non-numeric birth year '{value}'")]
    InvalidBirthYear { value: String },
}

/// Errors writing or reading the columnar snapshot file.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("File '{path}' already exists. Use --force if you want to overwrite.")]
    OutputExists { path: PathBuf },

    #[error("Failed to write snapshot '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read snapshot '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Arrow error for '{path}': {source}")]
    Arrow {
        path: PathBuf,
        source: arrow_schema::ArrowError,
    },

    #[error("Snapshot '{path}' is missing column '{column}' or holds an unexpected type")]
    ColumnMismatch { path: PathBuf, column: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file '{path}': {source}")]
    LoadFailed {
        path: Box<PathBuf>,
        source: std::io::Error,
    },

    #[error("Invalid config format in '{path}': {source}")]
    InvalidFormat {
        path: Box<PathBuf>,
        source: toml::de::Error,
    },

    #[error("Config validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to save config to '{path}': {source}")]
    SaveFailed {
        path: Box<PathBuf>,
        source: std::io::Error,
    },

    #[error("Unsupported source dialect '{dialect}'")]
    UnsupportedDialect { dialect: String },
}

/// Result type alias for decoder operations
pub type Result<T, E = EtlError> = std::result::Result<T, E>;

impl EtlError {
    /// Get suggested recovery action
    pub fn recovery_hint(&self) -> Option<&str> {
        match self {
            EtlError::Snapshot(SnapshotError::OutputExists { .. }) => {
                Some("Re-run with --force to overwrite the existing snapshot")
            }
            EtlError::Decode(DecodeError::TooManyConcepts { .. }) => {
                Some("Check that the results export excludes tool-internal analyses (analysis_id >= 2000000)")
            }
            EtlError::Decode(DecodeError::NonNumericStratum { .. }) => {
                Some("The analysis-details reference may be missing a non-coded classification for this analysis")
            }
            EtlError::Config(ConfigError::UnsupportedDialect { .. }) => {
                Some("Export from a server-backed database (e.g. postgresql) instead")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_offender() {
        let err = DecodeError::NonNumericStratum {
            analysis_id: 2,
            position: 1,
            value: "abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("stratum_1"));
        assert!(msg.contains("analysis 2"));
    }

    #[test]
    fn test_output_exists_mentions_force() {
        let err = SnapshotError::OutputExists {
            path: PathBuf::from("/tmp/achilles_results.feather"),
        };
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn test_recovery_hints() {
        let err = EtlError::from(SnapshotError::OutputExists {
            path: PathBuf::from("out.feather"),
        });
        assert!(err.recovery_hint().unwrap().contains("--force"));

        let err = EtlError::from(DecodeError::TooManyConcepts {
            count: 100_001,
            limit: 100_000,
        });
        assert!(err.recovery_hint().is_some());

        let err = EtlError::from(VocabularyError::DuplicateConceptId { concept_id: 8507 });
        assert!(err.recovery_hint().is_none());
    }

    #[test]
    fn test_duplicate_key_display() {
        let err = VocabularyError::DuplicateConceptId { concept_id: 8507 };
        assert!(err.to_string().contains("8507"));
        assert!(err.to_string().contains("unique"));
    }
}
