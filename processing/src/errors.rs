use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// Bad input ordering or shape. The request is rejected with no partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Order confirmation time {confirmed} cannot be earlier than order placed time {placed}")]
    ConfirmationBeforePlacement {
        placed: NaiveDateTime,
        confirmed: NaiveDateTime,
    },

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFiniteAmount { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Only raised when the encoder runs with the strict category policy
    #[error("Unknown {field} value '{value}'")]
    UnknownCategory { field: &'static str, value: String },
}

/// Fatal at startup: no predictions can be served without the artifacts.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("Failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize artifact {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    /// Encoder and classifier disagree on the feature layout
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl ArtifactLoadError {
    pub fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Classifier failure: {0}")]
    Classifier(String),
}

impl PredictionError {
    /// True when the caller sent something we refuse to encode
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictionError::Encoding(_))
    }
}
