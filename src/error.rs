use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SourceError – every failure the classification core can report
// ---------------------------------------------------------------------------

/// Errors raised by the feature pipeline, the classifier and the geodata
/// collaborator. Nothing here is retried; callers report upward.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("failed to load model from {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("geodata unavailable: {0}")]
    GeodataUnavailable(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the request-side failures (missing, malformed or out-of-range
    /// input) as opposed to model, geodata or IO failures.
    pub fn is_input_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidField { .. } | Self::MalformedRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
