use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Ad request '{label}' is not valid JSON: {details}")]
    MalformedInput { label: String, details: String },

    #[error("Cannot determine context of ad request '{label}': {details}")]
    AmbiguousContext { label: String, details: String },

    #[error("The analysis returned an invalid format: {details}")]
    InvalidResponseFormat { details: String },

    #[error("The analysis response does not match the expected schema at '{path}': {details}")]
    SchemaMismatch { path: String, details: String },

    #[error("The analysis service failed: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Caller-facing error payload: a short message plus optional diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AuditError> for ErrorReport {
    fn from(err: &AuditError) -> Self {
        let (error, details) = match err {
            AuditError::MissingFields(fields) => {
                ("Missing required fields".to_string(), Some(fields.clone()))
            }
            AuditError::MalformedInput { label, details } => (
                format!("Ad request '{}' is not valid JSON", label),
                Some(details.clone()),
            ),
            AuditError::AmbiguousContext { label, details } => (
                format!("Cannot determine context of ad request '{}'", label),
                Some(details.clone()),
            ),
            AuditError::InvalidResponseFormat { details } => (
                "The analysis returned an invalid format. Please try again.".to_string(),
                Some(details.clone()),
            ),
            AuditError::SchemaMismatch { path, details } => (
                "The analysis response did not match the expected structure.".to_string(),
                Some(format!("{}: {}", path, details)),
            ),
            AuditError::Engine(details) => (
                "The analysis service failed.".to_string(),
                Some(details.clone()),
            ),
            other => (other.to_string(), None),
        };
        ErrorReport { error, details }
    }
}

impl From<AuditError> for ErrorReport {
    fn from(err: AuditError) -> Self {
        ErrorReport::from(&err)
    }
}
