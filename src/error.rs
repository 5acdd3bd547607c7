// src/error.rs
// Error taxonomy shared by the discussion engine, the analysts and the API layer.

use thiserror::Error;

/// Failures raised by a generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service is disabled")]
    Disabled,

    #[error("generation request failed: {0}")]
    Http(String),

    #[error("generation service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service returned an empty response")]
    EmptyResponse,

    #[error("could not decode generation response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Http(err.to_string())
    }
}

/// Errors observed by callers of the top-level operations.
#[derive(Debug, Error)]
pub enum FocusGroupError {
    #[error("generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("malformed structured response: {0}")]
    MalformedResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("export failed: {0}")]
    Export(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FocusGroupError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<csv::Error> for FocusGroupError {
    fn from(err: csv::Error) -> Self {
        FocusGroupError::Export(err.to_string())
    }
}

impl From<std::io::Error> for FocusGroupError {
    fn from(err: std::io::Error) -> Self {
        FocusGroupError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for FocusGroupError {
    fn from(err: serde_json::Error) -> Self {
        FocusGroupError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FocusGroupError>;
