use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid catalog item: {0}")]
    InvalidItem(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a search backend, with the backend's own code and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Errors surfaced by a search request.
///
/// Unknown filter tags are not an error; they are dropped when the request is built.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The backend could not run the pipeline. Never retried by the composer.
    #[error("search backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    /// Reserved for structural request validation.
    #[error("malformed search request: {0}")]
    MalformedRequest(String),
}
