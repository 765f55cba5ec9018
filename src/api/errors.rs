use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::types::TypeConstraintError;

/// Failures raised while talking to the Remote Contact Store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The addressed contact does not exist (HTTP 404 on a resource URL).
    #[error("Contact not found")]
    NotFound,

    /// The response body could not be interpreted.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The client itself is misconfigured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// Maps a 404 on a resource URL to [`ApiError::NotFound`].
    pub(crate) fn not_found_on_404(self) -> Self {
        match self {
            ApiError::Http { status: 404, .. } => ApiError::NotFound,
            other => other,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::http(status, err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<TypeConstraintError> for ApiError {
    fn from(err: TypeConstraintError) -> Self {
        ApiError::Decode(err.to_string())
    }
}
