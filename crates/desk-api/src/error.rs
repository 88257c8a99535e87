//! API error types.

use desk_http::HttpError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Input rejected before sending, mirroring server-side validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http(err) => err.status_code(),
            ApiError::InvalidArgument(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
