//! Authentication error types.

use desk_http::HttpError;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login rejected the credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Http(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_delegates_to_http() {
        let err = AuthError::from(HttpError::status(502, "/api/auth/login", "bad gateway"));
        assert!(err.is_transient());
        assert!(!AuthError::InvalidStateTransition("stale".into()).is_transient());
        assert!(!AuthError::InvalidCredentials("bad".into()).is_transient());
    }
}
