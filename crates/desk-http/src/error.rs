//! HTTP client error types.

use thiserror::Error;

/// Longest response body excerpt kept in errors and logs.
pub(crate) const BODY_EXCERPT_LIMIT: usize = 512;

/// HTTP client error type.
///
/// Cloneable so that a single refresh failure can be handed to every request
/// queued behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Connection, TLS, or protocol failure before a response arrived.
    #[error("Transport error for {url}: {message}")]
    Transport {
        url: String,
        message: String,
        /// Connect or timeout failures; the request never reached the handler.
        transient: bool,
    },

    /// Response body could not be decoded into the expected shape.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Request could not be encoded (e.g. a JSON body failed to serialize).
    #[error("Failed to encode request for {url}: {message}")]
    Encode { url: String, message: String },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// Base URL and path could not be joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The per-request lifecycle rejected a transition.
    #[error("Invalid request attempt transition: {0}")]
    InvalidAttemptTransition(String),
}

impl HttpError {
    /// Build a status error, keeping a bounded excerpt of the body.
    pub fn status(status: u16, url: impl Into<String>, body: &str) -> Self {
        HttpError::Status {
            status,
            url: url.into(),
            body: excerpt(body),
        }
    }

    /// HTTP status code, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a 401 answer.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled)
    }

    /// Returns true if repeating the request later could succeed.
    ///
    /// Transient errors are connect/timeout failures and 5xx answers.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Transport { transient, .. } => *transient,
            HttpError::Status { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::InvalidUrl(err.to_string())
    }
}

/// Truncate a body to [`BODY_EXCERPT_LIMIT`] bytes on a char boundary.
pub(crate) fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes)", &body[..end], body.len())
}

/// Result type alias using HttpError.
pub type HttpResult<T> = Result<T, HttpError>;
