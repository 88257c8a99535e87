//! Authenticated HTTP client for the facility desk API.
//!
//! - [`ApiClient`]: bearer attachment, 401 interception, single replay
//! - [`RefreshCoordinator`]: one refresh call shared by every waiting request
//! - [`Transport`]: network seam, with [`ReqwestTransport`] for production
//!   and `testing::MockBackend` (feature `testing`) for tests

pub mod attempt;
pub mod cancel;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod token;
pub mod transport;

#[cfg(test)]
mod tests;

pub use attempt::{AttemptInput, AttemptState, RequestAttempt};
pub use cancel::{CancelSource, CancelToken};
pub use client::{ApiClient, AuthEndpoints, SessionListener};
pub use coordinator::{RefreshCoordinator, RefreshLease, RefreshRole};
pub use error::{HttpError, HttpResult};
pub use request::{ApiRequest, ApiResponse, FormPart, MultipartForm, RequestBody};
pub use token::{AccessToken, TokenResponse};
pub use transport::{PreparedRequest, ReqwestTransport, Transport};
