//! Authenticated API client with transparent token refresh.
//!
//! Every request carries the attached bearer token. A 401 on a request that
//! has not been retried yet triggers one refresh through the
//! [`RefreshCoordinator`], after which the request is replayed once with the
//! new token. Concurrent 401s share a single refresh call.

use crate::attempt::{AttemptInput, RequestAttempt};
use crate::cancel::CancelToken;
use crate::coordinator::{RefreshCoordinator, RefreshRole};
use crate::error::{excerpt, HttpError, HttpResult};
use crate::request::{ApiRequest, ApiResponse, MultipartForm};
use crate::token::{AccessToken, TokenResponse};
use crate::transport::{PreparedRequest, Transport};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Paths of the authentication endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login: String,
    pub refresh: String,
    pub logout: String,
    pub whoami: String,
    pub register: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/api/auth/login".to_string(),
            refresh: "/api/auth/refresh".to_string(),
            logout: "/api/auth/logout".to_string(),
            whoami: "/api/user/whoami".to_string(),
            register: "/api/auth/register".to_string(),
        }
    }
}

/// Observer for refresh outcomes driven by the client.
pub trait SessionListener: Send + Sync {
    /// A refresh produced a new access token.
    fn token_refreshed(&self, _token: &AccessToken) {}

    /// A refresh triggered by a 401 failed. Called once per failed refresh.
    fn refresh_failed(&self, error: &HttpError);
}

/// HTTP client shared by every API call of one session.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    endpoints: AuthEndpoints,
    token: RwLock<Option<AccessToken>>,
    coordinator: RefreshCoordinator,
    listener: Mutex<Option<Weak<dyn SessionListener>>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_endpoints(transport, AuthEndpoints::default())
    }

    pub fn with_endpoints(transport: Arc<dyn Transport>, endpoints: AuthEndpoints) -> Self {
        Self {
            transport,
            endpoints,
            token: RwLock::new(None),
            coordinator: RefreshCoordinator::new(),
            listener: Mutex::new(None),
        }
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Attach or detach the bearer token sent with every request.
    pub fn attach_access_token(&self, token: Option<AccessToken>) {
        debug!(attached = token.is_some(), "Access token updated");
        *self.token.write() = token;
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.token.read().clone()
    }

    /// Register the observer notified of refresh outcomes. Replaces any previous one.
    pub fn set_listener(&self, listener: Weak<dyn SessionListener>) {
        *self.listener.lock() = Some(listener);
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    pub fn pending_refresh_waiters(&self) -> usize {
        self.coordinator.pending()
    }

    /// Send a request, refreshing the token and replaying once on a 401.
    pub async fn send(&self, request: ApiRequest) -> HttpResult<ApiResponse> {
        self.send_with_cancel(request, &CancelToken::never()).await
    }

    /// Like [`send`](Self::send), but gives up with `Cancelled` once `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        request: ApiRequest,
        cancel: &CancelToken,
    ) -> HttpResult<ApiResponse> {
        let mut attempt = RequestAttempt::new();
        let mut bearer = self.access_token();

        loop {
            if cancel.is_cancelled() {
                attempt.transition(AttemptInput::Cancel)?;
                return Err(HttpError::Cancelled);
            }

            let prepared = PreparedRequest::new(request.clone(), bearer.clone());
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    attempt.transition(AttemptInput::Cancel)?;
                    return Err(HttpError::Cancelled);
                }
                outcome = self.transport.send(&prepared) => outcome,
            };

            let response = match outcome {
                Ok(response) => response,
                Err(err) => {
                    warn!(
                        url = %request.display_target(),
                        error = %err,
                        "Request failed"
                    );
                    attempt.transition(AttemptInput::Error)?;
                    return Err(err);
                }
            };

            if response.is_success() {
                attempt.transition(AttemptInput::Success)?;
                return Ok(response);
            }

            if response.status == 401 && attempt.can_refresh() && !self.is_refresh_path(&request) {
                attempt.transition(AttemptInput::Unauthorized)?;
                debug!(url = %request.display_target(), "Access token rejected, refreshing");

                match self.refresh_for_request(cancel).await {
                    Ok(token) => {
                        if cancel.is_cancelled() {
                            attempt.transition(AttemptInput::Cancel)?;
                            return Err(HttpError::Cancelled);
                        }
                        attempt.transition(AttemptInput::RefreshOk)?;
                        bearer = Some(token);
                        continue;
                    }
                    Err(err) => {
                        let input = if err.is_cancelled() {
                            AttemptInput::Cancel
                        } else {
                            AttemptInput::RefreshErr
                        };
                        attempt.transition(input)?;
                        return Err(err);
                    }
                }
            }

            warn!(
                url = %response.url,
                status = response.status,
                body = %excerpt(&response.text()),
                replayed = attempt.is_replayed(),
                "Request returned error status"
            );
            attempt.transition(AttemptInput::Error)?;
            return Err(response.into_error());
        }
    }

    /// Refresh the access token explicitly, sharing any refresh already running.
    ///
    /// Does not notify the listener on failure.
    pub async fn refresh_session(&self) -> HttpResult<AccessToken> {
        self.coordinate_refresh(&CancelToken::never(), false).await
    }

    async fn refresh_for_request(&self, cancel: &CancelToken) -> HttpResult<AccessToken> {
        self.coordinate_refresh(cancel, true).await
    }

    async fn coordinate_refresh(
        &self,
        cancel: &CancelToken,
        notify_failure: bool,
    ) -> HttpResult<AccessToken> {
        match self.coordinator.acquire() {
            RefreshRole::Leader(lease) => {
                // Other requests are queued on this call; the caller's own
                // cancel signal does not abort it.
                let outcome = self.call_refresh_endpoint().await;
                match &outcome {
                    Ok(token) => {
                        *self.token.write() = Some(token.clone());
                        info!("Access token refreshed");
                    }
                    Err(err) => {
                        error!(error = %err, "Token refresh failed");
                    }
                }
                lease.settle(outcome.clone());

                match &outcome {
                    Ok(token) => self.notify(|listener| listener.token_refreshed(token)),
                    Err(err) if notify_failure && !err.is_cancelled() => {
                        self.notify(|listener| listener.refresh_failed(err))
                    }
                    Err(_) => {}
                }
                outcome
            }
            RefreshRole::Follower(rx) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(HttpError::Cancelled),
                    settled = rx => settled.unwrap_or(Err(HttpError::Cancelled)),
                }
            }
        }
    }

    async fn call_refresh_endpoint(&self) -> HttpResult<AccessToken> {
        let prepared = PreparedRequest::new(ApiRequest::post(self.endpoints.refresh.clone()), None);
        let response = self.transport.send(&prepared).await?;
        if !response.is_success() {
            warn!(
                url = %response.url,
                status = response.status,
                body = %excerpt(&response.text()),
                "Refresh endpoint rejected the session"
            );
            return Err(response.into_error());
        }
        let parsed: TokenResponse = response.decode()?;
        Ok(parsed.access_token)
    }

    fn is_refresh_path(&self, request: &ApiRequest) -> bool {
        request.path.contains(self.endpoints.refresh.as_str())
    }

    fn notify(&self, f: impl FnOnce(&dyn SessionListener)) {
        let listener = self.listener.lock().as_ref().and_then(Weak::upgrade);
        if let Some(listener) = listener {
            f(listener.as_ref());
        }
    }

    /// Send and decode a JSON response.
    pub async fn json<T: DeserializeOwned>(&self, request: ApiRequest) -> HttpResult<T> {
        self.send(request).await?.decode()
    }

    /// Send and discard the response body.
    pub async fn execute(&self, request: ApiRequest) -> HttpResult<()> {
        self.send(request).await.map(|_| ())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> HttpResult<T> {
        self.json(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> HttpResult<()> {
        self.execute(ApiRequest::delete(path)).await
    }

    pub async fn get_bytes(&self, path: &str) -> HttpResult<Vec<u8>> {
        Ok(self.send(ApiRequest::get(path)).await?.body)
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> HttpResult<T> {
        self.json(ApiRequest::post(path).multipart(form)).await
    }

    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> HttpResult<T> {
        self.json(ApiRequest::put(path).multipart(form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, RefreshOutcome};
    use serde_json::json;

    fn client_with(backend: &Arc<MockBackend>) -> ApiClient {
        ApiClient::new(backend.clone())
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_token_set() {
        let backend = MockBackend::new();
        backend.set_valid_token("t-1");
        backend.route("/api/shops", json!([]));
        let client = client_with(&backend);

        client.attach_access_token(Some(AccessToken::new("t-1")));
        let _: serde_json::Value = client.get_json("/api/shops").await.unwrap();

        let recorded = backend.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].authorization.as_deref(), Some("Bearer t-1"));
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let backend = MockBackend::new();
        backend.public_route("/api/auth/register", json!({}));
        let client = client_with(&backend);

        client
            .execute(ApiRequest::post("/api/auth/register"))
            .await
            .unwrap();
        assert!(backend.requests()[0].authorization.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_replayed() {
        let backend = MockBackend::new();
        backend.set_valid_token("fresh");
        backend.push_refresh(RefreshOutcome::Issue("fresh".into()));
        backend.route("/api/requests", json!({"content": []}));
        let client = client_with(&backend);
        client.attach_access_token(Some(AccessToken::new("stale")));

        let body: serde_json::Value = client.get_json("/api/requests").await.unwrap();
        assert_eq!(body, json!({"content": []}));
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(client.access_token().unwrap().as_str(), "fresh");

        let paths: Vec<_> = backend.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec!["/api/requests", "/api/auth/refresh", "/api/requests"]
        );
    }

    #[tokio::test]
    async fn test_refresh_request_carries_no_bearer() {
        let backend = MockBackend::new();
        backend.push_refresh(RefreshOutcome::Issue("fresh".into()));
        let client = client_with(&backend);
        client.attach_access_token(Some(AccessToken::new("stale")));

        client.refresh_session().await.unwrap();
        let refresh = &backend.requests()[0];
        assert_eq!(refresh.path, "/api/auth/refresh");
        assert!(refresh.authorization.is_none());
    }

    #[tokio::test]
    async fn test_non_401_errors_pass_through() {
        let backend = MockBackend::new();
        backend.set_valid_token("t-1");
        let client = client_with(&backend);
        client.attach_access_token(Some(AccessToken::new("t-1")));

        let err = client.get_json::<serde_json::Value>("/api/missing").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_request_is_not_sent() {
        let backend = MockBackend::new();
        let client = client_with(&backend);
        let source = crate::cancel::CancelSource::new();
        source.cancel();

        let err = client
            .send_with_cancel(ApiRequest::get("/api/shops"), &source.token())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_session_failure_does_not_notify() {
        struct Counter(std::sync::atomic::AtomicUsize);
        impl SessionListener for Counter {
            fn refresh_failed(&self, _error: &HttpError) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let backend = MockBackend::new();
        let client = client_with(&backend);
        let counter = Arc::new(Counter(std::sync::atomic::AtomicUsize::new(0)));
        let weak: Weak<dyn SessionListener> = Arc::downgrade(&counter) as Weak<dyn SessionListener>;
        client.set_listener(weak);

        let err = client.refresh_session().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(!client.is_refreshing());
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = AuthEndpoints::default();
        assert_eq!(endpoints.refresh, "/api/auth/refresh");
        assert_eq!(endpoints.whoami, "/api/user/whoami");
    }
}
