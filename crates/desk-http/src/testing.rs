//! Scripted in-memory backend for tests.
//!
//! Behaves like the real API for the parts the client cares about: protected
//! routes answer 401 unless the bearer matches the currently valid token,
//! the refresh endpoint follows a queue of scripted outcomes, and refresh
//! calls can be held open to build up a queue of waiting requests.

use crate::error::HttpResult;
use crate::request::{ApiResponse, RequestBody};
use crate::transport::{PreparedRequest, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

/// Scripted answer for one refresh call.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Mint this token and make it the valid one.
    Issue(String),
    /// Answer with this status.
    Reject(u16),
}

/// A request as seen by the backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: RequestBody,
}

#[derive(Default)]
struct Script {
    valid_token: Option<String>,
    refresh_outcomes: VecDeque<RefreshOutcome>,
    credentials: HashMap<(String, String), String>,
    protected: HashMap<String, Value>,
    public: HashMap<String, Value>,
    failing: HashMap<String, u16>,
    requests: Vec<RecordedRequest>,
    refresh_calls: usize,
}

pub struct MockBackend {
    refresh_path: String,
    login_path: String,
    script: Mutex<Script>,
    gate: watch::Sender<bool>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        Arc::new(Self {
            refresh_path: "/api/auth/refresh".to_string(),
            login_path: "/api/auth/login".to_string(),
            script: Mutex::new(Script::default()),
            gate,
        })
    }

    pub fn set_valid_token(&self, token: &str) {
        self.script.lock().valid_token = Some(token.to_string());
    }

    pub fn push_refresh(&self, outcome: RefreshOutcome) {
        self.script.lock().refresh_outcomes.push_back(outcome);
    }

    /// Accept these credentials on the login endpoint and issue `token`.
    pub fn accept_login(&self, login: &str, password: &str, token: &str) {
        self.script
            .lock()
            .credentials
            .insert((login.to_string(), password.to_string()), token.to_string());
    }

    /// A route that requires the valid bearer token.
    pub fn route(&self, path: &str, body: Value) {
        self.script.lock().protected.insert(path.to_string(), body);
    }

    /// A route that answers regardless of authorization.
    pub fn public_route(&self, path: &str, body: Value) {
        self.script.lock().public.insert(path.to_string(), body);
    }

    /// A route that always answers with `status`.
    pub fn fail_route(&self, path: &str, status: u16) {
        self.script.lock().failing.insert(path.to_string(), status);
    }

    /// Block refresh calls until [`release_refresh`](Self::release_refresh).
    pub fn hold_refresh(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_refresh(&self) {
        self.gate.send_replace(true);
    }

    pub fn refresh_calls(&self) -> usize {
        self.script.lock().refresh_calls
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().requests.clone()
    }

    /// Requests sent to `path`, in order.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.script
            .lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    async fn refresh(&self, url: &str) -> ApiResponse {
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut script = self.script.lock();
        match script.refresh_outcomes.pop_front() {
            Some(RefreshOutcome::Issue(token)) => {
                script.valid_token = Some(token.clone());
                ApiResponse::json(200, url, &json!({ "accessToken": token }))
            }
            Some(RefreshOutcome::Reject(status)) => {
                ApiResponse::json(status, url, &json!({ "error": "refresh rejected" }))
            }
            None => ApiResponse::json(401, url, &json!({ "error": "no refresh cookie" })),
        }
    }

    fn login(&self, url: &str, body: &RequestBody) -> ApiResponse {
        let (login, password) = match body {
            RequestBody::Json(value) => (
                value["login"].as_str().unwrap_or_default().to_string(),
                value["password"].as_str().unwrap_or_default().to_string(),
            ),
            _ => (String::new(), String::new()),
        };
        let mut script = self.script.lock();
        match script.credentials.get(&(login.clone(), password)).cloned() {
            Some(token) => {
                script.valid_token = Some(token.clone());
                ApiResponse::json(200, url, &json!({ "accessToken": token, "login": login }))
            }
            None => ApiResponse::json(401, url, &json!({ "error": "Bad credentials" })),
        }
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(&self, prepared: &PreparedRequest) -> HttpResult<ApiResponse> {
        let request = &prepared.request;
        let path = request.path.clone();
        let authorization = prepared.authorization();

        {
            let mut script = self.script.lock();
            script.requests.push(RecordedRequest {
                method: request.method.to_string(),
                path: path.clone(),
                query: request.query.clone(),
                authorization: authorization.clone(),
                body: request.body.clone(),
            });
            if path == self.refresh_path {
                script.refresh_calls += 1;
            }
        }

        if path == self.refresh_path {
            return Ok(self.refresh(&path).await);
        }
        if path == self.login_path {
            return Ok(self.login(&path, &request.body));
        }

        let script = self.script.lock();
        if let Some(status) = script.failing.get(&path) {
            return Ok(ApiResponse::json(*status, &path, &json!({ "error": "scripted" })));
        }
        if let Some(body) = script.public.get(&path) {
            return Ok(ApiResponse::json(200, &path, body));
        }
        if let Some(body) = script.protected.get(&path) {
            let expected = script.valid_token.as_ref().map(|t| format!("Bearer {}", t));
            if authorization.is_some() && authorization == expected {
                return Ok(ApiResponse::json(200, &path, body));
            }
            return Ok(ApiResponse::json(401, &path, &json!({ "error": "token expired" })));
        }
        Ok(ApiResponse::json(404, &path, &json!({ "error": "not found" })))
    }
}
