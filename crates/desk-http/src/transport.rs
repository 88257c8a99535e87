//! Transport seam between the client and the network.

use crate::error::{excerpt, HttpError, HttpResult};
use crate::request::{ApiRequest, ApiResponse, FormPart, MultipartForm, RequestBody};
use crate::token::AccessToken;
use async_trait::async_trait;
use observability::redact_json;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A request ready to go on the wire.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request: ApiRequest,
    pub bearer: Option<AccessToken>,
}

impl PreparedRequest {
    pub fn new(request: ApiRequest, bearer: Option<AccessToken>) -> Self {
        Self { request, bearer }
    }

    /// Value of the `Authorization` header, if any.
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(AccessToken::bearer)
    }
}

/// Sends one prepared request and returns the raw response.
///
/// Non-2xx answers are returned as responses, not errors. Only failures that
/// prevent a response from arriving are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> HttpResult<ApiResponse>;
}

/// Production transport backed by `reqwest`.
///
/// The cookie store keeps the HTTP-only refresh cookie set by the login
/// endpoint so the refresh call can present it.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// The base path is kept as a prefix of every request path.
    pub fn new(mut base_url: Url) -> HttpResult<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HttpError::Transport {
                url: base_url.to_string(),
                message: e.to_string(),
                transient: false,
            })?;
        Ok(Self { client, base_url })
    }

    /// Build from a base URL string such as `http://localhost:8080`.
    pub fn from_base(base_url: &str) -> HttpResult<Self> {
        Self::new(Url::parse(base_url)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, request: &ApiRequest) -> HttpResult<Url> {
        let mut url = self.base_url.join(request.path.trim_start_matches('/'))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Body text for debug logs, with credential-like JSON fields masked.
fn loggable_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(mut value) => {
            redact_json(&mut value);
            excerpt(&value.to_string())
        }
        Err(_) => excerpt(&String::from_utf8_lossy(body)),
    }
}

fn log_response(url: &str, status: u16, body: &[u8]) {
    debug!(url = %url, status, body = %loggable_body(body), "Received response");
}

fn to_form(form: &MultipartForm, url: &str) -> HttpResult<Form> {
    let mut out = Form::new();
    for part in form.parts() {
        out = match part {
            FormPart::Text { name, value } => out.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let file = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|e| HttpError::Encode {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;
                out.part(name.clone(), file)
            }
        };
    }
    Ok(out)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, prepared: &PreparedRequest) -> HttpResult<ApiResponse> {
        let request = &prepared.request;
        let url = self.resolve(request)?;
        let url_str = url.to_string();

        debug!(method = %request.method, url = %url_str, "Sending request");

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(header) = prepared.authorization() {
            builder = builder.header(reqwest::header::AUTHORIZATION, header);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(form) => builder.multipart(to_form(form, &url_str)?),
        };

        let response = builder.send().await.map_err(|e| {
            let transient = e.is_connect() || e.is_timeout();
            warn!(url = %url_str, error = %e, transient, "Request failed before a response");
            HttpError::Transport {
                url: url_str.clone(),
                message: e.to_string(),
                transient,
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| HttpError::Transport {
            url: url_str.clone(),
            message: format!("failed to read body: {}", e),
            transient: false,
        })?;

        log_response(&url_str, status, &body);

        Ok(ApiResponse {
            status,
            url: url_str,
            content_type,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_joins_path_and_query() {
        let transport = ReqwestTransport::from_base("http://localhost:8080").unwrap();
        let request = ApiRequest::get("/api/requests")
            .query("page", 0)
            .query("searchTerm", "leaking tap");
        let url = transport.resolve(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/requests?page=0&searchTerm=leaking+tap"
        );
    }

    #[test]
    fn test_resolve_keeps_base_path_prefix() {
        let request = ApiRequest::get("/api/requests").query("page", 1);
        for base in ["https://desk.example.com/backend", "https://desk.example.com/backend/"] {
            let transport = ReqwestTransport::from_base(base).unwrap();
            assert_eq!(
                transport.resolve(&request).unwrap().as_str(),
                "https://desk.example.com/backend/api/requests?page=1"
            );
        }
    }

    #[test]
    fn test_response_log_hides_access_token() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || LogSink(sink.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            log_response(
                "http://localhost:8080/api/auth/refresh",
                200,
                br#"{"accessToken":"eyJhbGciOi.very-secret"}"#,
            );
            log_response(
                "http://localhost:8080/api/requests",
                200,
                br#"{"content":[{"requestID":7}]}"#,
            );
        });

        let logged = String::from_utf8(captured.lock().clone()).unwrap();
        assert!(logged.contains("Received response"));
        assert!(logged.contains("requestID"));
        assert!(!logged.contains("very-secret"));
    }

    #[test]
    fn test_loggable_body_keeps_plain_text() {
        assert_eq!(loggable_body(b"Bad credentials"), "Bad credentials");
    }

    #[test]
    fn test_from_base_rejects_garbage() {
        assert!(matches!(
            ReqwestTransport::from_base("not a url"),
            Err(HttpError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_authorization_header_value() {
        let prepared = PreparedRequest::new(
            ApiRequest::get("/api/user/whoami"),
            Some(AccessToken::new("t-1")),
        );
        assert_eq!(prepared.authorization().as_deref(), Some("Bearer t-1"));

        let anonymous = PreparedRequest::new(ApiRequest::get("/api/user/whoami"), None);
        assert!(anonymous.authorization().is_none());
    }

    #[test]
    fn test_to_form_rejects_bad_mime() {
        let form = MultipartForm::new().file("files", "a.bin", "not a mime", vec![0]);
        assert!(matches!(
            to_form(&form, "/api/requests/1/photos"),
            Err(HttpError::Encode { .. })
        ));
    }
}
