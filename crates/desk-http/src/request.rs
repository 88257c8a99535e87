//! Request and response values passed through the client.
//!
//! Requests are plain data so that one can be replayed after a token refresh
//! without re-running the caller's code.

use crate::error::{excerpt, HttpError, HttpResult};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One file or text field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Multipart form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query pair. Repeated keys are kept in order.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query pair only when the value is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> HttpResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| HttpError::Encode {
            url: self.path.clone(),
            message: e.to_string(),
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Path plus encoded query, for logs and errors.
    pub fn display_target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

/// A response as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            url: url.into(),
            content_type: None,
            body,
        }
    }

    /// JSON response helper, mostly for transports that fabricate answers.
    pub fn json(status: u16, url: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            status,
            url: url.into(),
            content_type: Some("application/json".to_string()),
            body: value.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn decode<T: DeserializeOwned>(&self) -> HttpResult<T> {
        let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
        serde_json::from_slice(bytes).map_err(|e| HttpError::Decode {
            url: self.url.clone(),
            message: format!("{} (body: {})", e, excerpt(&self.text())),
        })
    }

    /// Convert a non-success response into its error.
    pub fn into_error(self) -> HttpError {
        HttpError::status(self.status, self.url.clone(), &self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_query_builders() {
        let request = ApiRequest::get("/api/requests")
            .query("page", 0)
            .query("sort", "createdAt,desc")
            .query("sort", "requestID,asc")
            .query_opt("shopId", None::<i32>)
            .query_opt("status", Some("InWork"));

        assert_eq!(
            request.display_target(),
            "/api/requests?page=0&sort=createdAt,desc&sort=requestID,asc&status=InWork"
        );
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("/api/auth/login")
            .json(&serde_json::json!({"login": "admin"}))
            .unwrap();
        assert_eq!(
            request.body,
            RequestBody::Json(serde_json::json!({"login": "admin"}))
        );
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let response = ApiResponse::new(204, "/api/requests/1", Vec::new());
        let value: Option<u32> = response.decode().unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_decode_error_carries_url() {
        #[derive(Debug, Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            id: u32,
        }

        let response = ApiResponse::new(200, "/api/shops", b"{\"id\":\"x\"}".to_vec());
        let err = response.decode::<Shape>().unwrap_err();
        match err {
            HttpError::Decode { url, .. } => assert_eq!(url, "/api/shops"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multipart_builder() {
        let form = MultipartForm::new()
            .text("message", "hello")
            .file("image", "a.jpg", "image/jpeg", vec![1, 2, 3]);
        assert_eq!(form.parts().len(), 2);
        assert!(!form.is_empty());
    }
}
