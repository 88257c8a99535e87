//! Maintenance requests with their comments and photos.

use crate::api::DeskApi;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageRequest, Paged};
use chrono::NaiveDateTime;
use desk_http::{ApiRequest, MultipartForm};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

const REQUESTS: &str = "/api/requests";

pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_COMMENT_LEN: usize = 1000;

/// Lifecycle status of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    InWork,
    Done,
    Closed,
    Other(String),
}

impl RequestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RequestStatus::InWork => "In work",
            RequestStatus::Done => "Done",
            RequestStatus::Closed => "Closed",
            RequestStatus::Other(value) => value,
        }
    }
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "In work" => RequestStatus::InWork,
            "Done" => RequestStatus::Done,
            "Closed" => RequestStatus::Closed,
            _ => RequestStatus::Other(value),
        }
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    #[serde(rename = "requestID")]
    pub request_id: i32,
    pub description: String,
    pub shop_name: Option<String>,
    #[serde(rename = "shopID")]
    pub shop_id: Option<i32>,
    pub work_category_name: Option<String>,
    #[serde(rename = "workCategoryID")]
    pub work_category_id: Option<i32>,
    pub urgency_name: Option<String>,
    #[serde(rename = "urgencyID")]
    pub urgency_id: Option<i32>,
    pub assigned_contractor_name: Option<String>,
    #[serde(rename = "assignedContractorID")]
    pub assigned_contractor_id: Option<i32>,
    pub status: RequestStatus,
    pub created_at: Option<NaiveDateTime>,
    /// Negative once the deadline has passed.
    pub days_remaining: Option<i32>,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub photo_count: u64,
}

impl RequestResponse {
    pub fn is_overdue(&self) -> bool {
        self.status != RequestStatus::Closed && self.days_remaining.is_some_and(|d| d < 0)
    }
}

/// Create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRequestRequest {
    pub description: String,
    #[serde(rename = "shopID")]
    pub shop_id: i32,
    #[serde(rename = "workCategoryID")]
    pub work_category_id: i32,
    #[serde(rename = "urgencyID")]
    pub urgency_id: i32,
    #[serde(rename = "assignedContractorID", skip_serializing_if = "Option::is_none")]
    pub assigned_contractor_id: Option<i32>,
    /// Overrides the urgency's default deadline.
    #[serde(rename = "customDays", skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<u32>,
}

impl CreateRequestRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_description(&self.description)?;
        validate_custom_days(self.custom_days)
    }
}

/// Update payload; also used to change the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequestRequest {
    pub description: String,
    #[serde(rename = "shopID")]
    pub shop_id: i32,
    #[serde(rename = "workCategoryID")]
    pub work_category_id: i32,
    #[serde(rename = "urgencyID")]
    pub urgency_id: i32,
    #[serde(rename = "assignedContractorID", skip_serializing_if = "Option::is_none")]
    pub assigned_contractor_id: Option<i32>,
    #[serde(rename = "customDays", skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<u32>,
    pub status: RequestStatus,
}

fn validate_description(description: &str) -> ApiResult<()> {
    if description.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "description must not be blank".to_string(),
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::InvalidArgument(format!(
            "description exceeds {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

fn validate_custom_days(days: Option<u32>) -> ApiResult<()> {
    match days {
        Some(0) => Err(ApiError::InvalidArgument(
            "custom days must be at least 1".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Filters of the request list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub archived: bool,
    pub search_term: Option<String>,
    pub shop_id: Option<i32>,
    pub work_category_id: Option<i32>,
    pub urgency_id: Option<i32>,
    pub contractor_id: Option<i32>,
    pub overdue: bool,
    pub status: Option<RequestStatus>,
}

impl RequestFilter {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        let search = self
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let request = request
            .query("archived", self.archived)
            .query_opt("searchTerm", search)
            .query_opt("shopId", self.shop_id)
            .query_opt("workCategoryId", self.work_category_id)
            .query_opt("urgencyId", self.urgency_id)
            .query_opt("contractorId", self.contractor_id);
        let request = if self.overdue {
            request.query("overdue", true)
        } else {
            request
        };
        request.query_opt("status", self.status.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(rename = "commentID")]
    pub comment_id: i32,
    #[serde(rename = "requestID")]
    pub request_id: i32,
    pub user_login: String,
    pub comment_text: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest<'a> {
    comment_text: &'a str,
}

/// A photo to attach to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DeskApi {
    /// List requests. Filters precede the paging parameters in the query.
    pub async fn list_requests(
        &self,
        page: &PageRequest,
        filter: &RequestFilter,
    ) -> ApiResult<Paged<RequestResponse>> {
        let request = page.apply(filter.apply(ApiRequest::get(REQUESTS)));
        debug!(target_url = %request.display_target(), "Listing requests");
        Ok(self.client().json(request).await?)
    }

    pub async fn create_request(&self, body: &CreateRequestRequest) -> ApiResult<RequestResponse> {
        body.validate()?;
        let created: RequestResponse = self.client().post_json(REQUESTS, body).await?;
        info!(request_id = created.request_id, "Request created");
        Ok(created)
    }

    pub async fn update_request(
        &self,
        request_id: i32,
        body: &UpdateRequestRequest,
    ) -> ApiResult<RequestResponse> {
        validate_description(&body.description)?;
        validate_custom_days(body.custom_days)?;
        Ok(self
            .client()
            .put_json(&request_path(request_id), body)
            .await?)
    }

    pub async fn delete_request(&self, request_id: i32) -> ApiResult<()> {
        Ok(self.client().delete(&request_path(request_id)).await?)
    }

    /// Bring an archived request back to the active list.
    pub async fn restore_request(&self, request_id: i32) -> ApiResult<()> {
        let path = format!("{}/restore", request_path(request_id));
        let request = ApiRequest::put(path).json(&serde_json::json!({}))?;
        self.client().execute(request).await?;
        info!(request_id, "Request restored");
        Ok(())
    }

    /// Mark the work as done.
    pub async fn complete_request(&self, request_id: i32) -> ApiResult<()> {
        let path = format!("{}/complete", request_path(request_id));
        self.client().execute(ApiRequest::put(path)).await?;
        info!(request_id, "Request completed");
        Ok(())
    }

    pub async fn list_comments(&self, request_id: i32) -> ApiResult<Vec<CommentResponse>> {
        let path = format!("{}/comments", request_path(request_id));
        Ok(self.client().get_json(&path).await?)
    }

    pub async fn add_comment(&self, request_id: i32, text: &str) -> ApiResult<CommentResponse> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::InvalidArgument(
                "comment must not be blank".to_string(),
            ));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(ApiError::InvalidArgument(format!(
                "comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }
        let path = format!("{}/comments", request_path(request_id));
        Ok(self
            .client()
            .post_json(&path, &CreateCommentRequest { comment_text: text })
            .await?)
    }

    pub async fn delete_comment(&self, comment_id: i32) -> ApiResult<()> {
        Ok(self
            .client()
            .delete(&format!("{}/comments/{}", REQUESTS, comment_id))
            .await?)
    }

    pub async fn list_photo_ids(&self, request_id: i32) -> ApiResult<Vec<i64>> {
        let path = format!("{}/photos/ids", request_path(request_id));
        Ok(self.client().get_json(&path).await?)
    }

    /// Raw image bytes of one photo.
    pub async fn photo(&self, photo_id: i64) -> ApiResult<Vec<u8>> {
        Ok(self
            .client()
            .get_bytes(&format!("{}/photos/{}", REQUESTS, photo_id))
            .await?)
    }

    /// Upload photos as repeated `files` parts.
    pub async fn upload_photos(&self, request_id: i32, photos: &[PhotoUpload]) -> ApiResult<()> {
        if photos.is_empty() {
            return Err(ApiError::InvalidArgument("no photos to upload".to_string()));
        }
        let form = photos.iter().fold(MultipartForm::new(), |form, photo| {
            form.file("files", &photo.file_name, &photo.mime, photo.bytes.clone())
        });
        let path = format!("{}/photos", request_path(request_id));
        self.client()
            .execute(ApiRequest::post(path).multipart(form))
            .await?;
        info!(request_id, count = photos.len(), "Photos uploaded");
        Ok(())
    }

    pub async fn delete_photo(&self, photo_id: i64) -> ApiResult<()> {
        Ok(self
            .client()
            .delete(&format!("{}/photos/{}", REQUESTS, photo_id))
            .await?)
    }
}

fn request_path(request_id: i32) -> String {
    format!("{}/{}", REQUESTS, request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_response_parses_backend_shape() {
        let json = r#"{
            "requestID": 12,
            "description": "Leaking tap",
            "shopName": "Store 3",
            "shopID": 3,
            "workCategoryName": "Plumbing",
            "workCategoryID": 2,
            "urgencyName": "Urgent",
            "urgencyID": 1,
            "assignedContractorName": null,
            "assignedContractorID": null,
            "status": "In work",
            "createdAt": "2024-05-01T10:15:30.123",
            "daysRemaining": -2,
            "commentCount": 4,
            "photoCount": 0
        }"#;
        let request: RequestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(request.request_id, 12);
        assert_eq!(request.status, RequestStatus::InWork);
        assert!(request.is_overdue());
        assert_eq!(request.comment_count, 4);
        assert!(request.created_at.is_some());
    }

    #[test]
    fn test_filter_only_sends_set_values() {
        let filter = RequestFilter {
            search_term: Some("  ".into()),
            shop_id: Some(3),
            overdue: true,
            status: Some(RequestStatus::Done),
            ..Default::default()
        };
        let request = filter.apply(ApiRequest::get(REQUESTS));
        assert_eq!(
            request.display_target(),
            "/api/requests?archived=false&shopId=3&overdue=true&status=Done"
        );
    }

    #[test]
    fn test_create_validation() {
        let mut body = CreateRequestRequest {
            description: "Broken door".into(),
            shop_id: 1,
            work_category_id: 1,
            urgency_id: 1,
            assigned_contractor_id: None,
            custom_days: None,
        };
        assert!(body.validate().is_ok());

        body.custom_days = Some(0);
        assert!(body.validate().is_err());

        body.custom_days = None;
        body.description = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_unknown_status_kept() {
        let status: RequestStatus = serde_json::from_str("\"Paused\"").unwrap();
        assert_eq!(status, RequestStatus::Other("Paused".into()));
        assert_eq!(serde_json::to_string(&RequestStatus::InWork).unwrap(), "\"In work\"");
    }
}
