//! Work and urgency categories.

use crate::api::DeskApi;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageRequest, Paged};
use desk_http::ApiRequest;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

const WORK_CATEGORIES: &str = "/api/admin/work-categories";
const URGENCY_CATEGORIES: &str = "/api/admin/urgency-categories";

/// Accepted range for an urgency category's default deadline.
pub const DEFAULT_DAYS_RANGE: RangeInclusive<u32> = 1..=365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCategoryResponse {
    #[serde(rename = "workCategoryID")]
    pub work_category_id: i32,
    #[serde(rename = "workCategoryName")]
    pub work_category_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkCategoryRequest {
    #[serde(rename = "workCategoryName")]
    pub work_category_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyCategoryResponse {
    #[serde(rename = "urgencyID")]
    pub urgency_id: i32,
    #[serde(rename = "urgencyName")]
    pub urgency_name: String,
    #[serde(rename = "defaultDays")]
    pub default_days: u32,
}

#[derive(Serialize)]
struct UpdateUrgencyCategoryRequest {
    #[serde(rename = "defaultDays")]
    default_days: u32,
}

impl DeskApi {
    pub async fn list_work_categories(
        &self,
        page: &PageRequest,
    ) -> ApiResult<Paged<WorkCategoryResponse>> {
        Ok(self
            .client()
            .json(page.apply(ApiRequest::get(WORK_CATEGORIES)))
            .await?)
    }

    pub async fn create_work_category(&self, name: &str) -> ApiResult<WorkCategoryResponse> {
        let body = work_category_body(name)?;
        Ok(self.client().post_json(WORK_CATEGORIES, &body).await?)
    }

    pub async fn update_work_category(
        &self,
        work_category_id: i32,
        name: &str,
    ) -> ApiResult<WorkCategoryResponse> {
        let body = work_category_body(name)?;
        Ok(self
            .client()
            .put_json(&format!("{}/{}", WORK_CATEGORIES, work_category_id), &body)
            .await?)
    }

    pub async fn delete_work_category(&self, work_category_id: i32) -> ApiResult<()> {
        Ok(self
            .client()
            .delete(&format!("{}/{}", WORK_CATEGORIES, work_category_id))
            .await?)
    }

    pub async fn list_urgency_categories(&self) -> ApiResult<Vec<UrgencyCategoryResponse>> {
        Ok(self.client().get_json(URGENCY_CATEGORIES).await?)
    }

    /// Change the default number of days to complete requests of this urgency.
    pub async fn update_urgency_default_days(
        &self,
        urgency_id: i32,
        default_days: u32,
    ) -> ApiResult<UrgencyCategoryResponse> {
        if !DEFAULT_DAYS_RANGE.contains(&default_days) {
            return Err(ApiError::InvalidArgument(format!(
                "default days must be between {} and {}, got {}",
                DEFAULT_DAYS_RANGE.start(),
                DEFAULT_DAYS_RANGE.end(),
                default_days
            )));
        }
        Ok(self
            .client()
            .put_json(
                &format!("{}/{}", URGENCY_CATEGORIES, urgency_id),
                &UpdateUrgencyCategoryRequest { default_days },
            )
            .await?)
    }
}

fn work_category_body(name: &str) -> ApiResult<WorkCategoryRequest> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidArgument(
            "work category name must not be blank".to_string(),
        ));
    }
    Ok(WorkCategoryRequest {
        work_category_name: name.to_string(),
    })
}
