//! Scheduled notifications sent to shop chats.

use crate::api::DeskApi;
use crate::cron::Schedule;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageRequest, Paged};
use chrono::NaiveDateTime;
use desk_http::ApiRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

const NOTIFICATIONS: &str = "/api/admin/notifications";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    #[serde(rename = "notificationID")]
    pub notification_id: i32,
    pub title: String,
    pub message: Option<String>,
    pub cron_expression: String,
    pub is_active: bool,
    #[serde(default)]
    pub recipient_chat_ids: Vec<i32>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl NotificationResponse {
    /// The schedule, if the stored expression is well formed.
    pub fn schedule(&self) -> Option<Schedule> {
        Schedule::parse(&self.cron_expression)
    }
}

/// Create and update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
    pub cron_expression: String,
    pub is_active: bool,
    pub recipient_chat_ids: Vec<i32>,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, message: impl Into<String>, schedule: &Schedule) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            cron_expression: schedule.to_cron(),
            is_active: true,
            recipient_chat_ids: Vec::new(),
        }
    }

    pub fn with_recipients(mut self, recipient_chat_ids: Vec<i32>) -> Self {
        self.recipient_chat_ids = recipient_chat_ids;
        self
    }

    fn validate(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "notification title must not be blank".to_string(),
            ));
        }
        if Schedule::parse(&self.cron_expression).is_none() {
            return Err(ApiError::InvalidArgument(format!(
                "not a five-field cron expression: {:?}",
                self.cron_expression
            )));
        }
        Ok(())
    }
}

impl DeskApi {
    /// List notifications, optionally only active or only paused ones.
    pub async fn list_notifications(
        &self,
        page: &PageRequest,
        active: Option<bool>,
    ) -> ApiResult<Paged<NotificationResponse>> {
        let request = page
            .apply(ApiRequest::get(NOTIFICATIONS))
            .query_opt("isActive", active);
        Ok(self.client().json(request).await?)
    }

    pub async fn notification(&self, notification_id: i32) -> ApiResult<NotificationResponse> {
        Ok(self
            .client()
            .get_json(&format!("{}/{}", NOTIFICATIONS, notification_id))
            .await?)
    }

    pub async fn create_notification(
        &self,
        notification: &NotificationRequest,
    ) -> ApiResult<NotificationResponse> {
        notification.validate()?;
        let created: NotificationResponse =
            self.client().post_json(NOTIFICATIONS, notification).await?;
        info!(
            notification_id = created.notification_id,
            cron = %created.cron_expression,
            "Notification scheduled"
        );
        Ok(created)
    }

    pub async fn update_notification(
        &self,
        notification_id: i32,
        notification: &NotificationRequest,
    ) -> ApiResult<NotificationResponse> {
        notification.validate()?;
        Ok(self
            .client()
            .put_json(&format!("{}/{}", NOTIFICATIONS, notification_id), notification)
            .await?)
    }

    pub async fn delete_notification(&self, notification_id: i32) -> ApiResult<()> {
        Ok(self
            .client()
            .delete(&format!("{}/{}", NOTIFICATIONS, notification_id))
            .await?)
    }
}
