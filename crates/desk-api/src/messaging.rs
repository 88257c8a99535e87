//! Message templates and ad-hoc broadcasts to shop chats.

use crate::api::DeskApi;
use crate::error::{ApiError, ApiResult};
use chrono::NaiveDateTime;
use desk_http::{ApiRequest, MultipartForm};
use serde::{Deserialize, Serialize};
use tracing::info;

const TEMPLATES: &str = "/api/admin/message-templates";
const MESSAGING: &str = "/api/admin/messaging";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplateResponse {
    #[serde(rename = "messageID")]
    pub message_id: i32,
    pub title: String,
    pub message: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub recipient_chat_ids: Vec<i32>,
}

/// An image attached to a template or a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Template fields sent as multipart parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateForm {
    pub title: String,
    pub message: Option<String>,
    pub recipient_chat_ids: Vec<i32>,
    pub image: Option<ImageUpload>,
}

impl TemplateForm {
    fn to_multipart(&self) -> ApiResult<MultipartForm> {
        if self.title.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "template title must not be blank".to_string(),
            ));
        }
        let mut form = MultipartForm::new().text("title", self.title.trim());
        if let Some(message) = &self.message {
            form = form.text("message", message.as_str());
        }
        if !self.recipient_chat_ids.is_empty() {
            form = form.text("recipientChatIds", join_ids(&self.recipient_chat_ids));
        }
        Ok(attach_image(form, self.image.as_ref()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    message: &'a str,
    recipient_chat_ids: &'a [i32],
}

/// Comma-joined ids, the format the multipart endpoints expect.
pub fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn attach_image(form: MultipartForm, image: Option<&ImageUpload>) -> MultipartForm {
    match image {
        Some(image) => form.file("image", &image.file_name, &image.mime, image.bytes.clone()),
        None => form,
    }
}

fn require_recipients(ids: &[i32]) -> ApiResult<()> {
    if ids.is_empty() {
        return Err(ApiError::InvalidArgument(
            "at least one recipient chat is required".to_string(),
        ));
    }
    Ok(())
}

impl DeskApi {
    pub async fn list_templates(&self) -> ApiResult<Vec<MessageTemplateResponse>> {
        Ok(self.client().get_json(TEMPLATES).await?)
    }

    pub async fn create_template(
        &self,
        template: &TemplateForm,
    ) -> ApiResult<MessageTemplateResponse> {
        let form = template.to_multipart()?;
        Ok(self.client().post_multipart(TEMPLATES, form).await?)
    }

    pub async fn update_template(
        &self,
        template_id: i32,
        template: &TemplateForm,
    ) -> ApiResult<MessageTemplateResponse> {
        let form = template.to_multipart()?;
        Ok(self
            .client()
            .put_multipart(&format!("{}/{}", TEMPLATES, template_id), form)
            .await?)
    }

    pub async fn delete_template(&self, template_id: i32) -> ApiResult<()> {
        Ok(self
            .client()
            .delete(&format!("{}/{}", TEMPLATES, template_id))
            .await?)
    }

    pub async fn template_image(&self, template_id: i32) -> ApiResult<Vec<u8>> {
        Ok(self
            .client()
            .get_bytes(&format!("{}/{}/image", TEMPLATES, template_id))
            .await?)
    }

    pub async fn delete_template_image(&self, template_id: i32) -> ApiResult<()> {
        Ok(self
            .client()
            .delete(&format!("{}/{}/image", TEMPLATES, template_id))
            .await?)
    }

    pub async fn send_message(&self, message: &str, recipient_chat_ids: &[i32]) -> ApiResult<()> {
        require_recipients(recipient_chat_ids)?;
        let request = ApiRequest::post(format!("{}/send", MESSAGING)).json(&SendMessageRequest {
            message,
            recipient_chat_ids,
        })?;
        self.client().execute(request).await?;
        info!(recipients = recipient_chat_ids.len(), "Message sent");
        Ok(())
    }

    pub async fn send_message_with_image(
        &self,
        message: &str,
        recipient_chat_ids: &[i32],
        image: Option<&ImageUpload>,
    ) -> ApiResult<()> {
        require_recipients(recipient_chat_ids)?;
        let form = MultipartForm::new()
            .text("message", message)
            .text("recipientChatIds", join_ids(recipient_chat_ids));
        let form = attach_image(form, image);
        self.client()
            .execute(ApiRequest::post(format!("{}/send-with-image", MESSAGING)).multipart(form))
            .await?;
        info!(
            recipients = recipient_chat_ids.len(),
            with_image = image.is_some(),
            "Message sent"
        );
        Ok(())
    }
}
