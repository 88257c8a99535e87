//! Links between shops, contractors, and their Telegram chats.

use crate::api::DeskApi;
use crate::error::ApiResult;
use crate::pagination::{PageRequest, Paged};
use desk_http::ApiRequest;
use serde::{Deserialize, Serialize};

const CHATS: &str = "/api/admin/shop-contractor-chats";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopContractorChatResponse {
    #[serde(rename = "shopContractorChatID")]
    pub chat_id: i32,
    #[serde(rename = "shopID")]
    pub shop_id: i32,
    #[serde(rename = "shopName", default)]
    pub shop_name: Option<String>,
    #[serde(rename = "contractorID", default)]
    pub contractor_id: Option<i32>,
    #[serde(rename = "contractorLogin", default)]
    pub contractor_login: Option<String>,
    #[serde(rename = "telegramID")]
    pub telegram_id: i64,
}

/// Create and update payload. A chat without a contractor is shop-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopContractorChatRequest {
    #[serde(rename = "shopID")]
    pub shop_id: i32,
    #[serde(rename = "contractorID")]
    pub contractor_id: Option<i32>,
    #[serde(rename = "telegramID")]
    pub telegram_id: i64,
}

impl DeskApi {
    pub async fn list_chats(
        &self,
        page: &PageRequest,
    ) -> ApiResult<Paged<ShopContractorChatResponse>> {
        Ok(self.client().json(page.apply(ApiRequest::get(CHATS))).await?)
    }

    pub async fn create_chat(
        &self,
        chat: &ShopContractorChatRequest,
    ) -> ApiResult<ShopContractorChatResponse> {
        Ok(self.client().post_json(CHATS, chat).await?)
    }

    pub async fn update_chat(
        &self,
        chat_id: i32,
        chat: &ShopContractorChatRequest,
    ) -> ApiResult<ShopContractorChatResponse> {
        Ok(self
            .client()
            .put_json(&format!("{}/{}", CHATS, chat_id), chat)
            .await?)
    }

    pub async fn delete_chat(&self, chat_id: i32) -> ApiResult<()> {
        Ok(self.client().delete(&format!("{}/{}", CHATS, chat_id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_without_contractor_serializes_null() {
        let chat = ShopContractorChatRequest {
            shop_id: 4,
            contractor_id: None,
            telegram_id: -1001234567890,
        };
        assert_eq!(
            serde_json::to_value(&chat).unwrap(),
            serde_json::json!({ "shopID": 4, "contractorID": null, "telegramID": -1001234567890i64 })
        );
    }
}
