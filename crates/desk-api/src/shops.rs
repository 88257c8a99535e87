//! Shops.

use crate::api::DeskApi;
use crate::error::ApiResult;
use crate::pagination::{PageRequest, Paged};
use desk_http::ApiRequest;
use serde::{Deserialize, Serialize};

const SHOPS: &str = "/api/admin/shops";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopResponse {
    #[serde(rename = "shopID")]
    pub shop_id: i32,
    #[serde(rename = "shopName")]
    pub shop_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telegramID", default)]
    pub telegram_id: Option<i64>,
    /// Store manager responsible for the shop.
    #[serde(rename = "userID", default)]
    pub user_id: Option<i32>,
    #[serde(rename = "userLogin", default)]
    pub user_login: Option<String>,
}

/// Create and update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShopRequest {
    #[serde(rename = "shopName")]
    pub shop_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telegramID", skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<String>,
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
}

impl DeskApi {
    pub async fn list_shops(&self, page: &PageRequest) -> ApiResult<Paged<ShopResponse>> {
        Ok(self.client().json(page.apply(ApiRequest::get(SHOPS))).await?)
    }

    pub async fn create_shop(&self, shop: &ShopRequest) -> ApiResult<ShopResponse> {
        Ok(self.client().post_json(SHOPS, shop).await?)
    }

    pub async fn update_shop(&self, shop_id: i32, shop: &ShopRequest) -> ApiResult<ShopResponse> {
        Ok(self
            .client()
            .put_json(&format!("{}/{}", SHOPS, shop_id), shop)
            .await?)
    }

    pub async fn delete_shop(&self, shop_id: i32) -> ApiResult<()> {
        Ok(self.client().delete(&format!("{}/{}", SHOPS, shop_id)).await?)
    }
}
