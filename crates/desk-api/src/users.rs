//! Users, roles, and contractors.

use crate::api::DeskApi;
use crate::error::ApiResult;
use crate::pagination::{PageRequest, Paged};
use desk_http::ApiRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

const USERS: &str = "/api/admin/users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "userID")]
    pub user_id: i32,
    pub login: String,
    #[serde(rename = "roleName")]
    pub role_name: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(rename = "contactInfo", default)]
    pub contact_info: Option<String>,
    #[serde(rename = "telegramID", default)]
    pub telegram_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateUserRequest {
    pub login: String,
    pub password: String,
    #[serde(rename = "roleName")]
    pub role_name: String,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "contactInfo", skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    /// Sent as a string; the backend parses it.
    #[serde(rename = "telegramID", skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<String>,
}

/// Update payload. An empty password keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "roleName", skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "contactInfo", skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(rename = "telegramID", skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    #[serde(rename = "roleID")]
    pub role_id: i32,
    #[serde(rename = "roleName")]
    pub role_name: String,
}

impl DeskApi {
    /// List users, optionally only those with `role`.
    pub async fn list_users(
        &self,
        page: &PageRequest,
        role: Option<&str>,
    ) -> ApiResult<Paged<UserResponse>> {
        let request = page.apply(ApiRequest::get(USERS)).query_opt("role", role);
        Ok(self.client().json(request).await?)
    }

    pub async fn create_user(&self, user: &CreateUserRequest) -> ApiResult<UserResponse> {
        let created: UserResponse = self.client().post_json(USERS, user).await?;
        info!(user_id = created.user_id, login = %created.login, "User created");
        Ok(created)
    }

    pub async fn update_user(
        &self,
        user_id: i32,
        update: &UpdateUserRequest,
    ) -> ApiResult<UserResponse> {
        Ok(self
            .client()
            .put_json(&format!("{}/{}", USERS, user_id), update)
            .await?)
    }

    pub async fn delete_user(&self, user_id: i32) -> ApiResult<()> {
        self.client()
            .delete(&format!("{}/{}", USERS, user_id))
            .await?;
        info!(user_id, "User deleted");
        Ok(())
    }

    pub async fn list_roles(&self) -> ApiResult<Vec<RoleResponse>> {
        Ok(self.client().get_json("/api/roles").await?)
    }

    /// Users with the contractor role, for assignment pickers.
    pub async fn list_contractors(&self) -> ApiResult<Vec<UserResponse>> {
        Ok(self.client().get_json("/api/user/contractors").await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_parses_backend_names() {
        let user: UserResponse = serde_json::from_str(
            r#"{"userID":3,"login":"tech1","roleName":"Contractor","fullName":"Ivan","contactInfo":null,"telegramID":12345}"#,
        )
        .unwrap();
        assert_eq!(user.user_id, 3);
        assert_eq!(user.role_name, "Contractor");
        assert_eq!(user.telegram_id, Some(12345));
        assert!(user.contact_info.is_none());
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let update = UpdateUserRequest {
            full_name: Some("Ivan P.".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "fullName": "Ivan P." })
        );
    }
}
