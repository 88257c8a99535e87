//! Session data.

use crate::session_fsm::SessionPhase;
use desk_http::AccessToken;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend role of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Contractor,
    StoreManager,
    /// A role name this client does not know.
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::Contractor => "Contractor",
            Role::StoreManager => "StoreManager",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Admin" => Role::Admin,
            "Contractor" => Role::Contractor,
            "StoreManager" => Role::StoreManager,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

/// Body of the whoami endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WhoAmIResponse {
    pub login: String,
    pub role: Role,
}

impl From<WhoAmIResponse> for User {
    fn from(response: WhoAmIResponse) -> Self {
        Self {
            username: response.login,
            role: response.role,
        }
    }
}

/// Current user and access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<AccessToken>,
    pub user: Option<User>,
}

impl Session {
    pub fn clear(&mut self) {
        self.access_token = None;
        self.user = None;
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn role(&self) -> Option<&Role> {
        self.user.as_ref().map(|u| &u.role)
    }
}

/// Published view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session: Session,
}

impl SessionSnapshot {
    pub(crate) fn initializing() -> Self {
        Self {
            phase: SessionPhase::Initializing,
            session: Session::default(),
        }
    }

    /// True until the startup restore settles.
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Initializing
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }
}
