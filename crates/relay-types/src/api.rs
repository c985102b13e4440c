use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RequestRecord, User};

// -- JWT Claims --

/// Bearer token claims. `sub` is the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

// -- Auth --

/// OAuth2 password-grant form. Extra form fields (`grant_type`, `scope`,
/// `client_id`) are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role_name: String,
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub manager_id: Option<Uuid>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            manager_id: user.manager_id,
        }
    }
}

// -- Requests --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequestRequest {
    pub bottoken: String,
    pub chatid: String,
    pub message: String,
}

/// `bottoken` is omitted for ownerless rows: there it is the ingestion secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestResponse {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottoken: Option<String>,
    pub chatid: String,
    pub message: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<RequestRecord> for RequestResponse {
    fn from(record: RequestRecord) -> Self {
        Self {
            id: record.id,
            bottoken: record.user_id.map(|_| record.bottoken),
            chatid: record.chatid,
            message: record.message,
            user_id: record.user_id,
            created_at: record.created_at,
        }
    }
}
