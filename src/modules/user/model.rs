use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::schema::UserEntity;
use crate::utils::trimmed;

/// Token lifetimes and signing settings for the auth flow.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    /// Cookie-borne access tokens closer than this to expiry are re-issued.
    pub access_token_renew_window: u64,
    pub cookie_secure: bool,
}

#[derive(Deserialize, Validate)]
pub struct RegisterModel {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 80, message = "Username must be 3 to 80 characters long"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters long")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginModel {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub hash_password: String,
}

/// Tokens minted by a successful login or refresh.
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: uuid::Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: uuid::Uuid,
    pub username: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            is_active: entity.is_active,
            created_at: entity.created_at,
        }
    }
}

impl From<&UserEntity> for UserSummary {
    fn from(entity: &UserEntity) -> Self {
        UserSummary { id: entity.id, username: entity.username.clone() }
    }
}
