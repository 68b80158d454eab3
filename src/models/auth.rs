use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Column list matching `User`'s fields.
pub const USER_COLUMNS: &str = "id, name, password_hash, role, is_active, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

pub fn is_valid_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_USER
}

/// Login and registration accept either a form body or JSON.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user_id: i32,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // user id
    pub name: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

impl From<User> for CurrentUserResponse {
    fn from(user: User) -> Self {
        CurrentUserResponse {
            id: user.id,
            username: user.name.clone(),
            name: user.name,
            role: user.role,
        }
    }
}
