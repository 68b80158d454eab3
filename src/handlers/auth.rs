use crate::error::{bad_request, db_error, unauthorized, ApiError, ApiResult, AppError};
use crate::middleware::{auth::auth_middleware, rate_limit::strict_rate_limit_middleware};
use crate::models::auth::*;
use crate::models::response::ApiResponse;
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{generate_jwt_token, TOKEN_PREFIX};
use crate::AppState;
use axum::{
    async_trait,
    extract::{Extension, FromRequest, Request},
    http::header::CONTENT_TYPE,
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;

/// Longest password accepted at registration; longer input is cut.
const MAX_PASSWORD_CHARS: usize = 50;
const MAX_USERNAME_CHARS: usize = 30;

pub fn auth_routes() -> Router {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/token", post(token))
        .layer(axum::middleware::from_fn(strict_rate_limit_middleware));

    let protected = Router::new()
        .route("/auth/user", get(current_user))
        .route_layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

/// `{username, password}` from either a urlencoded form or a JSON body.
pub struct Credentials(pub CredentialsRequest);

#[async_trait]
impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(body) = Json::<CredentialsRequest>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            Ok(Credentials(body))
        } else {
            let Form(body) = Form::<CredentialsRequest>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            Ok(Credentials(body))
        }
    }
}

impl Credentials {
    /// Trimmed username and raw password, both required.
    fn required(self) -> Result<(String, String), ApiError> {
        let username = self.0.username.unwrap_or_default().trim().to_string();
        let password = self.0.password.unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(bad_request("Username and password are required"));
        }
        Ok((username, password))
    }
}

async fn find_user_by_name(state: &AppState, name: &str) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE name = $1", USER_COLUMNS))
        .bind(name)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)
}

/// Looks the user up and checks the password; `None` for any mismatch.
async fn check_credentials(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let user = find_user_by_name(state, username).await?;
    Ok(user.filter(|u| verify_password(password, &u.password_hash)))
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    credentials: Credentials,
) -> ApiResult<Json<ApiResponse<()>>> {
    let (username, password) = credentials.required()?;

    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(bad_request(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_CHARS
        )));
    }

    if find_user_by_name(&state, &username).await?.is_some() {
        return Err(bad_request("Username already exists"));
    }

    let password: String = password.chars().take(MAX_PASSWORD_CHARS).collect();
    let password_hash = hash_password(&password).map_err(AppError::from)?;

    sqlx::query(
        "INSERT INTO users (name, password_hash, role, is_active, created_at) VALUES ($1, $2, $3, true, NOW())",
    )
    .bind(&username)
    .bind(&password_hash)
    .bind(ROLE_USER)
    .execute(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("Registered user {}", username);

    Ok(Json(ApiResponse::message("Registration successful")))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    credentials: Credentials,
) -> ApiResult<Json<ApiResponse<LoginData>>> {
    let (username, password) = credentials.required()?;

    let user = check_credentials(&state, &username, &password)
        .await?
        .ok_or_else(|| bad_request("Invalid username or password"))?;

    if !user.is_active {
        return Err(bad_request("Account is disabled"));
    }

    let token = generate_jwt_token(&user, &state.config.jwt_secret, state.config.jwt_expire_minutes)
        .map_err(AppError::from)?;

    tracing::info!("User {} logged in", user.name);

    Ok(Json(ApiResponse::ok(
        "Login successful",
        LoginData {
            token: format!("{}{}", TOKEN_PREFIX, token),
            user_id: user.id,
            username: user.name,
            role: user.role,
        },
    )))
}

/// OAuth2 password-flow login used by API clients and docs tooling.
async fn token(
    Extension(state): Extension<Arc<AppState>>,
    credentials: Credentials,
) -> ApiResult<Json<TokenResponse>> {
    let (username, password) = credentials
        .required()
        .map_err(|_| unauthorized("Incorrect username or password"))?;

    let user = check_credentials(&state, &username, &password)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| unauthorized("Incorrect username or password"))?;

    let access_token =
        generate_jwt_token(&user, &state.config.jwt_secret, state.config.jwt_expire_minutes)
            .map_err(AppError::from)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_id: user.id,
        username: user.name,
    }))
}

async fn current_user(Extension(user): Extension<User>) -> Json<ApiResponse<CurrentUserResponse>> {
    Json(ApiResponse::ok("ok", CurrentUserResponse::from(user)))
}
