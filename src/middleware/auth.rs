use crate::error::{db_error, forbidden, unauthorized, ApiError};
use crate::models::auth::{User, USER_COLUMNS};
use crate::services::token::{extract_token, verify_jwt_token};
use crate::AppState;
use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use std::sync::Arc;

/// Resolves the caller from the Authorization header and reloads them from
/// the database, so role changes and deactivation apply immediately.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header format"))?;

    let token = extract_token(auth_str)
        .ok_or_else(|| unauthorized("Invalid Authorization header format. Expected 'Bearer <token>'"))?;

    let claims = verify_jwt_token(token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        unauthorized("Invalid or expired token")
    })?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| unauthorized("User no longer exists"))?;

    if !user.is_active {
        tracing::warn!("Disabled user {} attempted access", user.name);
        return Err(forbidden("Account is disabled"));
    }

    Ok(user)
}

/// The caller when a valid token is present, `None` otherwise.
pub async fn optional_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    if !headers.contains_key(AUTHORIZATION) {
        return None;
    }
    authenticate(state, headers).await.ok()
}

pub async fn auth_middleware(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &headers).await?;

    // Handlers read the caller with `Extension<User>`
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
