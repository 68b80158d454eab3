use crate::error::{forbidden, unauthorized, ApiError};
use crate::models::auth::User;
use axum::{extract::Request, middleware::Next, response::Response};

/// Must run after `auth_middleware`, which puts the caller into extensions.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<User>() {
        Some(user) if user.is_admin() => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!("User {} denied admin access", user.name);
            Err(forbidden("Admin access required"))
        }
        None => Err(unauthorized("Authentication required for admin access")),
    }
}
