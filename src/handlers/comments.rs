use crate::error::{bad_request, db_error, not_found, ApiResult};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::User;
use crate::models::comment::{CommentCreate, CommentItem, CommentRow};
use crate::models::response::ApiResponse;
use crate::services::comment_tree::build_comment_tree;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn comment_routes() -> Router {
    let public = Router::new().route("/comments/show/:vod_id", get(show_comments));

    let protected = Router::new()
        .route("/comments/publish/:vod_id", post(publish_comment))
        .route("/comments/reply/:comment_id", post(reply_comment).delete(delete_reply))
        .route("/comments/comment/:comment_id", delete(delete_comment))
        .route_layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

async fn show_comments(
    Extension(state): Extension<Arc<AppState>>,
    Path(vod_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<CommentItem>>>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT c.id, c.body, c.timestamp, c.user_id, COALESCE(u.name, '') AS user_name, \
                c.movdetail_id, c.replied_id \
         FROM comments c LEFT JOIN users u ON u.id = c.user_id \
         WHERE c.movdetail_id = $1",
    )
    .bind(vod_id)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Comments loaded",
        build_comment_tree(rows),
    )))
}

fn comment_body(payload: &CommentCreate) -> ApiResult<&str> {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(bad_request("Comment body is required"));
    }
    Ok(body)
}

async fn publish_comment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(vod_id): Path<i32>,
    Json(payload): Json<CommentCreate>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let body = comment_body(&payload)?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM vod_details WHERE id = $1")
        .bind(vod_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?;
    if exists.is_none() {
        return Err(not_found("Video not found"));
    }

    sqlx::query(
        "INSERT INTO comments (body, timestamp, user_id, movdetail_id) VALUES ($1, NOW(), $2, $3)",
    )
    .bind(body)
    .bind(user.id)
    .bind(vod_id)
    .execute(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("User {} commented on vod {}", user.name, vod_id);
    Ok(Json(ApiResponse::message("Comment published")))
}

async fn reply_comment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(comment_id): Path<i32>,
    Json(payload): Json<CommentCreate>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let parent_vod: i32 = sqlx::query_scalar("SELECT movdetail_id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| bad_request("This comment no longer exists"))?;

    let body = comment_body(&payload)?;

    sqlx::query(
        "INSERT INTO comments (body, timestamp, user_id, movdetail_id, replied_id) \
         VALUES ($1, NOW(), $2, $3, $4)",
    )
    .bind(body)
    .bind(user.id)
    .bind(parent_vod)
    .bind(comment_id)
    .execute(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("User {} replied to comment {}", user.name, comment_id);
    Ok(Json(ApiResponse::message("Reply published")))
}

/// Deletes a comment the caller wrote; replies go with it through the
/// `replied_id` cascade.
async fn delete_own_comment(state: &AppState, user: &User, comment_id: i32) -> ApiResult<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
        .bind(comment_id)
        .bind(user.id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected() > 0)
}

async fn delete_comment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(comment_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !delete_own_comment(&state, &user, comment_id).await? {
        return Err(not_found("Comment not found or not yours to delete"));
    }
    Ok(Json(ApiResponse::message("Comment deleted")))
}

async fn delete_reply(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(reply_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !delete_own_comment(&state, &user, reply_id).await? {
        return Err(not_found("Reply not found or not yours to delete"));
    }
    Ok(Json(ApiResponse::message("Reply deleted")))
}
