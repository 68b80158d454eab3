use crate::error::{bad_request, db_error, forbidden, not_found, ApiResult};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::User;
use crate::models::video::{Video, VideoListQuery, VideoPayload};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

const VIDEO_COLUMNS: &str = "id, title, description, url, created_at, owner_id";

pub fn video_routes() -> Router {
    let public = Router::new()
        .route("/videos/", get(list_videos))
        .route("/videos/:id", get(get_video));

    let protected = Router::new()
        .route("/videos/", post(create_video))
        .route("/videos/:id", axum::routing::put(update_video).delete(delete_video))
        .route_layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

async fn fetch_video(state: &AppState, id: i32) -> ApiResult<Video> {
    sqlx::query_as::<_, Video>(&format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS))
        .bind(id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Video not found"))
}

/// Loads a video the caller owns.
async fn fetch_owned_video(state: &AppState, id: i32, user: &User) -> ApiResult<Video> {
    let video = fetch_video(state, id).await?;
    if video.owner_id != Some(user.id) {
        return Err(forbidden("Not enough permissions"));
    }
    Ok(video)
}

async fn create_video(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<VideoPayload>,
) -> ApiResult<Json<Video>> {
    payload.validate().map_err(bad_request)?;

    let video = sqlx::query_as::<_, Video>(&format!(
        "INSERT INTO videos (title, description, url, created_at, owner_id) \
         VALUES ($1, $2, $3, NOW(), $4) RETURNING {}",
        VIDEO_COLUMNS
    ))
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.url.trim())
    .bind(user.id)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("User {} created video {}", user.id, video.id);
    Ok(Json(video))
}

async fn list_videos(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<VideoListQuery>,
) -> ApiResult<Json<Vec<Video>>> {
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 100);

    let videos = sqlx::query_as::<_, Video>(&format!(
        "SELECT {} FROM videos ORDER BY id OFFSET $1 LIMIT $2",
        VIDEO_COLUMNS
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(videos))
}

async fn get_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Video>> {
    fetch_video(&state, id).await.map(Json)
}

async fn update_video(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(payload): Json<VideoPayload>,
) -> ApiResult<Json<Video>> {
    payload.validate().map_err(bad_request)?;
    fetch_owned_video(&state, id, &user).await?;

    let video = sqlx::query_as::<_, Video>(&format!(
        "UPDATE videos SET title = $1, description = $2, url = $3 WHERE id = $4 RETURNING {}",
        VIDEO_COLUMNS
    ))
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.url.trim())
    .bind(id)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(video))
}

async fn delete_video(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Video>> {
    let video = fetch_owned_video(&state, id, &user).await?;

    sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;

    tracing::info!("User {} deleted video {}", user.id, id);
    Ok(Json(video))
}
