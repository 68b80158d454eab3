use crate::error::{bad_request, db_error, forbidden, not_found, ApiResult};
use crate::middleware::auth::{auth_middleware, optional_user};
use crate::models::auth::User;
use crate::models::live::*;
use crate::models::response::{ApiResponse, Paging};
use crate::services::display_time::{format_local, CLOCK, DATETIME_MINUTES};
use crate::services::live_meta;
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

const DEFAULT_TITLE: &str = "My live stream";

pub fn live_routes() -> Router {
    let public = Router::new()
        .route("/live/streams", get(list_streams))
        .route("/live/stream/:stream_id", get(stream_detail))
        .route("/live/stream/:stream_id/like", post(like_stream))
        .route("/live/comments/:stream_id", get(list_comments));

    let protected = Router::new()
        .route("/live/stream/create", post(create_stream))
        .route("/live/stream/:stream_id/end", post(end_stream))
        .route("/live/stream/:stream_id/delete", delete(delete_stream))
        .route("/live/comment", post(add_comment))
        .route_layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

async fn fetch_stream(state: &AppState, stream_id: i32) -> ApiResult<LiveStreamRow> {
    sqlx::query_as::<_, LiveStreamRow>(&format!("{} WHERE s.id = $1", LIVE_STREAM_SELECT))
        .bind(stream_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Live stream not found"))
}

fn cover_of(row: &LiveStreamRow) -> String {
    row.cover_image
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COVER.to_string())
}

fn streamer_of(row: &LiveStreamRow) -> String {
    row.streamer
        .clone()
        .unwrap_or_else(|| UNKNOWN_STREAMER.to_string())
}

fn to_item(row: &LiveStreamRow) -> LiveStreamItem {
    LiveStreamItem {
        id: row.id,
        stream_id: row.id,
        title: row.title.clone(),
        description: row.description.clone().unwrap_or_default(),
        cover: cover_of(row),
        category: row.category.clone(),
        status: row.status,
        viewer_count: row.viewer_count,
        streamer: streamer_of(row),
        avatar: DEFAULT_AVATAR.to_string(),
        likes: i64::from(row.likes),
        chat_count: row.chat_count,
        created_time: format_local(&row.created_time, CLOCK),
    }
}

/// Only the streamer or an admin may end or delete a stream.
fn ensure_can_manage(row: &LiveStreamRow, user: &User) -> ApiResult<()> {
    if row.user_id == Some(user.id) || user.is_admin() {
        Ok(())
    } else {
        Err(forbidden("You cannot manage this live stream"))
    }
}

async fn list_streams(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LiveListQuery>,
) -> ApiResult<Json<LiveStreamListResponse>> {
    let paging = Paging::new(params.page, params.page_size, 20, 100);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM live_streams WHERE status = $1")
        .bind(STATUS_LIVE)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)?;

    let rows = sqlx::query_as::<_, LiveStreamRow>(&format!(
        "{} WHERE s.status = $1 ORDER BY s.created_time DESC OFFSET $2 LIMIT $3",
        LIVE_STREAM_SELECT
    ))
    .bind(STATUS_LIVE)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    let data: Vec<LiveStreamItem> = rows.iter().map(to_item).collect();
    let has_more = paging.offset().saturating_add(data.len() as i64) < total;

    Ok(Json(LiveStreamListResponse {
        code: 200,
        message: "Live streams loaded".to_string(),
        data,
        pagination: LivePagination {
            page: paging.page,
            page_size: paging.per_page,
            total,
            has_more,
        },
    }))
}

async fn create_stream(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<LiveStreamCreate>,
) -> ApiResult<Json<ApiResponse<LiveStreamCreated>>> {
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();
    let description = payload.description.unwrap_or_default();
    let tags = payload.tags.unwrap_or_default();
    let category = live_meta::normalize_category(payload.category.as_ref());
    let stream_key = live_meta::generate_stream_key();

    let stream_id: i32 = sqlx::query_scalar(
        "INSERT INTO live_streams \
            (title, description, cover_image, stream_key, category, tags, status, viewer_count, \
             max_viewers, likes, start_time, created_time, user_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 0, 0, 0, NOW(), NOW(), $8) RETURNING id",
    )
    .bind(&title)
    .bind(&description)
    .bind(DEFAULT_COVER)
    .bind(&stream_key)
    .bind(category)
    .bind(&tags)
    .bind(STATUS_LIVE)
    .bind(user.id)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("User {} started live stream {} ({})", user.name, stream_id, category);

    Ok(Json(ApiResponse::ok(
        "Live stream created",
        LiveStreamCreated {
            stream_id,
            push_url: live_meta::push_url(&state.config.live_push_base, &stream_key),
            play_url: live_meta::play_url(&state.config.live_play_base, &stream_key),
            stream_key,
            title,
            category: category.to_string(),
            description,
            tags,
        },
    )))
}

async fn stream_detail(
    Extension(state): Extension<Arc<AppState>>,
    Path(stream_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<LiveStreamDetail>>> {
    let updated: Option<i32> = sqlx::query_scalar(
        "UPDATE live_streams SET viewer_count = viewer_count + 1, \
             max_viewers = GREATEST(max_viewers, viewer_count + 1) \
         WHERE id = $1 RETURNING id",
    )
    .bind(stream_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(db_error)?;
    if updated.is_none() {
        return Err(not_found("Live stream not found"));
    }

    let row = fetch_stream(&state, stream_id).await?;
    let item = to_item(&row);
    let streamer = item.streamer.clone();

    Ok(Json(ApiResponse::ok(
        "Live stream loaded",
        LiveStreamDetail {
            id: item.id,
            stream_id: item.stream_id,
            title: item.title,
            description: item.description,
            cover: item.cover.clone(),
            category: item.category,
            status: item.status,
            viewer_count: item.viewer_count,
            streamer: streamer.clone(),
            streamer_name: streamer,
            avatar: item.avatar,
            likes: item.likes,
            chat_count: item.chat_count,
            created_time: item.created_time,
            play_url: live_meta::play_url(&state.config.live_play_base, &row.stream_key),
            push_url: live_meta::push_url(&state.config.live_push_base, &row.stream_key),
            stream_key: row.stream_key,
            tags: row.tags,
            created_at: format_local(&row.created_time, DATETIME_MINUTES),
            cover_image: item.cover,
        },
    )))
}

async fn like_stream(
    Extension(state): Extension<Arc<AppState>>,
    Path(stream_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<LikeData>>> {
    let likes: i32 = sqlx::query_scalar(
        "UPDATE live_streams SET likes = likes + 1 WHERE id = $1 RETURNING likes",
    )
    .bind(stream_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(db_error)?
    .ok_or_else(|| not_found("Live stream not found"))?;

    Ok(Json(ApiResponse::ok(
        "Liked",
        LikeData {
            likes: i64::from(likes),
        },
    )))
}

async fn end_stream(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(stream_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let row = fetch_stream(&state, stream_id).await?;
    ensure_can_manage(&row, &user)?;

    sqlx::query("UPDATE live_streams SET status = $1, end_time = NOW() WHERE id = $2")
        .bind(STATUS_ENDED)
        .bind(stream_id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;

    tracing::info!("Live stream {} ended by {}", stream_id, user.name);
    Ok(Json(ApiResponse::message("Live stream ended")))
}

async fn delete_stream(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(stream_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let row = fetch_stream(&state, stream_id).await?;
    ensure_can_manage(&row, &user)?;

    // live_comments cascade with the stream
    sqlx::query("DELETE FROM live_streams WHERE id = $1")
        .bind(stream_id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;

    tracing::info!("Live stream {} deleted by {}", stream_id, user.name);
    Ok(Json(ApiResponse::message("Live stream deleted")))
}

async fn add_comment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<LiveCommentCreate>,
) -> ApiResult<Json<ApiResponse<LiveCommentCreated>>> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(bad_request("Comment content is required"));
    }

    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM live_streams WHERE id = $1")
        .bind(payload.stream_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?;
    if exists.is_none() {
        return Err(not_found("Live stream not found"));
    }

    let (id, timestamp): (i32, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
        "INSERT INTO live_comments (live_stream_id, user_id, content, timestamp) \
         VALUES ($1, $2, $3, NOW()) RETURNING id, timestamp",
    )
    .bind(payload.stream_id)
    .bind(user.id)
    .bind(content)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Sent",
        LiveCommentCreated {
            id,
            content: content.to_string(),
            created_time: format_local(&timestamp, CLOCK),
        },
    )))
}

async fn list_comments(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(stream_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<LiveCommentItem>>>> {
    let viewer_id = optional_user(&state, &headers).await.map(|u| u.id);

    let rows = sqlx::query_as::<_, LiveCommentRow>(
        "SELECT lc.id, lc.live_stream_id, lc.user_id, u.name AS user_name, lc.content, lc.timestamp \
         FROM live_comments lc LEFT JOIN users u ON u.id = lc.user_id \
         WHERE lc.live_stream_id = $1 ORDER BY lc.timestamp ASC, lc.id ASC",
    )
    .bind(stream_id)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    let comments = rows
        .into_iter()
        .map(|row| LiveCommentItem {
            id: row.id,
            username: row.user_name.unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            avatar: DEFAULT_AVATAR.to_string(),
            content: row.content,
            time: format_local(&row.timestamp, CLOCK),
            is_own: viewer_id.is_some() && row.user_id == viewer_id,
            is_system: false,
        })
        .collect();

    Ok(Json(ApiResponse::ok("success", comments)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(user_id: Option<i32>) -> LiveStreamRow {
        LiveStreamRow {
            id: 3,
            title: "Evening set".to_string(),
            description: None,
            cover_image: None,
            stream_key: "abc".to_string(),
            category: "music".to_string(),
            tags: String::new(),
            status: STATUS_LIVE,
            viewer_count: 4,
            max_viewers: 9,
            likes: 2,
            start_time: None,
            created_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap(),
            end_time: None,
            user_id,
            streamer: None,
            chat_count: 1,
        }
    }

    fn user(id: i32, role: &str) -> User {
        User {
            id,
            name: format!("user{}", id),
            password_hash: String::new(),
            role: role.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_item_defaults_and_local_clock() {
        let item = to_item(&row(Some(1)));
        assert_eq!(item.cover, DEFAULT_COVER);
        assert_eq!(item.streamer, UNKNOWN_STREAMER);
        assert_eq!(item.created_time, "20:05");
        assert_eq!(item.likes, 2);
    }

    #[test]
    fn test_only_streamer_or_admin_can_manage() {
        assert!(ensure_can_manage(&row(Some(1)), &user(1, "user")).is_ok());
        assert!(ensure_can_manage(&row(Some(1)), &user(2, "admin")).is_ok());
        assert!(ensure_can_manage(&row(Some(1)), &user(2, "user")).is_err());
        assert!(ensure_can_manage(&row(None), &user(2, "user")).is_err());
    }
}
