use crate::error::{bad_request, db_error, not_found, ApiResult, AppError};
use crate::middleware::{admin::admin_middleware, auth::auth_middleware};
use crate::models::admin::*;
use crate::models::auth::{is_valid_role, User, ROLE_USER};
use crate::models::live::{LiveStreamRow, DEFAULT_COVER, LIVE_STREAM_SELECT, STATUS_ENDED, STATUS_LIVE, UNKNOWN_STREAMER};
use crate::models::response::{ApiResponse, PageInfo, Paging};
use crate::services::display_time::{format_local, today_bounds, DATETIME};
use crate::services::password::hash_password;
use crate::services::{catalog, live_meta};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    routing::{delete, get, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const MIN_PASSWORD_CHARS: usize = 6;
const SIMPLE_VIDEO_LIMIT: i64 = 500;

type AdminResult = ApiResult<Json<ApiResponse<Value>>>;

pub fn admin_routes() -> Router {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/simple", get(simple_users))
        .route("/admin/users/:user_id/role", put(update_user_role))
        .route("/admin/users/:user_id/status", put(update_user_status))
        .route("/admin/videos", get(list_videos).post(create_video))
        .route("/admin/videos/simple", get(simple_videos))
        .route("/admin/videos/:video_id", delete(delete_video))
        .route("/admin/video-types", get(video_types))
        .route("/admin/comments", get(list_comments).post(create_comment))
        .route("/admin/comments/:comment_id", delete(delete_comment))
        .route("/admin/live/streams", get(list_live_streams).post(create_live_stream))
        .route("/admin/live/streams/:stream_id", delete(delete_live_stream))
        .route("/admin/live/streams/:stream_id/status", put(update_stream_status))
        .route("/admin/live/comments", get(list_live_comments).post(create_live_comment))
        .route("/admin/live/comments/:comment_id", delete(delete_live_comment))
        .route("/admin/stats", get(stats))
        .route_layer(axum::middleware::from_fn(admin_middleware))
        .route_layer(axum::middleware::from_fn(auth_middleware))
}

/// Blank filters count as absent.
fn filter_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn paged<T: Serialize>(key: &str, items: Vec<T>, info: PageInfo) -> Value {
    let mut data = Map::new();
    data.insert(key.to_string(), json!(items));
    data.insert("pagination".to_string(), json!(info));
    Value::Object(data)
}

async fn ensure_exists(state: &AppState, table: &str, id: i32, missing: &str) -> ApiResult<()> {
    let found: Option<i32> = sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id = $1", table))
        .bind(id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?;
    found.map(|_| ()).ok_or_else(|| bad_request(missing))
}

async fn delete_by_id(state: &AppState, table: &str, id: i32) -> ApiResult<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------- users

const USER_FILTER: &str = "WHERE ($1::text IS NULL OR u.name ILIKE '%' || $1 || '%') \
     AND ($2::text IS NULL OR u.role = $2) \
     AND ($3::bool IS NULL OR u.is_active = $3)";

async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AdminUsersQuery>,
) -> AdminResult {
    let paging = Paging::new(params.page, params.page_size, 20, 100);
    let username = filter_text(&params.username);
    let role = filter_text(&params.role);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users u {}", USER_FILTER))
        .bind(username)
        .bind(role)
        .bind(params.is_active)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)?;

    let users = sqlx::query_as::<_, AdminUserItem>(&format!(
        "SELECT u.id, u.name, u.role, u.is_active, u.created_at, \
                (SELECT COUNT(*) FROM videos v WHERE v.owner_id = u.id) AS video_count, \
                (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id) AS comment_count \
         FROM users u {} ORDER BY u.id OFFSET $4 LIMIT $5",
        USER_FILTER
    ))
    .bind(username)
    .bind(role)
    .bind(params.is_active)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Users loaded",
        paged("users", users, PageInfo::new(paging.page, paging.per_page, total)),
    )))
}

async fn create_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Json(payload): Json<CreateUserRequest>,
) -> AdminResult {
    let name = payload.name.trim();
    if name.is_empty() || payload.password.is_empty() {
        return Err(bad_request("name and password are required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    let role = payload.role.as_deref().unwrap_or(ROLE_USER);
    if !is_valid_role(role) {
        return Err(bad_request("Invalid role"));
    }
    let is_active = payload.is_active.unwrap_or(true);

    let taken: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE name = $1")
        .bind(name)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?;
    if taken.is_some() {
        return Err(bad_request("Username already exists"));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::from)?;

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO users (name, password_hash, role, is_active, created_at) \
         VALUES ($1, $2, $3, $4, NOW()) RETURNING id",
    )
    .bind(name)
    .bind(&password_hash)
    .bind(role)
    .bind(is_active)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("Admin {} created user {} ({})", admin.name, name, role);

    Ok(Json(ApiResponse::ok(
        "User created",
        json!({ "id": id, "name": name, "role": role, "is_active": is_active }),
    )))
}

async fn update_user_role(
    Extension(state): Extension<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !is_valid_role(&payload.role) {
        return Err(bad_request("Invalid role"));
    }

    let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(&payload.role)
        .bind(user_id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(not_found("User not found"));
    }

    tracing::info!("Admin {} set role of user {} to {}", admin.name, user_id, payload.role);
    Ok(Json(ApiResponse::message("User role updated")))
}

async fn update_user_status(
    Extension(state): Extension<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let is_active = payload.is_active.unwrap_or(true);

    let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
        .bind(is_active)
        .bind(user_id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(not_found("User not found"));
    }

    tracing::info!("Admin {} set user {} active={}", admin.name, user_id, is_active);
    Ok(Json(ApiResponse::message("User status updated")))
}

async fn simple_users(Extension(state): Extension<Arc<AppState>>) -> AdminResult {
    let users = sqlx::query_as::<_, IdName>("SELECT id, name FROM users ORDER BY id")
        .fetch_all(&state.pool)
        .await
        .map_err(db_error)?;

    Ok(Json(ApiResponse::ok("Users loaded", json!({ "users": users }))))
}

// ---------------------------------------------------------------- catalog

const VOD_FILTER: &str = "WHERE ($1::text IS NULL OR d.vod_name ILIKE '%' || $1 || '%') \
     AND ($2::text IS NULL OR d.type_name ILIKE '%' || $2 || '%')";

async fn list_videos(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AdminVideosQuery>,
) -> AdminResult {
    let paging = Paging::new(params.page, params.page_size, 20, 100);
    let vod_name = filter_text(&params.vod_name);
    let type_name = filter_text(&params.type_name);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM vod_details d {}", VOD_FILTER))
        .bind(vod_name)
        .bind(type_name)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)?;

    let videos = sqlx::query_as::<_, AdminVodItem>(&format!(
        "SELECT d.id, d.vod_name, d.vod_pic, d.vod_remarks, d.type_name, d.vod_time, \
                (SELECT COUNT(*) FROM comments c WHERE c.movdetail_id = d.id) AS comment_count \
         FROM vod_details d {} ORDER BY d.id DESC OFFSET $3 LIMIT $4",
        VOD_FILTER
    ))
    .bind(vod_name)
    .bind(type_name)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Videos loaded",
        paged("videos", videos, PageInfo::new(paging.page, paging.per_page, total)),
    )))
}

async fn create_video(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateVodRequest>,
) -> AdminResult {
    let vod_name = payload.vod_name.trim();
    let type_name = payload.type_name.trim();
    if vod_name.is_empty() || type_name.is_empty() {
        return Err(bad_request("vod_name and type_name are required"));
    }

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO vod_details \
            (vod_name, vod_pic, vod_remarks, type_id, type_name, vod_content, vod_play_url, vod_time) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING id",
    )
    .bind(vod_name)
    .bind(payload.vod_pic.unwrap_or_default())
    .bind(payload.vod_remarks.unwrap_or_default())
    .bind(catalog::type_id_for_name(type_name))
    .bind(type_name)
    .bind(payload.vod_content.unwrap_or_default())
    .bind(payload.vod_play_url.unwrap_or_default())
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::info!("Catalog entry {} created: {}", id, vod_name);

    Ok(Json(ApiResponse::ok(
        "Video created",
        json!({ "id": id, "vod_name": vod_name, "type_name": type_name }),
    )))
}

async fn delete_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    // comments on the entry cascade
    if !delete_by_id(&state, "vod_details", video_id).await? {
        return Err(not_found("Video not found"));
    }
    tracing::info!("Catalog entry {} deleted", video_id);
    Ok(Json(ApiResponse::message("Video deleted")))
}

async fn simple_videos(Extension(state): Extension<Arc<AppState>>) -> AdminResult {
    let videos = sqlx::query_as::<_, IdName>(
        "SELECT id, vod_name AS name FROM vod_details ORDER BY id LIMIT $1",
    )
    .bind(SIMPLE_VIDEO_LIMIT)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    let videos: Vec<Value> = videos
        .into_iter()
        .map(|v| json!({ "id": v.id, "vod_name": v.name }))
        .collect();

    Ok(Json(ApiResponse::ok("Videos loaded", json!({ "videos": videos }))))
}

async fn video_types(Extension(state): Extension<Arc<AppState>>) -> AdminResult {
    let types: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT type_name FROM vod_details \
         WHERE type_name IS NOT NULL AND type_name <> '' ORDER BY type_name",
    )
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok("Video types loaded", json!({ "types": types }))))
}

// ---------------------------------------------------------------- comments

#[derive(sqlx::FromRow)]
struct CommentAdminRow {
    id: i32,
    body: String,
    user_name: Option<String>,
    vod_name: Option<String>,
    timestamp: chrono::DateTime<chrono::Utc>,
    replied_id: Option<i32>,
}

const COMMENT_FROM: &str = "FROM comments c \
     LEFT JOIN users u ON u.id = c.user_id \
     LEFT JOIN vod_details d ON d.id = c.movdetail_id \
     WHERE ($1::text IS NULL OR c.body ILIKE '%' || $1 || '%') \
       AND ($2::text IS NULL OR u.name ILIKE '%' || $2 || '%') \
       AND ($3::text IS NULL OR d.vod_name ILIKE '%' || $3 || '%')";

async fn list_comments(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AdminCommentsQuery>,
) -> AdminResult {
    let paging = Paging::new(params.page, params.page_size, 20, 100);
    let content = filter_text(&params.content);
    let username = filter_text(&params.username);
    let vod_name = filter_text(&params.vod_name);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", COMMENT_FROM))
        .bind(content)
        .bind(username)
        .bind(vod_name)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)?;

    let rows = sqlx::query_as::<_, CommentAdminRow>(&format!(
        "SELECT c.id, c.body, u.name AS user_name, d.vod_name, c.timestamp, c.replied_id {} \
         ORDER BY c.timestamp DESC OFFSET $4 LIMIT $5",
        COMMENT_FROM
    ))
    .bind(content)
    .bind(username)
    .bind(vod_name)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    let comments: Vec<AdminCommentItem> = rows
        .into_iter()
        .map(|r| AdminCommentItem {
            id: r.id,
            body: r.body,
            user_name: r.user_name.unwrap_or_default(),
            vod_name: r.vod_name.unwrap_or_default(),
            timestamp: format_local(&r.timestamp, DATETIME),
            is_reply: r.replied_id.is_some(),
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        "Comments loaded",
        paged("comments", comments, PageInfo::new(paging.page, paging.per_page, total)),
    )))
}

async fn create_comment(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateCommentRequest>,
) -> AdminResult {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(bad_request("body is required"));
    }
    ensure_exists(&state, "users", payload.user_id, "User does not exist").await?;
    ensure_exists(&state, "vod_details", payload.movdetail_id, "Video does not exist").await?;
    if let Some(parent) = payload.replied_id {
        ensure_exists(&state, "comments", parent, "Parent comment does not exist").await?;
    }

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO comments (body, timestamp, user_id, movdetail_id, replied_id) \
         VALUES ($1, NOW(), $2, $3, $4) RETURNING id",
    )
    .bind(body)
    .bind(payload.user_id)
    .bind(payload.movdetail_id)
    .bind(payload.replied_id)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Comment created",
        json!({
            "id": id,
            "body": body,
            "user_id": payload.user_id,
            "movdetail_id": payload.movdetail_id,
        }),
    )))
}

async fn delete_comment(
    Extension(state): Extension<Arc<AppState>>,
    Path(comment_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    // replies cascade through replied_id
    if !delete_by_id(&state, "comments", comment_id).await? {
        return Err(not_found("Comment not found"));
    }
    Ok(Json(ApiResponse::message("Comment deleted")))
}

// ---------------------------------------------------------------- live

const LIVE_FILTER: &str = "WHERE ($1::text IS NULL OR s.title ILIKE '%' || $1 || '%') \
     AND ($2::text IS NULL OR u.name ILIKE '%' || $2 || '%') \
     AND ($3::int IS NULL OR s.status = $3)";

fn status_text(status: i32) -> &'static str {
    if status == STATUS_LIVE {
        "live"
    } else {
        "ended"
    }
}

fn to_admin_stream(row: LiveStreamRow) -> AdminLiveStreamItem {
    AdminLiveStreamItem {
        id: row.id,
        title: row.title,
        description: row.description,
        streamer: row.streamer.unwrap_or_else(|| UNKNOWN_STREAMER.to_string()),
        streamer_id: row.user_id,
        status: row.status,
        status_text: status_text(row.status).to_string(),
        viewer_count: row.viewer_count,
        max_viewers: row.max_viewers,
        comment_count: row.chat_count,
        stream_key: row.stream_key,
        created_time: Some(format_local(&row.created_time, DATETIME)),
        start_time: row.start_time.as_ref().map(|t| format_local(t, DATETIME)),
        end_time: row.end_time.as_ref().map(|t| format_local(t, DATETIME)),
    }
}

async fn list_live_streams(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AdminLiveStreamsQuery>,
) -> AdminResult {
    let paging = Paging::new(params.page, params.page_size, 20, 100);
    let title = filter_text(&params.title);
    let streamer = filter_text(&params.streamer);

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM live_streams s LEFT JOIN users u ON u.id = s.user_id {}",
        LIVE_FILTER
    ))
    .bind(title)
    .bind(streamer)
    .bind(params.status)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    let rows = sqlx::query_as::<_, LiveStreamRow>(&format!(
        "{} {} ORDER BY s.created_time DESC OFFSET $4 LIMIT $5",
        LIVE_STREAM_SELECT, LIVE_FILTER
    ))
    .bind(title)
    .bind(streamer)
    .bind(params.status)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    let streams: Vec<AdminLiveStreamItem> = rows.into_iter().map(to_admin_stream).collect();

    Ok(Json(ApiResponse::ok(
        "Live streams loaded",
        paged("streams", streams, PageInfo::new(paging.page, paging.per_page, total)),
    )))
}

async fn create_live_stream(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateLiveStreamRequest>,
) -> AdminResult {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(bad_request("title is required"));
    }
    let status = payload.status.unwrap_or(STATUS_LIVE);
    if status != STATUS_LIVE && status != STATUS_ENDED {
        return Err(bad_request("status must be 0 or 1"));
    }

    let streamer: String = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
        .bind(payload.user_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| bad_request("User does not exist"))?;

    let stream_key = live_meta::generate_stream_key();
    let cover = payload
        .cover_image
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_COVER);

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO live_streams \
            (title, description, cover_image, stream_key, category, tags, status, viewer_count, \
             max_viewers, likes, start_time, created_time, user_id) \
         VALUES ($1, $2, $3, $4, $5, '', $6, 0, 0, 0, \
                 CASE WHEN $6 = 1 THEN NOW() ELSE NULL END, NOW(), $7) RETURNING id",
    )
    .bind(title)
    .bind(payload.description.unwrap_or_default())
    .bind(cover)
    .bind(&stream_key)
    .bind(live_meta::DEFAULT_CATEGORY)
    .bind(status)
    .bind(payload.user_id)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Live stream created",
        json!({ "id": id, "title": title, "stream_key": stream_key, "streamer": streamer }),
    )))
}

async fn delete_live_stream(
    Extension(state): Extension<Arc<AppState>>,
    Path(stream_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !delete_by_id(&state, "live_streams", stream_id).await? {
        return Err(not_found("Live stream not found"));
    }
    Ok(Json(ApiResponse::message("Live stream deleted")))
}

async fn update_stream_status(
    Extension(state): Extension<Arc<AppState>>,
    Path(stream_id): Path<i32>,
    Json(payload): Json<StreamStatusRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let sql = match payload.status {
        STATUS_ENDED => "UPDATE live_streams SET status = 0, end_time = NOW() WHERE id = $1",
        STATUS_LIVE => {
            "UPDATE live_streams SET status = 1, start_time = NOW(), end_time = NULL WHERE id = $1"
        }
        _ => return Err(bad_request("status must be 0 or 1")),
    };

    let result = sqlx::query(sql)
        .bind(stream_id)
        .execute(&state.pool)
        .await
        .map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(not_found("Live stream not found"));
    }

    tracing::info!("Live stream {} set to {}", stream_id, status_text(payload.status));
    Ok(Json(ApiResponse::message("Live stream status updated")))
}

#[derive(sqlx::FromRow)]
struct LiveCommentAdminRow {
    id: i32,
    content: String,
    user_name: Option<String>,
    user_id: Option<i32>,
    stream_title: Option<String>,
    stream_id: i32,
    timestamp: chrono::DateTime<chrono::Utc>,
}

const LIVE_COMMENT_FROM: &str = "FROM live_comments lc \
     LEFT JOIN users u ON u.id = lc.user_id \
     LEFT JOIN live_streams s ON s.id = lc.live_stream_id \
     WHERE ($1::text IS NULL OR lc.content ILIKE '%' || $1 || '%') \
       AND ($2::text IS NULL OR u.name ILIKE '%' || $2 || '%') \
       AND ($3::text IS NULL OR s.title ILIKE '%' || $3 || '%')";

async fn list_live_comments(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AdminLiveCommentsQuery>,
) -> AdminResult {
    let paging = Paging::new(params.page, params.page_size, 20, 100);
    let content = filter_text(&params.content);
    let username = filter_text(&params.username);
    let stream_title = filter_text(&params.stream_title);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", LIVE_COMMENT_FROM))
        .bind(content)
        .bind(username)
        .bind(stream_title)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)?;

    let rows = sqlx::query_as::<_, LiveCommentAdminRow>(&format!(
        "SELECT lc.id, lc.content, u.name AS user_name, lc.user_id, s.title AS stream_title, \
                lc.live_stream_id AS stream_id, lc.timestamp {} \
         ORDER BY lc.timestamp DESC OFFSET $4 LIMIT $5",
        LIVE_COMMENT_FROM
    ))
    .bind(content)
    .bind(username)
    .bind(stream_title)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    let comments: Vec<AdminLiveCommentItem> = rows
        .into_iter()
        .map(|r| AdminLiveCommentItem {
            id: r.id,
            content: r.content,
            user_name: r.user_name.unwrap_or_default(),
            user_id: r.user_id,
            stream_title: r.stream_title.unwrap_or_default(),
            stream_id: r.stream_id,
            timestamp: format_local(&r.timestamp, DATETIME),
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        "Live comments loaded",
        paged("comments", comments, PageInfo::new(paging.page, paging.per_page, total)),
    )))
}

async fn create_live_comment(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateLiveCommentRequest>,
) -> AdminResult {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(bad_request("content is required"));
    }

    let user_name: String = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
        .bind(payload.user_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| bad_request("User does not exist"))?;

    let stream_title: String = sqlx::query_scalar("SELECT title FROM live_streams WHERE id = $1")
        .bind(payload.stream_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| bad_request("Live stream does not exist"))?;

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO live_comments (live_stream_id, user_id, content, timestamp) \
         VALUES ($1, $2, $3, NOW()) RETURNING id",
    )
    .bind(payload.stream_id)
    .bind(payload.user_id)
    .bind(content)
    .fetch_one(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiResponse::ok(
        "Live comment created",
        json!({
            "id": id,
            "content": content,
            "user_name": user_name,
            "stream_title": stream_title,
        }),
    )))
}

async fn delete_live_comment(
    Extension(state): Extension<Arc<AppState>>,
    Path(comment_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !delete_by_id(&state, "live_comments", comment_id).await? {
        return Err(not_found("Live comment not found"));
    }
    Ok(Json(ApiResponse::message("Live comment deleted")))
}

// ---------------------------------------------------------------- stats

async fn count(state: &AppState, sql: &str) -> ApiResult<i64> {
    sqlx::query_scalar(sql)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)
}

async fn count_between(
    state: &AppState,
    sql: &str,
    bounds: (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>),
) -> ApiResult<i64> {
    sqlx::query_scalar(sql)
        .bind(bounds.0)
        .bind(bounds.1)
        .fetch_one(&state.pool)
        .await
        .map_err(db_error)
}

async fn stats(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<ApiResponse<Stats>>> {
    let today = today_bounds(chrono::Utc::now());

    let stats = Stats {
        user_count: count(&state, "SELECT COUNT(*) FROM users").await?,
        video_count: count(&state, "SELECT COUNT(*) FROM vod_details").await?,
        comment_count: count(&state, "SELECT COUNT(*) FROM comments").await?,
        live_count: count(&state, "SELECT COUNT(*) FROM live_streams").await?,
        today_users: count_between(
            &state,
            "SELECT COUNT(*) FROM users WHERE created_at >= $1 AND created_at < $2",
            today,
        )
        .await?,
        today_comments: count_between(
            &state,
            "SELECT COUNT(*) FROM comments WHERE timestamp >= $1 AND timestamp < $2",
            today,
        )
        .await?,
    };

    Ok(Json(ApiResponse::ok("Stats loaded", stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_ignored() {
        assert_eq!(filter_text(&Some("  anna ".to_string())), Some("anna"));
        assert_eq!(filter_text(&Some("   ".to_string())), None);
        assert_eq!(filter_text(&None), None);
    }

    #[test]
    fn test_paged_payload_shape() {
        let value = paged("users", vec![json!({ "id": 1 })], PageInfo::new(2, 10, 21));
        assert_eq!(value["users"][0]["id"], 1);
        assert_eq!(value["pagination"]["page"], 2);
        assert_eq!(value["pagination"]["pages"], 3);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(STATUS_LIVE), "live");
        assert_eq!(status_text(STATUS_ENDED), "ended");
    }
}
