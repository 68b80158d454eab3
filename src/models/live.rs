use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_LIVE: i32 = 1;
pub const STATUS_ENDED: i32 = 0;

pub const DEFAULT_COVER: &str = "/api/imgs/live-default.jpg";
pub const DEFAULT_AVATAR: &str = "/api/imgs/avatar-default.jpg";

/// Live stream row joined with the streamer's name and chat count.
#[derive(Debug, Clone, FromRow)]
pub struct LiveStreamRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub stream_key: String,
    pub category: String,
    pub tags: String,
    pub status: i32,
    pub viewer_count: i32,
    pub max_viewers: i32,
    pub likes: i32,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub created_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub user_id: Option<i32>,
    pub streamer: Option<String>,
    pub chat_count: i64,
}

/// Select list producing a `LiveStreamRow` from `live_streams s`.
pub const LIVE_STREAM_SELECT: &str = "SELECT s.id, s.title, s.description, s.cover_image, s.stream_key, \
     s.category, s.tags, s.status, s.viewer_count, s.max_viewers, s.likes, s.start_time, \
     s.created_time, s.end_time, s.user_id, u.name AS streamer, \
     (SELECT COUNT(*) FROM live_comments lc WHERE lc.live_stream_id = s.id) AS chat_count \
     FROM live_streams s LEFT JOIN users u ON u.id = s.user_id";

pub const UNKNOWN_STREAMER: &str = "Unknown streamer";
pub const ANONYMOUS_USER: &str = "Anonymous";

#[derive(Debug, Deserialize)]
pub struct LiveStreamCreate {
    pub title: Option<String>,
    pub category: Option<serde_json::Value>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LiveStreamItem {
    pub id: i32,
    pub stream_id: i32,
    pub title: String,
    pub description: String,
    pub cover: String,
    pub category: String,
    pub status: i32,
    pub viewer_count: i32,
    pub streamer: String,
    pub avatar: String,
    pub likes: i64,
    pub chat_count: i64,
    pub created_time: String,
}

#[derive(Debug, Serialize)]
pub struct LivePagination {
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
    pub total: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct LiveStreamListResponse {
    pub code: u16,
    pub message: String,
    pub data: Vec<LiveStreamItem>,
    pub pagination: LivePagination,
}

#[derive(Debug, Serialize)]
pub struct LiveStreamCreated {
    pub stream_id: i32,
    pub stream_key: String,
    pub push_url: String,
    pub play_url: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub tags: String,
}

#[derive(Debug, Serialize)]
pub struct LiveStreamDetail {
    pub id: i32,
    pub stream_id: i32,
    pub title: String,
    pub description: String,
    pub cover: String,
    pub category: String,
    pub status: i32,
    pub viewer_count: i32,
    pub streamer: String,
    pub streamer_name: String,
    pub avatar: String,
    pub likes: i64,
    pub chat_count: i64,
    pub created_time: String,
    pub stream_key: String,
    pub play_url: String,
    pub push_url: String,
    pub tags: String,
    pub created_at: String,
    pub cover_image: String,
}

#[derive(Debug, Deserialize)]
pub struct LiveListQuery {
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LiveCommentCreate {
    pub stream_id: i32,
    pub content: String,
}

#[derive(Debug, FromRow)]
pub struct LiveCommentRow {
    pub id: i32,
    pub live_stream_id: i32,
    pub user_id: Option<i32>,
    pub user_name: Option<String>,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct LiveCommentItem {
    pub id: i32,
    pub username: String,
    pub avatar: String,
    pub content: String,
    pub time: String,
    #[serde(rename = "isOwn")]
    pub is_own: bool,
    #[serde(rename = "isSystem")]
    pub is_system: bool,
}

#[derive(Debug, Serialize)]
pub struct LiveCommentCreated {
    pub id: i32,
    pub content: String,
    pub created_time: String,
}

#[derive(Debug, Serialize)]
pub struct LikeData {
    pub likes: i64,
}
