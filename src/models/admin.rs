use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AdminUsersQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AdminVideosQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub vod_name: Option<String>,
    pub type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminCommentsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub content: Option<String>,
    pub username: Option<String>,
    pub vod_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminLiveStreamsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub title: Option<String>,
    pub streamer: Option<String>,
    pub status: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AdminLiveCommentsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub content: Option<String>,
    pub username: Option<String>,
    pub stream_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVodRequest {
    pub vod_name: String,
    pub type_name: String,
    pub vod_pic: Option<String>,
    pub vod_remarks: Option<String>,
    pub vod_content: Option<String>,
    pub vod_play_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub user_id: i32,
    pub movdetail_id: i32,
    pub replied_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLiveStreamRequest {
    pub title: String,
    pub user_id: i32,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub status: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLiveCommentRequest {
    pub content: String,
    pub user_id: i32,
    pub stream_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct StreamStatusRequest {
    pub status: i32,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminUserItem {
    pub id: i32,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub video_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminVodItem {
    pub id: i32,
    pub vod_name: Option<String>,
    pub vod_pic: Option<String>,
    pub vod_remarks: Option<String>,
    pub type_name: Option<String>,
    pub vod_time: Option<chrono::DateTime<chrono::Utc>>,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminCommentItem {
    pub id: i32,
    pub body: String,
    pub user_name: String,
    pub vod_name: String,
    pub timestamp: String,
    pub is_reply: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminLiveStreamItem {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub streamer: String,
    pub streamer_id: Option<i32>,
    pub status: i32,
    pub status_text: String,
    pub viewer_count: i32,
    pub max_viewers: i32,
    pub comment_count: i64,
    pub stream_key: String,
    pub created_time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminLiveCommentItem {
    pub id: i32,
    pub content: String,
    pub user_name: String,
    pub user_id: Option<i32>,
    pub stream_title: String,
    pub stream_id: i32,
    pub timestamp: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct IdName {
    pub id: i32,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub user_count: i64,
    pub video_count: i64,
    pub comment_count: i64,
    pub live_count: i64,
    pub today_users: i64,
    pub today_comments: i64,
}
