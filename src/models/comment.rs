use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Comment row joined with its author's name.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: i32,
    pub body: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user_id: i32,
    pub user_name: String,
    pub movdetail_id: i32,
    pub replied_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CommentCreate {
    pub body: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReplyItem {
    pub id: i32,
    pub user_name: String,
    pub reply_user_name: Option<String>,
    pub body: String,
    pub time: String,
    pub user_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CommentItem {
    pub id: i32,
    pub user_name: String,
    pub body: String,
    pub time: String,
    pub user_id: i32,
    pub reply_list: Vec<ReplyItem>,
}
