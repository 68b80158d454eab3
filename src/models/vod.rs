use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog entry (movie, series episode list, show).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VodDetail {
    pub id: i32,
    pub vod_name: Option<String>,
    pub vod_pic: Option<String>,
    pub vod_remarks: Option<String>,
    pub type_id: Option<i32>,
    pub type_name: Option<String>,
    pub vod_content: Option<String>,
    pub vod_play_url: Option<String>,
    pub vod_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Card shown in listings.
#[derive(Debug, Serialize, FromRow)]
pub struct VodItem {
    pub vod_id: i32,
    pub vod_pic: Option<String>,
    pub vod_name: Option<String>,
    pub vod_remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VodDetailData {
    pub id: i32,
    pub vod_name: String,
    pub vod_pic: String,
    pub vod_remarks: String,
    pub type_id: i32,
    pub type_name: String,
    pub vod_content: String,
    pub vod_play_url: serde_json::Map<String, serde_json::Value>,
    pub vod_time: Option<String>,
}

/// Detail endpoint keeps its historical `msg` key.
#[derive(Debug, Serialize)]
pub struct VodDetailResponse {
    pub code: u16,
    pub data: VodDetailData,
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct VodListQuery {
    pub page: Option<i64>,
    pub movtype: Option<i32>,
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VodDetailQuery {
    pub vod_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}
