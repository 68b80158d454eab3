use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct UserCollection {
    pub id: i32,
    pub user_id: i32,
    pub movdetail_id_list: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CollectionItem {
    pub vod_id: i32,
    pub vod_pic: Option<String>,
    pub vod_name: Option<String>,
    pub vod_remarks: Option<String>,
    pub type_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CollectionPagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct CollectionData {
    pub collections: Vec<CollectionItem>,
    pub pagination: CollectionPagination,
}

#[derive(Debug, Deserialize)]
pub struct CollectionShowQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionVodQuery {
    pub vod_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CollectionChange {
    pub vod_id: i32,
}
