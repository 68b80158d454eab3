// src/agent/schema.rs

/// Tables the search agent may read. `users` is deliberately absent: it holds
/// password hashes.
pub const ALLOWED_TABLES: &[&str] = &["vod_details", "vod_types", "videos", "comments"];

/// Schema description embedded in the generation prompt.
pub const SCHEMA_DESCRIPTION: &str = r#"Table vod_details (catalog of movies, series, anime and shows)
  id            integer primary key
  vod_name      varchar(200)   title
  vod_pic       varchar(500)   poster image url
  vod_remarks   varchar(100)   status note, e.g. "HD" or "Episode 12"
  type_id       integer        category id, see vod_types
  type_name     varchar(50)    category name, e.g. 动作片, 国产剧, 韩国剧, 日本动漫
  vod_content   text           synopsis
  vod_play_url  text           episode list, never select it
  vod_time      timestamptz    last update time

Table vod_types (catalog categories)
  type_id       integer primary key
  type_name     varchar(50)

Table comments (user comments on catalog entries)
  id            integer primary key
  body          text
  timestamp     timestamptz
  user_id       integer
  movdetail_id  integer        references vod_details.id
  replied_id    integer        parent comment id, null for top-level comments

Table videos (user-published video links)
  id            integer primary key
  title         varchar(200)
  description   text
  url           varchar(500)
  created_at    timestamptz
  owner_id      integer
"#;

pub fn is_allowed_table(name: &str) -> bool {
    ALLOWED_TABLES.iter().any(|t| t.eq_ignore_ascii_case(name))
}
