// src/services/mod.rs
pub mod catalog;
pub mod collection_list;
pub mod comment_tree;
pub mod display_time;
pub mod live_meta;
pub mod m3u8;
pub mod password;
pub mod token;
