// src/handlers/mod.rs
pub mod admin;
pub mod ai_search;
pub mod auth;
pub mod collection;
pub mod comments;
pub mod live;
pub mod videos;
pub mod vod;
