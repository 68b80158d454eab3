pub mod admin;
pub mod auth;
pub mod collection;
pub mod comment;
pub mod live;
pub mod response;
pub mod search;
pub mod video;
pub mod vod;
