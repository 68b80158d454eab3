use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user-published video link.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub owner_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct VideoPayload {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl VideoPayload {
    /// Title must be non-blank and the url an absolute http(s) address.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        match reqwest::Url::parse(self.url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
            _ => Err("url must be an absolute http(s) URL".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str, url: &str) -> VideoPayload {
        VideoPayload {
            title: title.to_string(),
            description: None,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_video_payload_validation() {
        assert!(payload("Trailer", "https://cdn.example.com/a.mp4").validate().is_ok());
        assert!(payload("  ", "https://cdn.example.com/a.mp4").validate().is_err());
        assert!(payload("Trailer", "ftp://cdn.example.com/a.mp4").validate().is_err());
        assert!(payload("Trailer", "/relative/a.mp4").validate().is_err());
    }
}
