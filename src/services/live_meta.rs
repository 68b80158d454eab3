// src/services/live_meta.rs
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde_json::Value;

pub const DEFAULT_CATEGORY: &str = "entertainment";

/// Maps english, chinese and numeric aliases onto the canonical categories.
pub fn normalize_category(raw: Option<&Value>) -> &'static str {
    let text = match raw {
        Some(Value::String(s)) => s.trim().to_lowercase(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return DEFAULT_CATEGORY,
    };

    if let Ok(index) = text.parse::<u32>() {
        return match index {
            0 => "gaming",
            1 => "entertainment",
            2 => "music",
            3 => "education",
            4 => "other",
            _ => DEFAULT_CATEGORY,
        };
    }

    match text.as_str() {
        "gaming" | "game" | "游戏" => "gaming",
        "entertainment" | "ent" | "娱乐" => "entertainment",
        "music" | "音乐" => "music",
        "education" | "edu" | "知识" | "教育" => "education",
        "other" | "其他" => "other",
        _ => DEFAULT_CATEGORY,
    }
}

/// 12 random bytes, url-safe base64 encoded (16 characters).
pub fn generate_stream_key() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn push_url(push_base: &str, stream_key: &str) -> String {
    format!("{}/{}", push_base.trim_end_matches('/'), stream_key)
}

pub fn play_url(play_base: &str, stream_key: &str) -> String {
    format!("{}/{}.flv", play_base.trim_end_matches('/'), stream_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_aliases() {
        assert_eq!(normalize_category(Some(&json!("Game"))), "gaming");
        assert_eq!(normalize_category(Some(&json!("知识"))), "education");
        assert_eq!(normalize_category(Some(&json!(2))), "music");
        assert_eq!(normalize_category(Some(&json!("3"))), "education");
        assert_eq!(normalize_category(Some(&json!("cooking"))), DEFAULT_CATEGORY);
        assert_eq!(normalize_category(Some(&json!(99))), DEFAULT_CATEGORY);
        assert_eq!(normalize_category(None), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_stream_keys_are_url_safe_and_unique() {
        let a = generate_stream_key();
        let b = generate_stream_key();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_stream_urls() {
        assert_eq!(push_url("rtmp://localhost:1935/live/", "k1"), "rtmp://localhost:1935/live/k1");
        assert_eq!(play_url("http://localhost:8000/live", "k1"), "http://localhost:8000/live/k1.flv");
    }
}
