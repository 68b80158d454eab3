// src/config.rs
use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "fastflix-development-secret";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the OpenAI-compatible chat endpoint used by the AI search.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AiSearchConfig {
    pub max_corrections: u32,
    pub row_limit: u32,
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
    pub llm: Option<LlmConfig>,
    pub ai_search: AiSearchConfig,
    pub live_push_base: String,
    pub live_play_base: String,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let llm = match env::var("OPENAI_API_KEY").ok() {
            Some(api_key) if !api_key.is_empty() => Some(LlmConfig {
                api_key,
                base_url: string_or("OPENAI_BASE_URL", "https://api.deepseek.com/v1"),
                model: string_or("OPENAI_MODEL", "deepseek-chat"),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: string_or("BIND_ADDR", "127.0.0.1:8000"),
            jwt_secret,
            jwt_expire_minutes: parse_or("JWT_EXPIRE_MINUTES", 30)?,
            llm,
            ai_search: AiSearchConfig {
                max_corrections: parse_or("AI_SEARCH_MAX_CORRECTIONS", 1)?,
                row_limit: parse_or("AI_SEARCH_ROW_LIMIT", 50)?,
                statement_timeout_ms: parse_or("AI_SEARCH_STATEMENT_TIMEOUT_MS", 5000)?,
            },
            live_push_base: string_or("LIVE_PUSH_BASE", "rtmp://localhost:1935/live"),
            live_play_base: string_or("LIVE_PLAY_BASE", "http://localhost:8000/live"),
            static_dir: string_or("STATIC_DIR", "static"),
        })
    }
}

fn string_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back_and_rejects_garbage() {
        env::remove_var("FASTFLIX_TEST_UNSET");
        assert_eq!(parse_or::<u32>("FASTFLIX_TEST_UNSET", 7).unwrap(), 7);

        env::set_var("FASTFLIX_TEST_NUMBER", " 42 ");
        assert_eq!(parse_or::<u32>("FASTFLIX_TEST_NUMBER", 7).unwrap(), 42);

        env::set_var("FASTFLIX_TEST_BAD", "lots");
        assert!(matches!(
            parse_or::<u32>("FASTFLIX_TEST_BAD", 7),
            Err(ConfigError::Invalid { key: "FASTFLIX_TEST_BAD", .. })
        ));
    }
}
