// src/services/token.rs
use crate::models::auth::{Claims, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Prefix the frontend stores in front of issued tokens.
pub const TOKEN_PREFIX: &str = "jwt ";

pub fn generate_jwt_token(
    user: &User,
    secret: &str,
    expire_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now + Duration::minutes(expire_minutes);

    let claims = Claims {
        sub: user.id.to_string(),
        name: user.name.clone(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_jwt_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Pulls the raw token out of an Authorization header value.
///
/// Accepts `Bearer <t>`, `Bearer jwt <t>` and `jwt <t>`.
pub fn extract_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let value = value.strip_prefix("Bearer ").unwrap_or(value).trim_start();
    let value = value.strip_prefix(TOKEN_PREFIX).unwrap_or(value).trim();
    if value.is_empty() || value.contains(' ') {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            name: "sakura".to_string(),
            password_hash: String::new(),
            role: "admin".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_carries_identity() {
        let token = generate_jwt_token(&user(), "secret", 30).unwrap();
        let claims = verify_jwt_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.name, "sakura");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_and_expired_tokens_fail() {
        let token = generate_jwt_token(&user(), "secret", 30).unwrap();
        assert!(verify_jwt_token(&token, "other").is_err());

        let expired = generate_jwt_token(&user(), "secret", -10).unwrap();
        assert!(verify_jwt_token(&expired, "secret").is_err());
    }

    #[test]
    fn test_extract_token_prefixes() {
        assert_eq!(extract_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_token("Bearer jwt abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_token("jwt abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("Basic dXNlcjpwYXNz extra"), None);
    }
}
