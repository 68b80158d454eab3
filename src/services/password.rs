// src/services/password.rs
use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// bcrypt only looks at the first 72 bytes of its input.
const BCRYPT_MAX_BYTES: usize = 72;

/// Truncates to at most 72 bytes without splitting a UTF-8 sequence.
pub fn truncate_for_bcrypt(password: &str) -> &str {
    if password.len() <= BCRYPT_MAX_BYTES {
        return password;
    }
    let mut end = BCRYPT_MAX_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(truncate_for_bcrypt(password), DEFAULT_COST)
}

/// Returns false for empty or malformed hashes instead of erroring.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    if password_hash.is_empty() {
        return false;
    }
    match verify(truncate_for_bcrypt(password), password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Password verification failed on stored hash: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let ascii = "a".repeat(100);
        assert_eq!(truncate_for_bcrypt(&ascii).len(), 72);

        // "é" is two bytes, so 72 bytes would land mid-character at 71 + 1
        let mixed = format!("{}{}", "a".repeat(71), "é".repeat(5));
        let cut = truncate_for_bcrypt(&mixed);
        assert_eq!(cut.len(), 71);
        assert!(cut.chars().all(|c| c == 'a'));

        assert_eq!(truncate_for_bcrypt("short"), "short");
    }

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("hunter22").unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("hunter22", &hashed));
        assert!(!verify_password("hunter23", &hashed));
    }

    #[test]
    fn test_verify_rejects_garbage_hashes() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn test_long_passwords_match_on_prefix() {
        let long = "p".repeat(90);
        let hashed = hash_password(&long).unwrap();
        assert!(verify_password(&"p".repeat(72), &hashed));
    }
}
