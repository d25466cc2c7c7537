use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use lazy_static::lazy_static;

use crate::errors::AppError;

lazy_static! {
    /// Argon2id with explicit parameters: memory=19456 KiB, iterations=2, parallelism=1
    static ref ARGON2: Argon2<'static> = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(19456, 2, 1, None).expect("Invalid Argon2 params")
    );

    /// Verified against when the email is unknown, so both sign-in failures cost the same
    static ref DUMMY_HASH: String = {
        let salt = SaltString::generate(&mut OsRng);
        ARGON2
            .hash_password(b"pocketful-dummy-password", &salt)
            .map(|hash| hash.to_string())
            .expect("Failed to build dummy password hash")
    };
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    ARGON2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(format!("Invalid password hash: {e}")))?;
    Ok(ARGON2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Burn one verification for a sign-in against an unknown email
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_argon2id() {
        let hash = hash_password("Secure_password123").expect("Should hash password");
        assert!(hash.starts_with("$argon2id$"), "Hash should be Argon2id format");
    }

    #[test]
    fn test_hash_password_different_salts() {
        let hash1 = hash_password("same_password").expect("Should hash password");
        let hash2 = hash_password("same_password").expect("Should hash password");
        assert_ne!(hash1, hash2, "Hashes should differ due to random salt");
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Correct1").expect("Should hash password");
        assert!(verify_password("Correct1", &hash).expect("Should verify"));
        assert!(!verify_password("Wrong1", &hash).expect("Should verify"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "invalid_hash");
        assert!(result.is_err(), "Invalid hash should return error");
    }

    #[test]
    fn test_dummy_verification_does_not_panic() {
        verify_against_dummy("anything");
    }
}
