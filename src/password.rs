//! Password utilities

use argon2::Argon2;
use argon2::password_hash::Error;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use rand::Rng;
use rand::RngCore;
use rand::distr::Alphanumeric;

/// Length of generated passwords
const GENERATED_LENGTH: usize = 24;

/// Generate a random password
pub fn generate() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a password with a fresh salt
pub fn hash(password: &str) -> Result<String, Error> {
    let mut salt = [0_u8; 16];
    rand::rng().fill_bytes(&mut salt);

    let salt = SaltString::encode_b64(&salt)?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hashed_password| hashed_password.to_string())
}

/// Verify a password against a stored hash
///
/// A hash that can not be parsed never matches
pub fn verify(hashed_password: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hashed_password) else {
        tracing::warn!("Stored password hash could not be parsed");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed_password = hash("verysecret").unwrap();

        assert!(verify(&hashed_password, "verysecret"));
        assert!(!verify(&hashed_password, "notsosecret"));
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert!(!verify("not a hash", "verysecret"));
    }

    #[test]
    fn test_generate() {
        let password = generate();

        assert_eq!(GENERATED_LENGTH, password.len());
        assert!(password.chars().all(|ch| ch.is_ascii_alphanumeric()));
        assert_ne!(password, generate());
    }
}
