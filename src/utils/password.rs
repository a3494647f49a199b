use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Newtype for plaintext passwords to prevent accidental logging.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Hash a password with Argon2id. A fresh random salt is generated per call
/// and encoded into the returned hash string.
pub fn hash_password(password: &Password) -> Result<String, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash. Never errors: a malformed
/// digest or mismatch both come back as `false`.
pub fn verify_password(password: &Password, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies() {
        let password = Password::new("Secret123".to_string());
        let hash = hash_password(&password).unwrap();

        assert!(verify_password(&password, &hash));
        assert!(!verify_password(&Password::new("Secret124".to_string()), &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = Password::new("Secret123".to_string());
        let first = hash_password(&password).unwrap();
        let second = hash_password(&password).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_digest_is_a_mismatch_not_an_error() {
        let password = Password::new("Secret123".to_string());
        assert!(!verify_password(&password, "not-a-phc-string"));
        assert!(!verify_password(&password, ""));
    }

    #[test]
    fn debug_never_prints_the_plaintext() {
        let password = Password::new("Secret123".to_string());
        assert!(!format!("{password:?}").contains("Secret123"));
    }
}
