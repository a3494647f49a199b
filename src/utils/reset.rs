//! Password-reset token generation and redemption-URL construction.

use crate::config::ResetConfig;
use rand::RngCore;

const RESET_TOKEN_BYTES: usize = 32;
const FALLBACK_PATH: &str = "/reset-password";

/// Generate a high-entropy reset token (hex-encoded random bytes). The
/// plaintext goes into the redemption URL; only its digest is stored.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build the redemption URL delivered out of band. `PASSWORD_RESET_URL`
/// overrides the base entirely; otherwise the frontend URL plus the default
/// path is used. Token and email ride as query parameters.
pub fn build_reset_url(config: &ResetConfig, token: &str, email: &str) -> String {
    let base = config
        .password_reset_url
        .clone()
        .unwrap_or_else(|| format!("{}{}", config.frontend_url.trim_end_matches('/'), FALLBACK_PATH));

    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{separator}token={}&email={}",
        urlencoding::encode(token),
        urlencoding::encode(email)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(override_url: Option<&str>) -> ResetConfig {
        ResetConfig {
            password_reset_url: override_url.map(str::to_string),
            frontend_url: "http://localhost:3000".to_string(),
            token_expiry_seconds: 3600,
        }
    }

    #[test]
    fn tokens_are_long_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert_ne!(a, b);
    }

    #[test]
    fn url_falls_back_to_frontend_path() {
        let url = build_reset_url(&config(None), "tok123", "admin@example.com");
        assert_eq!(
            url,
            "http://localhost:3000/reset-password?token=tok123&email=admin%40example.com"
        );
    }

    #[test]
    fn env_override_wins_and_existing_query_is_extended() {
        let url = build_reset_url(
            &config(Some("https://app.example.com/reset?src=email")),
            "tok123",
            "admin@example.com",
        );
        assert!(url.starts_with("https://app.example.com/reset?src=email&token=tok123&email="));
    }
}
