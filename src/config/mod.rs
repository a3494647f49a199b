//! Environment-driven configuration.
//!
//! Every value comes from the process environment (`.env` honored in dev).
//! In `dev` missing values fall back to local defaults; in `prod` they are
//! required and startup fails fast.

use crate::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub twilio: TwilioConfig,
    pub reset: ResetConfig,
    pub otp: OtpConfig,
    pub alerts: AlertConfig,
    /// Fixed administrative principal validated by claim match alone
    /// (no store lookup). Unset disables the tier.
    pub fixed_admin_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_expiry_days: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

/// Twilio credentials. When incomplete, OTP delivery falls back to a
/// logging transport instead of failing registration.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResetConfig {
    /// Full override for the redemption URL base.
    pub password_reset_url: Option<String>,
    /// Fallback base; the redemption path is appended to this.
    pub frontend_url: String,
    pub token_expiry_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub ttl_seconds: i64,
    /// Echo the plaintext OTP in registration responses. Development
    /// convenience only; `validate()` rejects it in prod.
    pub expose_in_response: bool,
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub recipients: Vec<String>,
    pub debounce_seconds: u64,
    pub db_ping_interval_seconds: u64,
}

impl TwilioConfig {
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.account_sid, &self.auth_token, &self.from_number) {
            (Some(sid), Some(token), Some(from)) => Some((sid, token, from)),
            _ => None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::Config(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let config = AppConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("society-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: parse_env("PORT", Some("3003"), is_prod)?,
            allowed_origins: get_env("CORS_ORIGINS", Some("http://localhost:3000"), is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("society"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some("dev-only-insecure-secret"), is_prod)?,
                token_expiry_days: parse_env("JWT_TOKEN_EXPIRY_DAYS", Some("7"), is_prod)?,
            },
            smtp: {
                let user = get_env("SMTP_USER", Some("dev@localhost"), is_prod)?;
                SmtpConfig {
                    host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                    port: parse_env("SMTP_PORT", Some("587"), is_prod)?,
                    password: get_env("SMTP_PASS", Some("dev"), is_prod)?,
                    from: env::var("SMTP_FROM").unwrap_or_else(|_| user.clone()),
                    user,
                }
            },
            twilio: TwilioConfig {
                account_sid: env::var("TWILIO_ACCOUNT_SID").ok(),
                auth_token: env::var("TWILIO_AUTH_TOKEN").ok(),
                from_number: env::var("TWILIO_FROM_NUMBER").ok(),
            },
            reset: ResetConfig {
                password_reset_url: env::var("PASSWORD_RESET_URL").ok(),
                frontend_url: get_env("FRONTEND_URL", Some("http://localhost:3000"), is_prod)?,
                token_expiry_seconds: parse_env("RESET_TOKEN_EXPIRY_SECONDS", Some("3600"), is_prod)?,
            },
            otp: OtpConfig {
                ttl_seconds: parse_env("OTP_TTL_SECONDS", Some("300"), is_prod)?,
                expose_in_response: get_env(
                    "EXPOSE_OTP_IN_RESPONSE",
                    Some(if is_prod { "false" } else { "true" }),
                    false,
                )?
                .parse()
                .unwrap_or(false),
            },
            alerts: AlertConfig {
                recipients: env::var("ALERT_EMAILS")
                    .or_else(|_| env::var("SUPER_ADMIN_ALERT_EMAIL"))
                    .unwrap_or_default()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                debounce_seconds: parse_env("DB_ALERT_DEBOUNCE_SECONDS", Some("900"), is_prod)?,
                db_ping_interval_seconds: parse_env("DB_PING_INTERVAL_SECONDS", Some("30"), is_prod)?,
            },
            fixed_admin_email: env::var("FIXED_ADMIN_EMAIL").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::Config(anyhow::anyhow!("PORT must be greater than 0")));
        }

        if self.jwt.token_expiry_days <= 0 {
            return Err(AppError::Config(anyhow::anyhow!(
                "JWT_TOKEN_EXPIRY_DAYS must be positive"
            )));
        }

        if self.otp.ttl_seconds <= 0 {
            return Err(AppError::Config(anyhow::anyhow!(
                "OTP_TTL_SECONDS must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.jwt.secret == "dev-only-insecure-secret" {
                return Err(AppError::Config(anyhow::anyhow!(
                    "JWT_SECRET must be set to a real secret in production"
                )));
            }

            if self.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::Config(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.otp.expose_in_response {
                return Err(AppError::Config(anyhow::anyhow!(
                    "EXPOSE_OTP_IN_RESPONSE must not be enabled in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::Config(anyhow::anyhow!(
                    "{key} is required in production but not set"
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::Config(anyhow::anyhow!("{key} is required but not set")))
            }
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::Config(anyhow::anyhow!("invalid {key}: {e}")))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_common_spellings() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("PRODUCTION".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn twilio_credentials_require_all_three_values() {
        let complete = TwilioConfig {
            account_sid: Some("AC123".into()),
            auth_token: Some("tok".into()),
            from_number: Some("+15550100".into()),
        };
        assert!(complete.credentials().is_some());

        let partial = TwilioConfig {
            account_sid: Some("AC123".into()),
            auth_token: None,
            from_number: Some("+15550100".into()),
        };
        assert!(partial.credentials().is_none());
    }
}
