//! Outbound SMS for OTP delivery.
//!
//! Twilio is the production transport. When credentials are absent the
//! service degrades to a logging transport so registration keeps working
//! in local environments; the code itself is never written to the log.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TwilioConfig;
use crate::error::AppError;

#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Deliver a one-time code to `{country_code}{phone_number}`.
    async fn send_otp(
        &self,
        country_code: &str,
        phone_number: &str,
        code: &str,
    ) -> Result<(), AppError>;
}

pub struct TwilioSms {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: Option<String>,
    message: Option<String>,
}

impl TwilioSms {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        tracing::info!(from = %from_number, "Twilio SMS transport initialized");
        Self {
            client: reqwest::Client::new(),
            account_sid,
            auth_token,
            from_number,
        }
    }

    /// Build from config when all three credentials are present.
    pub fn from_config(config: &TwilioConfig) -> Option<Self> {
        config
            .credentials()
            .map(|(sid, token, from)| Self::new(sid.to_string(), token.to_string(), from.to_string()))
    }
}

#[async_trait]
impl SmsProvider for TwilioSms {
    async fn send_otp(
        &self,
        country_code: &str,
        phone_number: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let to = format!("{country_code}{phone_number}");
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let body = format!("Your verification code is {code}. It expires in 5 minutes.");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", self.from_number.as_str()), ("Body", body.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Sms(anyhow::Error::new(e)))?;

        let status = response.status();
        if status.is_success() {
            let parsed: TwilioMessageResponse = response
                .json()
                .await
                .map_err(|e| AppError::Sms(anyhow::Error::new(e)))?;
            tracing::info!(
                sid = parsed.sid.as_deref().unwrap_or("unknown"),
                to = %to,
                "OTP SMS dispatched"
            );
            Ok(())
        } else {
            let parsed: Option<TwilioMessageResponse> = response.json().await.ok();
            let detail = parsed
                .and_then(|p| p.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            tracing::error!(to = %to, error = %detail, "Twilio rejected OTP SMS");
            Err(AppError::Sms(anyhow::anyhow!("Twilio send failed: {detail}")))
        }
    }
}

/// Development fallback: logs the destination and nothing else.
pub struct LoggingSms;

#[async_trait]
impl SmsProvider for LoggingSms {
    async fn send_otp(
        &self,
        country_code: &str,
        phone_number: &str,
        _code: &str,
    ) -> Result<(), AppError> {
        tracing::warn!(
            to = %format!("{country_code}{phone_number}"),
            "SMS transport not configured; OTP not delivered"
        );
        Ok(())
    }
}
