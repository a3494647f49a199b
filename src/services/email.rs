//! Outbound email (the notification gateway's email half).
//!
//! The identity core depends only on the `EmailProvider` contract; SMTP
//! delivery mechanics live behind it.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::error::AppError;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a password-reset link. The URL already embeds the plaintext
    /// token; no credential material is logged here.
    async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), AppError>;

    /// Deliver an operator alert to the given recipients.
    async fn send_system_alert(
        &self,
        recipients: &[String],
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::Config(anyhow::anyhow!("SMTP relay setup failed: {e}")))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from: config.from.clone(),
        })
    }

    async fn send(
        &self,
        to: Vec<String>,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), AppError> {
        let mut builder = Message::builder()
            .from(self.from.parse().map_err(|e: lettre::address::AddressError| {
                AppError::Email(anyhow::Error::new(e))
            })?)
            .subject(subject);

        for recipient in &to {
            builder = builder.to(recipient.parse().map_err(|e: lettre::address::AddressError| {
                AppError::Email(anyhow::Error::new(e))
            })?);
        }

        let email = builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::Email(anyhow::Error::new(e)))?;

        // SMTP transport is blocking; keep it off the async runtime.
        let mailer = self.mailer.clone();
        let subject = subject.to_string();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        match result {
            Ok(_) => {
                tracing::info!(subject = %subject, recipients = to.len(), "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, subject = %subject, "Failed to send email");
                Err(AppError::Email(anyhow::Error::new(e)))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for SmtpMailer {
    async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), AppError> {
        let plain_body = format!(
            "You requested a password reset. Click the link below to set a new password:\n\n\
             {reset_url}\n\n\
             This link will expire in 1 hour. If you did not request this, please ignore this email."
        );
        let html_body = format!(
            r#"<p>You requested a password reset for your account.</p>
<p>Click the button below to set a new password. This link will expire in 1 hour.</p>
<p><a href="{reset_url}" style="display:inline-block;padding:12px 20px;background:#16a34a;color:#fff;text-decoration:none;border-radius:6px;">Reset Password</a></p>
<p>If you did not request this, please ignore this email.</p>"#
        );

        self.send(
            vec![to_email.to_string()],
            "Reset your password",
            plain_body,
            html_body,
        )
        .await
    }

    async fn send_system_alert(
        &self,
        recipients: &[String],
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if recipients.is_empty() {
            return Err(AppError::Config(anyhow::anyhow!(
                "No alert recipients configured. Set ALERT_EMAILS or SUPER_ADMIN_ALERT_EMAIL."
            )));
        }

        self.send(
            recipients.to_vec(),
            subject,
            text_body.to_string(),
            html_body.to_string(),
        )
        .await
    }
}

/// Test double recording every send instead of talking SMTP.
#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: std::sync::Arc<std::sync::Mutex<Vec<MockEmail>>>,
}

#[derive(Debug, Clone)]
pub struct MockEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
impl EmailProvider for MockMailer {
    async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(MockEmail {
            to: vec![to_email.to_string()],
            subject: "Reset your password".to_string(),
            body: reset_url.to_string(),
        });
        Ok(())
    }

    async fn send_system_alert(
        &self,
        recipients: &[String],
        subject: &str,
        text_body: &str,
        _html_body: &str,
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(MockEmail {
            to: recipients.to_vec(),
            subject: subject.to_string(),
            body: text_body.to_string(),
        });
        Ok(())
    }
}
