//! Outbound email for signup confirmation codes.

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UserError};

/// SMTP configuration for the confirmation mailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025, // MailHog default port for development
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@marginalia.local".to_string(),
            from_name: "Marginalia".to_string(),
        }
    }
}

/// Sends confirmation codes. Callers decide whether a failure matters;
/// the signup path logs and swallows it.
pub struct Mailer {
    config: MailerConfig,
}

impl Mailer {
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    pub async fn send_confirmation_code(
        &self,
        to_email: &str,
        username: &str,
        code: &str,
    ) -> Result<()> {
        let body = format!(
            "Hello {username},\n\n\
             Your Marginalia confirmation code is:\n\n    {code}\n\n\
             Exchange it for an access token at /api/v1/auth/token.\n\
             If you didn't sign up, you can safely ignore this email.\n"
        );

        let email = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| UserError::Configuration(format!("Invalid from email: {e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| UserError::Configuration(format!("Invalid to email: {e}")))?)
            .subject("Your Marginalia confirmation code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| UserError::Configuration(format!("Failed to build email: {e}")))?;

        let mailer = if self.config.smtp_username.is_empty() {
            // No authentication (for development with MailHog)
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| UserError::Configuration(format!("Invalid SMTP host: {e}")))?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        mailer
            .send(email)
            .await
            .map_err(|e| UserError::Mail(format!("Failed to send email: {e}")))?;

        debug!("Confirmation code email sent to: {}", to_email);
        Ok(())
    }
}
