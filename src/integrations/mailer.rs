use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::integrations::IntegrationResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> IntegrationResult<()>;
}

pub fn reset_link(base_url: &str, raw_token: &str) -> String {
    format!(
        "{}/reset-password?token={raw_token}",
        base_url.trim_end_matches('/')
    )
}

pub fn password_reset_email(to: &str, first_name: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        html: format!(
            r#"<h2>Hi {first_name},</h2>
<p>You requested to reset your password. Click the link below to set a new password. This link is valid for 1 hour.</p>
<p><a href="{link}">Reset Password</a></p>
<p>If you did not request this, please ignore this email.</p>"#
        ),
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        from: &str,
    ) -> IntegrationResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport,
            from: from.parse()?,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: Email) -> IntegrationResult<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;

        self.transport.send(message).await?;
        tracing::info!("mail delivered");
        Ok(())
    }
}

/// Stand-in used when no SMTP relay is configured: the mail is logged.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> IntegrationResult<()> {
        tracing::warn!(
            "smtp not configured, mail to {} not sent: {}\n{}",
            email.to,
            email.subject,
            email.html
        );
        Ok(())
    }
}
