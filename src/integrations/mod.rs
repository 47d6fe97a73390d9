//! Third-party services: payments, media CDN, mail and the AI course finder.

use std::sync::Arc;

use crate::config::Config;

mod error;
pub use error::{IntegrationError, IntegrationResult};

pub mod assistant;
pub mod mailer;
pub mod media;
pub mod payment;

pub use assistant::{CourseAssistant, CourseQuery, GeminiAssistant};
pub use mailer::{Email, LogMailer, Mailer, SmtpMailer};
pub use media::{CloudinaryStore, MediaKind, MediaStore, MediaUpload, StoredMedia};
pub use payment::{OrderRequest, PaymentGateway, PaymentOrder, RazorpayGateway};

/// Handles to every outbound service, shared by all handlers.
#[derive(Clone)]
pub struct Integrations {
    pub payments: Arc<dyn PaymentGateway>,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
    pub assistant: Arc<dyn CourseAssistant>,
}

impl std::fmt::Debug for Integrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrations").finish_non_exhaustive()
    }
}

impl Integrations {
    pub fn from_config(config: &Config) -> IntegrationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let payment = config.payment();
        let media = config.media();
        let mail = config.mail();
        let assistant = config.assistant();

        let notification_url = format!(
            "{}/api/v1/resources/notification",
            config.app().base_url().trim_end_matches('/')
        );

        let mailer: Arc<dyn Mailer> = if mail.smtp_host().is_empty() {
            tracing::warn!("no smtp host configured, outgoing mail will only be logged");
            Arc::new(LogMailer)
        } else {
            Arc::new(SmtpMailer::new(
                mail.smtp_host(),
                mail.smtp_port(),
                mail.username(),
                mail.password(),
                mail.from(),
            )?)
        };

        Ok(Self {
            payments: Arc::new(RazorpayGateway::new(
                client.clone(),
                payment.key_id(),
                payment.key_secret(),
            )),
            media: Arc::new(CloudinaryStore::new(
                client.clone(),
                media.cloud_name(),
                media.api_key(),
                media.api_secret(),
                notification_url,
            )),
            mailer,
            assistant: Arc::new(GeminiAssistant::new(
                client,
                assistant.api_key(),
                assistant.model(),
            )),
        })
    }
}
