use thiserror::Error;

pub type IntegrationResult<T> = std::result::Result<T, IntegrationError>;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("{service} answered {status}: {body}")]
    UpstreamError {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} returned an invalid response: {details}")]
    InvalidResponse {
        service: &'static str,
        details: String,
        raw: Option<String>,
    },
    #[error("mail address error: {0}")]
    MailAddressError(#[from] lettre::address::AddressError),
    #[error("mail build error: {0}")]
    MailBuildError(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl IntegrationError {
    pub fn invalid_response<S: Into<String>>(service: &'static str, details: S) -> Self {
        Self::InvalidResponse {
            service,
            details: details.into(),
            raw: None,
        }
    }

    /// Raw upstream text worth surfacing to the caller, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::InvalidResponse { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }
}
