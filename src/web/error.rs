use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    error::log_error,
    integrations::IntegrationError,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,

    #[error("RegistrationInvalidField: {field}")]
    RegistrationInvalidField { field: &'static str },
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationAdminRequired")]
    AuthenticationAdminRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,

    #[error("AuthenticationResetTokenInvalid")]
    AuthenticationResetTokenInvalid,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceBadRequest: {resource_type:?}. {details}")]
    ResourceBadRequest {
        resource_type: ResourceType,
        details: String,
    },

    #[error("ResourceConflict: {resource_type:?}. {details}")]
    ResourceConflict {
        resource_type: ResourceType,
        details: String,
    },
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("PaymentSignatureInvalid")]
    PaymentSignatureInvalid,

    #[error("PaymentPayloadInvalid: {0}")]
    PaymentPayloadInvalid(String),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),

    #[error("ServerIntegrationError: {0}")]
    ServerIntegrationError(#[from] IntegrationError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ServerCryptError(_) => String::from("Internal server error."),
            Self::ServerIntegrationError(_) => {
                String::from("Internal server error, external service failed.")
            }
        }
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
            Self::RegistrationInvalidField { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
            Self::RegistrationInvalidField { field } => {
                format!("Registration error, field `{field}` is required.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationAdminRequired => StatusCode::FORBIDDEN,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::BAD_REQUEST,
            Self::AuthenticationResetTokenInvalid => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationAdminRequired => {
                String::from("Authentication error, admin role required.")
            }
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
            Self::AuthenticationResetTokenInvalid => {
                String::from("Authentication error, reset token is invalid or expired.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceFetchError { error, .. } => match error {
                DatabaseError::Forbidden => StatusCode::FORBIDDEN,
                e if e.is_unique_violation() => StatusCode::CONFLICT,
                e if e.is_foreign_key_violation() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::ResourceBadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceFetchError { error, .. } => match error {
                DatabaseError::Forbidden => String::from("Resource error, resource forbidden."),
                e if e.is_unique_violation() => {
                    String::from("Resource error, resource already exists.")
                }
                e if e.is_foreign_key_violation() => {
                    String::from("Resource error, referenced resource does not exist.")
                }
                _ => String::from("Resource error, unable to fetch resource."),
            },
            Self::ResourceBadRequest { details, .. } => {
                format!("Resource error, bad request: {details}")
            }
            Self::ResourceConflict { details, .. } => format!("Resource error, conflict: {details}"),
        }
    }
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::PaymentSignatureInvalid => String::from("Payment error, invalid signature."),
            Self::PaymentPayloadInvalid(_) => String::from("Payment error, invalid payload."),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("PaymentError - {0}")]
    PaymentError(#[from] PaymentError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_bad_request<S: Into<String>>(r#type: ResourceType, details: S) -> Self {
        Self::ResourceError(ResourceError::ResourceBadRequest {
            resource_type: r#type,
            details: details.into(),
        })
    }

    pub fn resource_conflict<S: Into<String>>(r#type: ResourceType, details: S) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
            details: details.into(),
        })
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn admin_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationAdminRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn reset_token_invalid() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationResetTokenInvalid)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn registration_invalid_field(field: &'static str) -> Self {
        Self::RegistrationError(RegistrationError::RegistrationInvalidField { field })
    }

    pub fn payment_signature_invalid() -> Self {
        Self::PaymentError(PaymentError::PaymentSignatureInvalid)
    }

    pub fn payment_payload_invalid<S: Into<String>>(details: S) -> Self {
        Self::PaymentError(PaymentError::PaymentPayloadInvalid(details.into()))
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn server_integration_error(e: IntegrationError) -> Self {
        Self::ServerError(ServerError::ServerIntegrationError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::PaymentError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::PaymentError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }

    /// Details shown to clients in every build, e.g. raw model output the
    /// assistant could not parse.
    fn public_details(&self) -> Option<String> {
        match self {
            Self::ServerError(ServerError::ServerIntegrationError(e)) => {
                e.raw().map(str::to_string)
            }
            _ => None,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: self.public_details().or_else(|| {
                if cfg!(debug_assertions) {
                    Some(self.to_string())
                } else {
                    None
                }
            }),
        };

        (status_code, Json(body)).into_response()
    }
}
