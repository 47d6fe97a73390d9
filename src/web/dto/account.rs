use serde::{Deserialize, Serialize};

use crate::{
    domain::LearnerSnapshot,
    model::entity::UserEntity,
    web::{WebError, WebResult},
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Fails on the first blank field, naming it.
fn require_filled(fields: &[(&'static str, &String)]) -> WebResult<()> {
    match fields.iter().find(|(_, v)| v.trim().is_empty()) {
        Some((field, _)) => Err(WebError::registration_invalid_field(*field)),
        None => Ok(()),
    }
}

impl SignupBody {
    /// Every field is required and must not be blank.
    pub fn validate(&self) -> WebResult<()> {
        require_filled(&[
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("password", &self.password),
        ])
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AccountUpdateBody {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl AccountUpdateBody {
    pub fn validate(&self) -> WebResult<()> {
        require_filled(&[
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
        ])
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordBody {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordBody {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

impl ResetPasswordBody {
    /// Token and password, both non-blank.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let token = self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let password = self.new_password.as_deref().filter(|p| !p.trim().is_empty())?;
        Some((token, password))
    }
}

/// The signed-in user together with their enrollment and completion maps.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub user: UserEntity,
    #[serde(flatten)]
    pub snapshot: LearnerSnapshot,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
