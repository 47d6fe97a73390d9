use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    payment: Payment,
    #[serde(default)]
    media: Media,
    #[serde(default)]
    mail: Mail,
    #[serde(default)]
    assistant: Assistant,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_base_url")]
    base_url: String,
}

/// Razorpay credentials.
#[derive(Debug, Deserialize)]
pub struct Payment {
    #[serde(default)]
    key_id: String,
    #[serde(default)]
    key_secret: String,
    #[serde(default)]
    webhook_secret: String,
    #[serde(default = "default_currency")]
    currency: String,
}

/// Cloudinary credentials.
#[derive(Debug, Deserialize)]
pub struct Media {
    #[serde(default)]
    cloud_name: String,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    api_secret: String,
    /// Request body cap for multipart uploads.
    #[serde(default = "default_max_upload_bytes")]
    max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct Mail {
    #[serde(default)]
    smtp_host: String,
    #[serde(default = "default_smtp_port")]
    smtp_port: u16,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_mail_from")]
    from: String,
}

#[derive(Debug, Deserialize)]
pub struct Assistant {
    #[serde(default)]
    api_key: String,
    #[serde(default = "default_assistant_model")]
    model: String,
}

fn default_base_url() -> String {
    String::from("http://localhost:3000")
}

fn default_currency() -> String {
    String::from("INR")
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    String::from("Edu-Portal <no-reply@eduportal.com>")
}

fn default_assistant_model() -> String {
    String::from("gemini-2.5-flash")
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

// A missing section must end up with the same values as an empty one.
impl Default for Payment {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            webhook_secret: String::new(),
            currency: default_currency(),
        }
    }
}

impl Default for Media {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_mail_from(),
        }
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_assistant_model(),
        }
    }
}

/// Replaces `target` with the value of `var` when the variable is set and non-empty.
fn override_from_env(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            tracing::trace!("config value overridden by ${var}");
            *target = value;
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let config = Self::from_slice(&bytes)?;
                    Ok(config)
                };

                let mut config = match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                };

                let _ = dotenvy::dotenv();
                config.apply_env_overrides();
                config
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    /// Credentials may come from the environment instead of the config file.
    pub fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.app.database_uri, "DATABASE_URL");
        override_from_env(&mut self.app.jwt, "JWT_SECRET");
        override_from_env(&mut self.app.base_url, "BASE_URL");
        override_from_env(&mut self.payment.key_id, "RAZORPAY_KEY_ID");
        override_from_env(&mut self.payment.key_secret, "RAZORPAY_KEY_SECRET");
        override_from_env(&mut self.payment.webhook_secret, "RAZORPAY_WEBHOOK_SECRET");
        override_from_env(&mut self.media.cloud_name, "CLOUDINARY_CLOUD_NAME");
        override_from_env(&mut self.media.api_key, "CLOUDINARY_API_KEY");
        override_from_env(&mut self.media.api_secret, "CLOUDINARY_API_SECRET");
        override_from_env(&mut self.mail.username, "SMTP_USER");
        override_from_env(&mut self.mail.password, "SMTP_PASS");
        override_from_env(&mut self.assistant.api_key, "GEMINI_API_KEY");
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    #[inline]
    pub fn media(&self) -> &Media {
        &self.media
    }

    #[inline]
    pub fn mail(&self) -> &Mail {
        &self.mail
    }

    #[inline]
    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Payment {
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn key_secret(&self) -> &str {
        &self.key_secret
    }

    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl Media {
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

impl Mail {
    pub fn smtp_host(&self) -> &str {
        &self.smtp_host
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp_port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn from(&self) -> &str {
        &self.from
    }
}

impl Assistant {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/eduportal"
        "#;

        let config = Config::from_slice(raw).unwrap();
        assert_eq!(config.payment().currency(), "INR");
        assert_eq!(config.mail().smtp_port(), 587);
        assert_eq!(config.assistant().model(), "gemini-2.5-flash");
        assert_eq!(config.app().base_url(), "http://localhost:3000");
        assert!(!config.app().docs());
        assert!(config.payment().webhook_secret().is_empty());
        assert_eq!(config.mail().from(), "Edu-Portal <no-reply@eduportal.com>");
        assert_eq!(config.media().max_upload_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn empty_sections_match_missing_ones() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/eduportal"

            [payment]
            [mail]
            [assistant]
            [media]
            max_upload_bytes = 1024
        "#;

        let config = Config::from_slice(raw).unwrap();
        assert_eq!(config.payment().currency(), Payment::default().currency());
        assert_eq!(config.mail().smtp_port(), Mail::default().smtp_port());
        assert_eq!(config.assistant().model(), Assistant::default().model());
        assert_eq!(config.media().max_upload_bytes(), 1024);
    }

    #[test]
    fn missing_app_section_is_rejected() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"
        "#;

        assert!(matches!(
            Config::from_slice(raw),
            Err(ConfigError::TomlDeError(_))
        ));
    }
}
