//! Cloudinary signed uploads.

use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::integrations::{IntegrationError, IntegrationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Raw,
}

impl MediaKind {
    /// Cloudinary resource type used in the upload URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Raw => "raw",
        }
    }

    pub fn folder(&self) -> String {
        format!("{}-uploads", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredMedia {
    pub secure_url: String,
    pub public_id: String,
}

#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> IntegrationResult<StoredMedia>;
}

#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    notification_url: String,
}

impl CloudinaryStore {
    pub fn new(
        client: reqwest::Client,
        cloud_name: &str,
        api_key: &str,
        api_secret: &str,
        notification_url: String,
    ) -> Self {
        Self {
            client,
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            notification_url,
        }
    }

    fn upload_url(&self, kind: MediaKind) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            self.cloud_name,
            kind.as_str()
        )
    }

    /// Parameters that are part of the signature. Images are optimized on
    /// upload; videos are transcoded asynchronously and report back to us.
    fn signed_params(&self, kind: MediaKind, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::from([
            ("folder", kind.folder()),
            ("timestamp", timestamp.to_string()),
        ]);

        match kind {
            MediaKind::Image => {
                params.insert("transformation", "q_auto,f_auto".into());
            }
            MediaKind::Video => {
                params.insert("eager", "q_auto,f_mp4".into());
                params.insert("eager_async", "true".into());
                params.insert("eager_notification_url", self.notification_url.clone());
            }
            MediaKind::Raw => {}
        }

        params
    }
}

/// Cloudinary request signature: sorted `key=value` pairs joined by `&`, the
/// api secret appended, hashed with SHA-256.
pub fn sign_params(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait::async_trait]
impl MediaStore for CloudinaryStore {
    #[tracing::instrument(skip(self, upload), fields(file = %upload.file_name, kind = upload.kind.as_str()))]
    async fn upload(&self, upload: MediaUpload) -> IntegrationResult<StoredMedia> {
        if self.cloud_name.is_empty() || self.api_secret.is_empty() {
            return Err(IntegrationError::NotConfigured("cloudinary"));
        }

        let params = self.signed_params(upload.kind, chrono::Utc::now().timestamp());
        let signature = sign_params(&params, &self.api_secret);

        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(mime) = upload.content_type.as_deref() {
            part = part.mime_str(mime)?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let resp = self
            .client
            .post(self.upload_url(upload.kind))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::UpstreamError {
                service: "cloudinary",
                status,
                body,
            });
        }

        let stored: StoredMedia = resp.json().await?;
        tracing::info!("stored media as {}", stored.public_id);
        Ok(stored)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store() -> CloudinaryStore {
        CloudinaryStore::new(
            reqwest::Client::new(),
            "demo",
            "key",
            "secret",
            "https://api.example.com/api/v1/resources/notification".into(),
        )
    }

    #[test]
    fn folders_follow_kind() {
        assert_eq!(MediaKind::Image.folder(), "image-uploads");
        assert_eq!(MediaKind::Video.folder(), "video-uploads");
        assert_eq!(MediaKind::Raw.folder(), "raw-uploads");
    }

    #[test]
    fn upload_url_contains_cloud_and_kind() {
        assert_eq!(
            store().upload_url(MediaKind::Video),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }

    #[test]
    fn video_uploads_request_async_transcoding() {
        let params = store().signed_params(MediaKind::Video, 1);
        assert_eq!(params.get("eager_async").map(String::as_str), Some("true"));
        assert!(params.contains_key("eager_notification_url"));
        assert!(!params.contains_key("transformation"));
    }

    #[test]
    fn signature_is_sorted_and_salted() {
        let params = BTreeMap::from([
            ("timestamp", "1315060510".to_string()),
            ("folder", "raw-uploads".to_string()),
        ]);

        let mut hasher = Sha256::new();
        hasher.update(b"folder=raw-uploads&timestamp=1315060510secret");
        let expected = hex::encode(hasher.finalize());

        assert_eq!(sign_params(&params, "secret"), expected);
        assert_ne!(sign_params(&params, "other"), expected);
    }
}
