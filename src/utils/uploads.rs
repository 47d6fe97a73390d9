//! Reading `multipart/form-data` bodies into memory.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{
    integrations::{MediaKind, MediaUpload},
    model::ResourceType,
    web::{WebError, WebResult},
};

pub static FILE_FIELD: &str = "file";

#[derive(Debug, Default)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn into_upload(self, kind: MediaKind) -> MediaUpload {
        MediaUpload {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
            kind,
        }
    }
}

/// The `file` part plus every text field of a form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart, resource: ResourceType) -> WebResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| WebError::resource_bad_request(resource.clone(), e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::resource_bad_request(resource.clone(), e.body_text()))?;

                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| WebError::resource_bad_request(resource.clone(), e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Takes the uploaded file, failing when none or an empty one was sent.
    pub fn take_file(&mut self, resource: ResourceType) -> WebResult<UploadedFile> {
        self.file
            .take()
            .filter(|f| !f.bytes.is_empty())
            .ok_or(WebError::resource_bad_request(resource, "a non-empty `file` part is required"))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
