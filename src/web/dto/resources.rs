use serde::{Deserialize, Serialize};

/// Resource fields admins may edit after upload; the type stays fixed.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResourceUpdateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// Multipart form accepted when creating a resource.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct ResourceUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// `document`, `video` or `image`
    pub resource_type: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct NotificationAck {
    pub received: bool,
}
