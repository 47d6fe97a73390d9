use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct OrderBody {
    pub program_id: Uuid,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub order_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
    pub enrolled: bool,
}

impl WebhookAck {
    pub fn acknowledged() -> Self {
        Self {
            received: true,
            duplicate: false,
            enrolled: false,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            duplicate: true,
            ..Self::acknowledged()
        }
    }

    pub fn enrolled() -> Self {
        Self {
            enrolled: true,
            ..Self::acknowledged()
        }
    }
}
