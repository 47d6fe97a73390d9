//! Razorpay orders and webhook signatures.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::integrations::{IntegrationError, IntegrationResult};

type HmacSha256 = Hmac<Sha256>;

pub static SIGNATURE_HEADER: &str = "x-razorpay-signature";
pub static EVENT_ID_HEADER: &str = "x-razorpay-event-id";
pub static PAYMENT_CAPTURED: &str = "payment.captured";

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotes {
    #[serde(alias = "learnerId")]
    pub learner_id: Option<Uuid>,
    #[serde(alias = "programId")]
    pub program_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

impl OrderRequest {
    pub fn new(price: f64, currency: &str, learner_id: Uuid, program_id: Uuid) -> Self {
        Self {
            amount: amount_in_minor_units(price),
            currency: currency.to_string(),
            receipt: format!("r_{}", Uuid::new_v4().simple()),
            notes: OrderNotes {
                learner_id: Some(learner_id),
                program_id: Some(program_id),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, order: OrderRequest) -> IntegrationResult<PaymentOrder>;
}

#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(client: reqwest::Client, key_id: &str, key_secret: &str) -> Self {
        Self {
            client,
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for RazorpayGateway {
    #[tracing::instrument(skip(self), fields(receipt = %order.receipt))]
    async fn create_order(&self, order: OrderRequest) -> IntegrationResult<PaymentOrder> {
        if self.key_id.is_empty() || self.key_secret.is_empty() {
            return Err(IntegrationError::NotConfigured("razorpay"));
        }

        let resp = self
            .client
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&order)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::UpstreamError {
                service: "razorpay",
                status,
                body,
            });
        }

        let created: PaymentOrder = resp.json().await?;
        tracing::info!("razorpay order {} created", created.id);
        Ok(created)
    }
}

pub fn amount_in_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `signature` (hex) against the HMAC of the exact raw body. Constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Only the event name, read before anything else in the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventName {
    pub event: String,
}

impl WebhookEventName {
    pub fn is_captured(&self) -> bool {
        self.event == PAYMENT_CAPTURED
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<PaymentWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWrapper {
    pub entity: PaymentEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "notes_or_empty")]
    pub notes: Option<OrderNotes>,
}

/// Razorpay encodes empty notes as `[]`.
fn notes_or_empty<'de, D>(deserializer: D) -> Result<Option<OrderNotes>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl WebhookEnvelope {
    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }

    /// Event id for duplicate detection: the delivery header when present,
    /// else the event name plus the payment id, else a digest of the body.
    pub fn event_key(&self, header: Option<&str>, body: &[u8]) -> String {
        if let Some(id) = header.filter(|h| !h.is_empty()) {
            return id.to_string();
        }
        match self.payment() {
            Some(p) => format!("{}:{}", self.event, p.id),
            None => hex::encode(Sha256::digest(body)),
        }
    }
}
