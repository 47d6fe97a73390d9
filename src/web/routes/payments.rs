use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
};

use crate::{
    integrations::{
        OrderRequest,
        payment::{
            self, EVENT_ID_HEADER, SIGNATURE_HEADER, WebhookEnvelope, WebhookEventName,
        },
    },
    model::{
        CrudRepository, DatabaseError, ResourceType,
        entity::{Enrollment, Program, WebhookEvent},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::payments::{OrderBody, OrderResponse, WebhookAck},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/orders", post(order_create_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    // The gateway calls the webhook without a session.
    Router::new()
        .route("/webhook", post(webhook_handler))
        .merge(protected)
        .with_state(state)
}

fn payment_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(ResourceType::Payment, e)
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/orders",
    request_body = OrderBody,
    description = "Opens a gateway order for the program price; enrollment happens once the payment is captured",
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Program is not for sale", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Gateway or internal error", body = ErrorResponse),
    ),
    tag = "payments",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
async fn order_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<OrderBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let program = Program::find_by_id(state.pool(), user, payload.program_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Program, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Program))?;

    if !program.is_active() || program.price() <= 0.0 {
        return Err(WebError::resource_bad_request(
            ResourceType::Payment,
            "program is not available for purchase",
        ));
    }

    let config = state.config().payment();
    let request = OrderRequest::new(
        program.price(),
        config.currency(),
        user.user_id(),
        program.id(),
    );
    let order = state
        .integrations()
        .payments
        .create_order(request)
        .await
        .map_err(WebError::server_integration_error)?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: config.key_id().to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body(content = String, description = "Raw gateway event, signed in the x-razorpay-signature header"),
    description = "Gateway callback. A captured payment enrolls the learner named in the order notes. Each event is applied once.",
    responses(
        (status = 200, description = "Event accepted, repeated deliveries are acknowledged without effect", body = WebhookAck),
        (status = 400, description = "Signature missing or invalid, or unusable payload", body = ErrorResponse),
        (status = 409, description = "Learner already enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "payments",
)]
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<impl IntoResponse> {
    let secret = state.config().payment().webhook_secret();
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebError::payment_signature_invalid())?;

    if !payment::verify_signature(secret, &body, signature) {
        tracing::warn!("rejected webhook delivery with a bad signature");
        return Err(WebError::payment_signature_invalid());
    }

    let name: WebhookEventName = serde_json::from_slice(&body)
        .map_err(|e| WebError::payment_payload_invalid(e.to_string()))?;
    if !name.is_captured() {
        tracing::debug!("ignoring webhook event {}", name.event);
        return Ok((StatusCode::OK, Json(WebhookAck::acknowledged())));
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)
        .map_err(|e| WebError::payment_payload_invalid(e.to_string()))?;

    let header_id = headers.get(EVENT_ID_HEADER).and_then(|v| v.to_str().ok());
    let event_id = envelope.event_key(header_id, &body);

    let mut tx = state
        .pool()
        .executor()
        .begin()
        .await
        .map_err(|e| payment_error(e.into()))?;

    let fresh = WebhookEvent::record(&mut *tx, &event_id, &envelope.event)
        .await
        .map_err(payment_error)?;
    if !fresh {
        tx.commit().await.map_err(|e| payment_error(e.into()))?;
        tracing::info!("webhook event {event_id} already processed");
        return Ok((StatusCode::OK, Json(WebhookAck::duplicate())));
    }

    let (learner_id, program_id) = envelope
        .payment()
        .and_then(|p| p.notes)
        .and_then(|n| n.learner_id.zip(n.program_id))
        .ok_or(WebError::payment_payload_invalid(
            "captured payment carries no learner or program",
        ))?;

    // Dropping the transaction on error also forgets the event id, so the
    // gateway's retry gets another chance.
    Enrollment::create(&mut *tx, learner_id, program_id)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::resource_conflict(
                    ResourceType::Enrollment,
                    "learner is already enrolled in this program",
                )
            } else {
                WebError::resource_fetch_error(ResourceType::Enrollment, e)
            }
        })?;
    tx.commit().await.map_err(|e| payment_error(e.into()))?;

    tracing::info!("payment captured, learner {learner_id} enrolled in {program_id}");
    Ok((StatusCode::OK, Json(WebhookAck::enrolled())))
}
