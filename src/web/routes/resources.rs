use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceType, ResourceTyped,
        entity::{Resource, ResourceCreate, ResourceKind},
    },
    utils::uploads::UploadForm,
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::resources::{NotificationAck, ResourceUpdateBody, ResourceUploadForm},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/", get(resource_list_handler).post(resource_create_handler))
        .route("/{id}", get(resource_get_handler).put(resource_update_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/notification", post(resource_notification_handler))
        .merge(protected)
        .with_state(state)
}

fn resource_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Resource::get_resource_type(), e)
}

async fn find_resource(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Resource> {
    Resource::find_by_id(state.pool(), actor, id)
        .await
        .map_err(resource_error)?
        .ok_or(WebError::resource_not_found(Resource::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/v1/resources",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page of resources", body = crate::model::Page<Resource>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "resources",
    security(
        ("cookie" = [])
    )
)]
async fn resource_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let (limit, offset) = page.paging();
    let resources = Resource::page(state.pool(), user, limit, offset)
        .await
        .map_err(resource_error)?;

    Ok((StatusCode::OK, Json(resources)))
}

#[utoipa::path(
    get,
    path = "/api/v1/resources/{id}",
    responses(
        (status = 200, description = "Resource found", body = Resource),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "resources",
    security(
        ("cookie" = [])
    )
)]
async fn resource_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_resource(&state, user, id).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/resources",
    request_body(content = ResourceUploadForm, content_type = "multipart/form-data"),
    description = "Uploads a file to the media CDN and stores it as a resource",
    responses(
        (status = 201, description = "Resource created", body = Resource),
        (status = 400, description = "Missing file, title or resource type", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "resources",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip_all)]
async fn resource_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let mut form = UploadForm::read(multipart, ResourceType::Resource).await?;
    let bad = |details: &str| WebError::resource_bad_request(ResourceType::Resource, details);

    let kind: ResourceKind = form
        .field("resource_type")
        .ok_or_else(|| bad("resource_type is required"))?
        .parse()
        .map_err(|e: String| bad(&e))?;
    let title = form
        .field("title")
        .ok_or_else(|| bad("title is required"))?
        .to_string();
    let description = form.field("description").unwrap_or_default().to_string();
    let file = form.take_file(ResourceType::Resource)?;

    let stored = state
        .integrations()
        .media
        .upload(file.into_upload(kind.media_kind()))
        .await
        .map_err(WebError::server_integration_error)?;
    tracing::info!("uploaded {} as {}", stored.public_id, kind.as_str());

    let created = Resource::create(
        state.pool(),
        user,
        ResourceCreate {
            title,
            description,
            url: stored.secure_url,
            resource_type: kind,
        },
    )
    .await
    .map_err(resource_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/resources/{id}",
    request_body = ResourceUpdateBody,
    responses(
        (status = 200, description = "Resource updated", body = Resource),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "resources",
    security(
        ("cookie" = [])
    )
)]
async fn resource_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResourceUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let found = find_resource(&state, user, id).await?;

    let Some(resource_type) = found.kind() else {
        return Err(WebError::resource_bad_request(
            ResourceType::Resource,
            "stored resource has an unknown type",
        ));
    };

    let data = ResourceCreate {
        title: payload.title.unwrap_or_else(|| found.title().to_string()),
        description: payload
            .description
            .unwrap_or_else(|| found.description().to_string()),
        url: payload.url.unwrap_or_else(|| found.url().to_string()),
        resource_type,
    };

    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(resource_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/resources/notification",
    description = "Receives eager transformation notifications from the media CDN",
    request_body = Object,
    responses(
        (status = 200, description = "Notification received", body = NotificationAck),
    ),
    tag = "resources",
)]
async fn resource_notification_handler(Json(payload): Json<Value>) -> impl IntoResponse {
    let public_id = payload
        .get("public_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let notification_type = payload
        .get("notification_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    tracing::info!("media notification `{notification_type}` for {public_id}");

    (StatusCode::OK, Json(NotificationAck { received: true }))
}
