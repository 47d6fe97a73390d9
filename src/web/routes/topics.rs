use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    domain::ProgressKind,
    model::{
        CrudRepository, DatabaseError, ResourceType, ResourceTyped,
        entity::{MeasureProgress, Resource, Topic, TopicCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::modules::{AttachBody, TopicWithResources},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(topic_create_handler))
        .route(
            "/{id}",
            get(topic_get_handler)
                .put(topic_update_handler)
                .delete(topic_delete_handler),
        )
        .route("/{id}/resources", post(topic_attach_resource_handler))
        .route(
            "/{id}/resources/{resource_id}",
            delete(topic_detach_resource_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn topic_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Topic::get_resource_type(), e)
}

async fn find_topic(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Topic> {
    Topic::find_by_id(state.pool(), actor, id)
        .await
        .map_err(topic_error)?
        .ok_or(WebError::resource_not_found(Topic::get_resource_type()))
}

fn validate(payload: &TopicCreate) -> WebResult<()> {
    if payload.title.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            ResourceType::Topic,
            "title is required",
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/topics/{id}",
    description = "Topic with its resources in order and the caller's completion flag",
    responses(
        (status = 200, description = "Topic found", body = TopicWithResources),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "topics",
    security(
        ("cookie" = [])
    )
)]
async fn topic_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let topic = find_topic(&state, user, id).await?;

    let (resources, done) = tokio::try_join!(
        topic.resources(state.pool()),
        MeasureProgress::completion_set(state.pool(), user.user_id()),
    )
    .map_err(topic_error)?;

    let completed = done.contains(ProgressKind::Topic, topic.id());
    Ok((
        StatusCode::OK,
        Json(TopicWithResources {
            topic,
            resources,
            completed,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/topics",
    request_body = TopicCreate,
    responses(
        (status = 201, description = "Topic created", body = Topic),
        (status = 400, description = "Invalid topic", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "topics",
    security(
        ("cookie" = [])
    )
)]
async fn topic_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<TopicCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validate(&payload)?;

    let created = Topic::create(state.pool(), user, payload)
        .await
        .map_err(topic_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/topics/{id}",
    request_body = TopicCreate,
    responses(
        (status = 200, description = "Topic updated", body = Topic),
        (status = 400, description = "Invalid topic", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "topics",
    security(
        ("cookie" = [])
    )
)]
async fn topic_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TopicCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validate(&payload)?;

    let found = find_topic(&state, user, id).await?;
    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(topic_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/topics/{id}",
    description = "Soft deletes a topic",
    responses(
        (status = 200, description = "Topic deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "topics",
    security(
        ("cookie" = [])
    )
)]
async fn topic_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = find_topic(&state, user, id).await?;
    found.delete(state.pool(), user).await.map_err(topic_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/topics/{id}/resources",
    request_body = AttachBody,
    responses(
        (status = 201, description = "Resource attached", body = Vec<Resource>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Topic or resource not found", body = ErrorResponse),
        (status = 409, description = "Resource or position already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "topics",
    security(
        ("cookie" = [])
    )
)]
async fn topic_attach_resource_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let topic = find_topic(&state, user, id).await?;
    Resource::find_by_id(state.pool(), user, payload.id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Resource, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Resource))?;

    topic
        .attach_resource(state.pool(), payload.id, payload.position)
        .await
        .map_err(topic_error)?;
    let resources = topic.resources(state.pool()).await.map_err(topic_error)?;

    Ok((StatusCode::CREATED, Json(resources)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/topics/{id}/resources/{resource_id}",
    responses(
        (status = 200, description = "Resource detached"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Resource is not part of the topic", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "topics",
    security(
        ("cookie" = [])
    )
)]
async fn topic_detach_resource_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, resource_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let topic = find_topic(&state, user, id).await?;
    let removed = topic
        .detach_resource(state.pool(), resource_id)
        .await
        .map_err(topic_error)?;

    if !removed {
        return Err(WebError::resource_not_found(ResourceType::Resource));
    }

    Ok(StatusCode::OK)
}
