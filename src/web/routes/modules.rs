use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceType, ResourceTyped,
        entity::{Module, ModuleCreate, Topic},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::modules::{AttachBody, ModuleWithTopics},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(module_list_handler).post(module_create_handler))
        .route(
            "/{id}",
            get(module_get_handler)
                .put(module_update_handler)
                .delete(module_delete_handler),
        )
        .route("/{id}/topics", post(module_attach_topic_handler))
        .route("/{id}/topics/{topic_id}", delete(module_detach_topic_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn module_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Module::get_resource_type(), e)
}

async fn find_module(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Module> {
    Module::find_by_id(state.pool(), actor, id)
        .await
        .map_err(module_error)?
        .ok_or(WebError::resource_not_found(Module::get_resource_type()))
}

fn validate(payload: &ModuleCreate) -> WebResult<()> {
    if payload.title.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            ResourceType::Module,
            "title is required",
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/modules",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page of modules", body = crate::model::Page<Module>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let (limit, offset) = page.paging();
    let modules = Module::page(state.pool(), user, limit, offset)
        .await
        .map_err(module_error)?;

    Ok((StatusCode::OK, Json(modules)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}",
    responses(
        (status = 200, description = "Module with its topics in order", body = ModuleWithTopics),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let module = find_module(&state, user, id).await?;
    let topics = module.topics(state.pool()).await.map_err(module_error)?;

    Ok((StatusCode::OK, Json(ModuleWithTopics { module, topics })))
}

#[utoipa::path(
    post,
    path = "/api/v1/modules",
    request_body = ModuleCreate,
    responses(
        (status = 201, description = "Module created", body = Module),
        (status = 400, description = "Invalid module", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validate(&payload)?;

    let created = Module::create(state.pool(), user, payload)
        .await
        .map_err(module_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/{id}",
    request_body = ModuleCreate,
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 400, description = "Invalid module", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validate(&payload)?;

    let found = find_module(&state, user, id).await?;
    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(module_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modules/{id}",
    description = "Soft deletes a module",
    responses(
        (status = 200, description = "Module deleted"),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = find_module(&state, user, id).await?;
    found.delete(state.pool(), user).await.map_err(module_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/modules/{id}/topics",
    request_body = AttachBody,
    responses(
        (status = 201, description = "Topic attached", body = ModuleWithTopics),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Module or topic not found", body = ErrorResponse),
        (status = 409, description = "Topic or position already taken", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_attach_topic_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let module = find_module(&state, user, id).await?;
    Topic::find_by_id(state.pool(), user, payload.id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Topic, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Topic))?;

    module
        .attach_topic(state.pool(), payload.id, payload.position)
        .await
        .map_err(module_error)?;
    let topics = module.topics(state.pool()).await.map_err(module_error)?;

    Ok((StatusCode::CREATED, Json(ModuleWithTopics { module, topics })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modules/{id}/topics/{topic_id}",
    responses(
        (status = 200, description = "Topic detached"),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Topic is not part of the module", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
async fn module_detach_topic_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, topic_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let module = find_module(&state, user, id).await?;
    let removed = module
        .detach_topic(state.pool(), topic_id)
        .await
        .map_err(module_error)?;

    if !removed {
        return Err(WebError::resource_not_found(ResourceType::Topic));
    }

    Ok(StatusCode::OK)
}
