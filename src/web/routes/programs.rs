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
    domain::{ProgramProgress, program_progress},
    model::{
        CrudRepository, DatabaseError, Page, ResourceType, ResourceTyped,
        entity::{MeasureProgress, Module, Program, ProgramCreate, ProgramModuleOutline},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            modules::AttachBody,
            programs::{ProgramDetails, ProgramQuery},
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(program_list_handler).post(program_create_handler))
        .route("/categories", get(program_categories_handler))
        .route(
            "/{id}",
            get(program_get_handler)
                .put(program_update_handler)
                .delete(program_delete_handler),
        )
        .route("/{id}/modules", post(program_attach_module_handler))
        .route(
            "/{id}/modules/{module_id}",
            delete(program_detach_module_handler),
        )
        .route("/{id}/progress", get(program_progress_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn program_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Program::get_resource_type(), e)
}

async fn find_program(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Program> {
    Program::find_by_id(state.pool(), actor, id)
        .await
        .map_err(program_error)?
        .ok_or(WebError::resource_not_found(Program::get_resource_type()))
}

fn validate(payload: &ProgramCreate) -> WebResult<()> {
    if payload.title.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            ResourceType::Program,
            "title is required",
        ));
    }
    if !payload.price.is_finite() || payload.price < 0.0 {
        return Err(WebError::resource_bad_request(
            ResourceType::Program,
            "price must be a non-negative number",
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/programs",
    params(ProgramQuery),
    description = "Active programs, optionally filtered by category or title",
    responses(
        (status = 200, description = "Requested page of programs", body = Page<Program>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
)]
async fn program_list_handler(
    State(state): State<AppState>,
    Query(query): Query<ProgramQuery>,
) -> WebResult<impl IntoResponse> {
    let filter = query.filter();
    let (limit, offset) = query.paging();

    let (items, total) = tokio::try_join!(
        Program::search(state.pool(), &filter, limit, offset),
        Program::count_matching(state.pool(), &filter),
    )
    .map_err(program_error)?;

    Ok((
        StatusCode::OK,
        Json(Page::new(items, total, limit, offset)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/categories",
    description = "Distinct categories of active programs",
    responses(
        (status = 200, description = "Categories", body = Vec<String>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
)]
async fn program_categories_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let categories = Program::categories(state.pool()).await.map_err(program_error)?;
    Ok((StatusCode::OK, Json(categories)))
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/{id}",
    description = "Program with its modules, topics and resources in order",
    responses(
        (status = 200, description = "Program found", body = ProgramDetails),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
)]
async fn program_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let program = find_program(&state, &AuthenticatedUser::admin(), id).await?;
    let modules = ProgramModuleOutline::fetch_all(state.pool(), id)
        .await
        .map_err(program_error)?;

    Ok((StatusCode::OK, Json(ProgramDetails { program, modules })))
}

#[utoipa::path(
    post,
    path = "/api/v1/programs",
    request_body = ProgramCreate,
    responses(
        (status = 201, description = "Program created", body = Program),
        (status = 400, description = "Invalid program", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
async fn program_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ProgramCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validate(&payload)?;

    let created = Program::create(state.pool(), user, payload)
        .await
        .map_err(program_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/programs/{id}",
    request_body = ProgramCreate,
    responses(
        (status = 200, description = "Program updated", body = Program),
        (status = 400, description = "Invalid program", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
async fn program_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgramCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    validate(&payload)?;

    let found = find_program(&state, user, id).await?;
    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(program_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/programs/{id}",
    description = "Soft deletes a program",
    responses(
        (status = 200, description = "Program deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
async fn program_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = find_program(&state, user, id).await?;
    found.delete(state.pool(), user).await.map_err(program_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/programs/{id}/modules",
    request_body = AttachBody,
    description = "Places a module in the program at the given position",
    responses(
        (status = 201, description = "Module attached", body = Vec<ProgramModuleOutline>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Program or module not found", body = ErrorResponse),
        (status = 409, description = "Module or position already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
async fn program_attach_module_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let program = find_program(&state, user, id).await?;
    Module::find_by_id(state.pool(), user, payload.id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Module, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Module))?;

    program
        .attach_module(state.pool(), payload.id, payload.position)
        .await
        .map_err(program_error)?;

    let modules = ProgramModuleOutline::fetch_all(state.pool(), id)
        .await
        .map_err(program_error)?;

    Ok((StatusCode::CREATED, Json(modules)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/programs/{id}/modules/{module_id}",
    description = "Removes a module from the program",
    responses(
        (status = 200, description = "Module detached"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Module is not part of the program", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
async fn program_detach_module_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let program = find_program(&state, user, id).await?;
    let removed = program
        .detach_module(state.pool(), module_id)
        .await
        .map_err(program_error)?;

    if !removed {
        return Err(WebError::resource_not_found(ResourceType::Module));
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/programs/{id}/progress",
    description = "Completion of the program for the caller, per module and overall",
    responses(
        (status = 200, description = "Progress computed", body = ProgramProgress),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "programs",
    security(
        ("cookie" = [])
    )
)]
async fn program_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    find_program(&state, user, id).await?;

    let (tree, done) = tokio::try_join!(
        Program::tree(state.pool(), id),
        MeasureProgress::completion_set(state.pool(), user.user_id()),
    )
    .map_err(|e| WebError::resource_fetch_error(ResourceType::Progress, e))?;

    Ok((StatusCode::OK, Json(program_progress(&tree, &done))))
}
