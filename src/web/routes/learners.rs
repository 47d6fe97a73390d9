use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    integrations::MediaKind,
    model::{
        CrudRepository, ResourceType, check_owner,
        entity::{Enrollment, Program, UserEntity},
    },
    utils::uploads::UploadForm,
    web::{
        AppState, RequestContext, WebError, WebResult, dto::programs::EnrolledProgram,
        error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}/photo",
            put(learner_photo_upload_handler).delete(learner_photo_delete_handler),
        )
        .route("/{id}/enrollments", get(learner_enrollments_handler))
        .route(
            "/{id}/enrollments/{program_id}",
            delete(learner_unenroll_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn load_learner(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> WebResult<UserEntity> {
    let user = ctx.user()?;
    check_owner(user, id).map_err(|e| WebError::resource_fetch_error(ResourceType::User, e))?;

    UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::User, e))?
        .ok_or(WebError::resource_not_found(ResourceType::User))
}

#[utoipa::path(
    put,
    path = "/api/v1/learners/{id}/photo",
    description = "Uploads a profile photo (multipart `file`) to the media CDN",
    responses(
        (status = 200, description = "Photo stored", body = UserEntity),
        (status = 400, description = "No file in the form", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not your profile", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "learners",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state, multipart))]
async fn learner_photo_upload_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let learner = load_learner(&state, &ctx, id).await?;

    let mut form = UploadForm::read(multipart, ResourceType::User).await?;
    let file = form.take_file(ResourceType::User)?;

    let stored = state
        .integrations()
        .media
        .upload(file.into_upload(MediaKind::Image))
        .await
        .map_err(WebError::server_integration_error)?;

    let updated = learner
        .set_profile_image(state.pool(), Some(stored.secure_url))
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::User, e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/learners/{id}/photo",
    description = "Clears the profile photo",
    responses(
        (status = 200, description = "Photo removed", body = UserEntity),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not your profile", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "learners",
    security(
        ("cookie" = [])
    )
)]
async fn learner_photo_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let learner = load_learner(&state, &ctx, id).await?;

    let updated = learner
        .set_profile_image(state.pool(), None)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::User, e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/learners/{id}/enrollments",
    description = "Programs the learner is enrolled in, with their module and topic ids",
    responses(
        (status = 200, description = "Enrolled programs", body = Vec<EnrolledProgram>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not your enrollments", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "learners",
    security(
        ("cookie" = [])
    )
)]
async fn learner_enrollments_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_owner(user, id).map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    let programs = Program::enrolled_by(state.pool(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    let mut enrolled = Vec::with_capacity(programs.len());
    for program in programs {
        let tree = Program::tree(state.pool(), program.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(ResourceType::Program, e))?;
        enrolled.push(EnrolledProgram {
            program,
            modules: tree.modules,
        });
    }

    Ok((StatusCode::OK, Json(enrolled)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/learners/{id}/enrollments/{program_id}",
    description = "Removes the learner from a program",
    responses(
        (status = 200, description = "Enrollment removed"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not your enrollment", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "learners",
    security(
        ("cookie" = [])
    )
)]
async fn learner_unenroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, program_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_owner(user, id).map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    let enrollment = Enrollment::find(state.pool(), id, program_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Enrollment))?;

    enrollment
        .delete(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    Ok(StatusCode::OK)
}
