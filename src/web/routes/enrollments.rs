use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    model::{
        CrudRepository, ResourceType, check_owner,
        entity::{Enrollment, Program},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::enrollments::{EnrollBody, EnrollmentCheck, EnrollmentCheckQuery},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(enrollment_create_handler))
        .route("/check", get(enrollment_check_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    request_body = EnrollBody,
    description = "Enrolls the caller (or, for admins, any learner) in a program",
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Learners can only enroll themselves", body = ErrorResponse),
        (status = 404, description = "Program not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
async fn enrollment_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<EnrollBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let learner_id = payload.learner_id.unwrap_or(user.user_id());
    check_owner(user, learner_id)
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    Program::find_by_id(state.pool(), user, payload.program_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Program, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Program))?;

    let created = Enrollment::create(state.pool().executor(), learner_id, payload.program_id)
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

    tracing::info!("learner {learner_id} enrolled in {}", payload.program_id);
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments/check",
    params(EnrollmentCheckQuery),
    description = "Tells whether the caller is enrolled in a program",
    responses(
        (status = 200, description = "Enrollment state", body = EnrollmentCheck),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
async fn enrollment_check_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<EnrollmentCheckQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Enrollment::find(state.pool(), user.user_id(), query.program_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    Ok((
        StatusCode::OK,
        Json(EnrollmentCheck {
            enrolled: found.is_some(),
        }),
    ))
}
