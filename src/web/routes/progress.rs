use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::post,
};

use crate::{
    model::{
        ResourceTyped,
        entity::{MeasureProgress, MeasureProgressCreate},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::progress::{ProgressBody, ProgressRecorded},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(progress_mark_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/progress",
    request_body = ProgressBody,
    description = "Marks a program, module, resource or topic as completed for the caller. \
        The marker type is taken from the first id given in that order",
    responses(
        (status = 201, description = "Completion recorded", body = ProgressRecorded),
        (status = 400, description = "No target id given, or it does not exist", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
async fn progress_mark_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ProgressBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let Some(kind) = payload.kind() else {
        return Err(WebError::resource_bad_request(
            MeasureProgress::get_resource_type(),
            "one of program_id, module_id, resource_id or topic_id is required",
        ));
    };

    let recorded = MeasureProgress::record(
        state.pool(),
        MeasureProgressCreate {
            learner_id: user.user_id(),
            kind,
            program_id: payload.program_id,
            module_id: payload.module_id,
            resource_id: payload.resource_id,
            topic_id: payload.topic_id,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(MeasureProgress::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        Json(ProgressRecorded {
            id: recorded.id(),
            progress_type: kind,
            status: recorded.status().to_string(),
        }),
    ))
}
