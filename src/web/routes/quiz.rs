use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{GradableQuestion, scoring},
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceType,
        entity::{
            Question, QuestionAttempt, QuestionCreate, QuestionPaper, QuestionPaperCreate,
            QuizAssignment, QuizAssignmentCreate, QuizAttempt,
        },
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            modules::AttachBody,
            quiz::{
                AnswerBody, AssignmentBody, AssignmentDetails, AttemptResponse, PaperDetails,
                QuestionBody, SubmitResponse,
            },
        },
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/questions",
            get(question_list_handler).post(question_create_handler),
        )
        .route(
            "/questions/{id}",
            put(question_update_handler).delete(question_delete_handler),
        )
        .route("/papers", post(paper_create_handler))
        .route(
            "/papers/{id}",
            get(paper_get_handler).delete(paper_delete_handler),
        )
        .route("/papers/{id}/questions", post(paper_attach_question_handler))
        .route(
            "/papers/{id}/questions/{question_id}",
            delete(paper_detach_question_handler),
        )
        .route(
            "/assignments",
            get(assignment_list_handler).post(assignment_create_handler),
        )
        .route(
            "/assignments/{id}",
            get(assignment_get_handler)
                .put(assignment_update_handler)
                .delete(assignment_delete_handler),
        )
        .route(
            "/assignments/{id}/attempt",
            get(attempt_get_handler).post(attempt_start_handler),
        )
        .route("/assignments/{id}/answers", put(attempt_answer_handler))
        .route("/assignments/{id}/submit", post(attempt_submit_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn fetch_error(resource: ResourceType) -> impl Fn(DatabaseError) -> WebError {
    move |e| WebError::resource_fetch_error(resource.clone(), e)
}

async fn find_question(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Question> {
    Question::find_by_id(state.pool(), actor, id)
        .await
        .map_err(fetch_error(ResourceType::Question))?
        .ok_or(WebError::resource_not_found(ResourceType::Question))
}

async fn find_paper(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<QuestionPaper> {
    QuestionPaper::find_by_id(state.pool(), actor, id)
        .await
        .map_err(fetch_error(ResourceType::QuestionPaper))?
        .ok_or(WebError::resource_not_found(ResourceType::QuestionPaper))
}

/// Soft-deleted assignments are gone for everybody, disabled ones for learners.
async fn find_assignment(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<QuizAssignment> {
    QuizAssignment::find_by_id(state.pool(), actor, id)
        .await
        .map_err(fetch_error(ResourceType::QuizAssignment))?
        .filter(|a| a.enabled() || actor.is_admin())
        .ok_or(WebError::resource_not_found(ResourceType::QuizAssignment))
}

async fn find_attempt(
    state: &AppState,
    actor: &AuthenticatedUser,
    assignment_id: Uuid,
) -> WebResult<QuizAttempt> {
    QuizAttempt::find_for(state.pool(), assignment_id, actor.user_id())
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?
        .ok_or(WebError::resource_not_found(ResourceType::QuizAttempt))
}

async fn gradable_questions(state: &AppState, paper_id: Uuid) -> WebResult<Vec<GradableQuestion>> {
    let questions = Question::for_paper(state.pool(), paper_id)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok(questions.iter().filter_map(Question::gradable).collect())
}

async fn attempt_response(
    state: &AppState,
    assignment: &QuizAssignment,
    attempt: QuizAttempt,
) -> WebResult<AttemptResponse> {
    let answers = QuestionAttempt::answers_for(state.pool(), attempt.id())
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?;
    let status = attempt.status_at(assignment.time_limit_seconds(), Utc::now());

    Ok(AttemptResponse {
        attempt,
        status,
        answers,
    })
}

// Question pool

#[utoipa::path(
    get,
    path = "/api/v1/quiz/questions",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page of the question pool", body = crate::model::Page<Question>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn question_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let (limit, offset) = page.paging();
    let questions = Question::page(state.pool(), user, limit, offset)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok((StatusCode::OK, Json(questions)))
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/questions",
    request_body = QuestionBody,
    responses(
        (status = 201, description = "Question added to the pool", body = Question),
        (status = 400, description = "Missing text or type, or invalid points", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn question_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let data = QuestionCreate::try_from(payload)?;

    let created = Question::create(state.pool(), user, data)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/quiz/questions/{id}",
    request_body = QuestionBody,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 400, description = "Missing text or type, or invalid points", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn question_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let data = QuestionCreate::try_from(payload)?;

    let found = find_question(&state, user, id).await?;
    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quiz/questions/{id}",
    responses(
        (status = 200, description = "Question removed from the pool"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn question_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = find_question(&state, user, id).await?;
    found
        .delete(state.pool(), user)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok(StatusCode::OK)
}

// Question papers

#[utoipa::path(
    post,
    path = "/api/v1/quiz/papers",
    request_body = QuestionPaperCreate,
    responses(
        (status = 201, description = "Paper created", body = QuestionPaper),
        (status = 400, description = "Title missing", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn paper_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuestionPaperCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    if payload.title.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            ResourceType::QuestionPaper,
            "title is required",
        ));
    }

    let created = QuestionPaper::create(state.pool(), user, payload)
        .await
        .map_err(fetch_error(ResourceType::QuestionPaper))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quiz/papers/{id}",
    responses(
        (status = 200, description = "Paper with its questions in order", body = PaperDetails),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Paper not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn paper_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let paper = find_paper(&state, user, id).await?;
    let questions = Question::for_paper(state.pool(), id)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok((StatusCode::OK, Json(PaperDetails { paper, questions })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quiz/papers/{id}",
    responses(
        (status = 200, description = "Paper deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Paper not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn paper_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let paper = find_paper(&state, user, id).await?;
    paper
        .delete(state.pool(), user)
        .await
        .map_err(fetch_error(ResourceType::QuestionPaper))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/papers/{id}/questions",
    request_body = AttachBody,
    responses(
        (status = 201, description = "Question placed on the paper", body = PaperDetails),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Paper or question not found", body = ErrorResponse),
        (status = 409, description = "Question or position already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn paper_attach_question_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let paper = find_paper(&state, user, id).await?;
    find_question(&state, user, payload.id).await?;

    paper
        .attach_question(state.pool(), payload.id, payload.position)
        .await
        .map_err(fetch_error(ResourceType::QuestionPaper))?;
    let questions = Question::for_paper(state.pool(), id)
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok((StatusCode::CREATED, Json(PaperDetails { paper, questions })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quiz/papers/{id}/questions/{question_id}",
    responses(
        (status = 200, description = "Question removed from the paper"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Question is not on the paper", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn paper_detach_question_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let paper = find_paper(&state, user, id).await?;
    let removed = paper
        .detach_question(state.pool(), question_id)
        .await
        .map_err(fetch_error(ResourceType::QuestionPaper))?;

    if !removed {
        return Err(WebError::resource_not_found(ResourceType::Question));
    }

    Ok(StatusCode::OK)
}

// Assignments

#[utoipa::path(
    get,
    path = "/api/v1/quiz/assignments",
    params(PaginationQuery),
    description = "Enabled assignments",
    responses(
        (status = 200, description = "Requested page of assignments", body = crate::model::Page<QuizAssignment>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn assignment_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let (limit, offset) = page.paging();
    let assignments = QuizAssignment::page(state.pool(), user, limit, offset)
        .await
        .map_err(fetch_error(ResourceType::QuizAssignment))?;

    Ok((StatusCode::OK, Json(assignments)))
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/assignments",
    request_body = AssignmentBody,
    responses(
        (status = 201, description = "Assignment published", body = QuizAssignment),
        (status = 400, description = "Invalid assignment", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Paper not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn assignment_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    if payload.title.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            ResourceType::QuizAssignment,
            "title is required",
        ));
    }
    find_paper(&state, user, payload.question_paper_id).await?;

    let created = QuizAssignment::create(state.pool(), user, QuizAssignmentCreate::from(payload))
        .await
        .map_err(fetch_error(ResourceType::QuizAssignment))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quiz/assignments/{id}",
    description = "Assignment with its questions, correct answers hidden",
    responses(
        (status = 200, description = "Assignment found", body = AssignmentDetails),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Assignment not found or deleted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn assignment_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let assignment = find_assignment(&state, user, id).await?;
    let questions = Question::for_paper(state.pool(), assignment.question_paper_id())
        .await
        .map_err(fetch_error(ResourceType::Question))?;

    Ok((
        StatusCode::OK,
        Json(AssignmentDetails {
            assignment,
            questions: questions.iter().map(Question::view).collect(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/quiz/assignments/{id}",
    request_body = AssignmentBody,
    responses(
        (status = 200, description = "Assignment updated", body = QuizAssignment),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn assignment_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignmentBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = find_assignment(&state, user, id).await?;
    let updated = found
        .update(state.pool(), user, QuizAssignmentCreate::from(payload))
        .await
        .map_err(fetch_error(ResourceType::QuizAssignment))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quiz/assignments/{id}",
    description = "Soft deletes an assignment, attempts are kept",
    responses(
        (status = 200, description = "Assignment deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn assignment_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = find_assignment(&state, user, id).await?;
    found
        .delete(state.pool(), user)
        .await
        .map_err(fetch_error(ResourceType::QuizAssignment))?;

    Ok(StatusCode::OK)
}

// Attempts

#[utoipa::path(
    get,
    path = "/api/v1/quiz/assignments/{id}/attempt",
    description = "The caller's attempt at the assignment with saved answers",
    responses(
        (status = 200, description = "Attempt found", body = AttemptResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No attempt yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn attempt_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let assignment = find_assignment(&state, user, id).await?;
    let attempt = find_attempt(&state, user, id).await?;

    Ok((
        StatusCode::OK,
        Json(attempt_response(&state, &assignment, attempt).await?),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/assignments/{id}/attempt",
    description = "Starts the caller's single attempt at the assignment",
    responses(
        (status = 201, description = "Attempt started", body = AttemptResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Attempt already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
async fn attempt_start_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let assignment = find_assignment(&state, user, id).await?;
    let attempt = QuizAttempt::start(state.pool(), id, user.user_id())
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::resource_conflict(
                    ResourceType::QuizAttempt,
                    "quiz already attempted",
                )
            } else {
                WebError::resource_fetch_error(ResourceType::QuizAttempt, e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(attempt_response(&state, &assignment, attempt).await?),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/quiz/assignments/{id}/answers",
    request_body = AnswerBody,
    description = "Saves one answer; the running score is recomputed from every stored answer",
    responses(
        (status = 200, description = "Answer saved", body = AttemptResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Attempt or question not found", body = ErrorResponse),
        (status = 409, description = "Attempt finished or timed out", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
async fn attempt_answer_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let assignment = find_assignment(&state, user, id).await?;
    let attempt = find_attempt(&state, user, id).await?;

    if attempt.is_completed() {
        return Err(WebError::resource_conflict(
            ResourceType::QuizAttempt,
            "attempt already submitted",
        ));
    }
    if scoring::is_expired(attempt.started_at(), assignment.time_limit_seconds(), Utc::now()) {
        return Err(WebError::resource_conflict(
            ResourceType::QuizAttempt,
            "time limit exceeded",
        ));
    }

    let questions = gradable_questions(&state, assignment.question_paper_id()).await?;
    let question = questions
        .iter()
        .find(|q| q.id == payload.question_id)
        .ok_or(WebError::resource_not_found(ResourceType::Question))?;

    let grade = scoring::grade(question, Some(&payload.answer));
    QuestionAttempt::save(state.pool(), attempt.id(), &payload.answer, &grade)
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?;

    let answers = QuestionAttempt::answers_for(state.pool(), attempt.id())
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?;
    let (_, score) = scoring::score_paper(&questions, &answers);

    let attempt = attempt
        .update_score(state.pool(), &score)
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?;
    let status = attempt.status_at(assignment.time_limit_seconds(), Utc::now());

    Ok((
        StatusCode::OK,
        Json(AttemptResponse {
            attempt,
            status,
            answers,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/quiz/assignments/{id}/submit",
    description = "Grades every stored answer and completes the attempt",
    responses(
        (status = 200, description = "Attempt graded", body = SubmitResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No attempt to submit", body = ErrorResponse),
        (status = 409, description = "Attempt already submitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quiz",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
async fn attempt_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let assignment = find_assignment(&state, user, id).await?;
    let attempt = find_attempt(&state, user, id).await?;

    if attempt.is_completed() {
        return Err(WebError::resource_conflict(
            ResourceType::QuizAttempt,
            "attempt already submitted",
        ));
    }

    let questions = gradable_questions(&state, assignment.question_paper_id()).await?;
    let answers = QuestionAttempt::answers_for(state.pool(), attempt.id())
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?;
    let (grades, score) = scoring::score_paper(&questions, &answers);

    let attempt = attempt
        .complete(state.pool(), &score)
        .await
        .map_err(fetch_error(ResourceType::QuizAttempt))?;
    let status = attempt.status_at(assignment.time_limit_seconds(), Utc::now());

    tracing::info!(
        "learner {} finished quiz {} with {:.2}",
        user.user_id(),
        id,
        score.score
    );
    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            attempt,
            status,
            score,
            grades,
        }),
    ))
}
