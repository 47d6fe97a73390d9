use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    auth::{ResetToken, hash_password, hash_reset_token, verify_password},
    domain::LearnerSnapshot,
    integrations::mailer::{password_reset_email, reset_link},
    model::{
        CrudRepository, PaginatableRepository, ResourceType, ResourceTyped, check_access,
        entity::{Enrollment, MeasureProgress, PasswordReset, QuizAttempt, UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::account::{
            AccountUpdateBody, ForgotPasswordBody, MeResponse, MessageResponse,
            ResetPasswordBody, SigninBody, SignupBody,
        },
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN, session_cookie},
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(account_me_handler))
        .route("/page", get(account_list_handler))
        .route(
            "/{id}",
            put(account_update_handler).delete(account_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(account_signup_handler))
        .route("/signin", post(account_signin_handler))
        .route("/signout", post(account_signout_handler))
        .route("/forgot-password", post(account_forgot_password_handler))
        .route("/reset-password", post(account_reset_password_handler))
        .merge(protected)
        .with_state(state)
}

fn user_error(e: crate::model::DatabaseError) -> WebError {
    WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = SignupBody,
    description = "Creates a learner account and signs it in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "A required field is blank", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
#[tracing::instrument(skip_all)]
async fn account_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignupBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate()?;

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_email(state.pool(), &payload.email)
        .await
        .map_err(user_error)?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        email: payload.email,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        password_hash: hash,
        role: UserRole::Learner,
    };

    // a concurrent signup with the same email surfaces as a unique violation
    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                user_error(e)
            }
        })?;

    tracing::info!("user {} signed up", created.id());
    cookies.add(session_cookie(created.id(), state.config().app().jwt())?);

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
#[tracing::instrument(skip_all)]
async fn account_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let Some(mut found) = UserEntity::find_by_email(state.pool(), &payload.email)
        .await
        .map_err(user_error)?
    else {
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    found.touch_last_login(state.pool()).await.map_err(user_error)?;
    cookies.add(session_cookie(found.id(), state.config().app().jwt())?);

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Drops the session cookie",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
    ),
    tag = "account",
)]
async fn account_signout_handler(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::new(AUTH_TOKEN, "");
    cookie.set_path("/");
    cookies.remove(cookie);

    (StatusCode::OK, Json(MessageResponse::new("Signed out.")))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    description = "Current user with enrolled programs, completion markers and quiz attempts",
    responses(
        (status = 200, description = "Snapshot of the current user", body = MeResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    let (found, enrolled, done, attempts) = tokio::try_join!(
        UserEntity::find_by_id(mm, user, user.user_id()),
        Enrollment::program_ids_for(mm, user.user_id()),
        MeasureProgress::completion_set(mm, user.user_id()),
        QuizAttempt::summaries_for(mm, user.user_id()),
    )
    .map_err(user_error)?;

    let found = found.ok_or(WebError::resource_not_found(ResourceType::User))?;
    let snapshot = LearnerSnapshot::build(enrolled, &done, &attempts, Utc::now());

    Ok((
        StatusCode::OK,
        Json(MeResponse {
            user: found,
            snapshot,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let (limit, offset) = page.paging();

    let users = UserEntity::page(state.pool(), user, limit, offset)
        .await
        .map_err(user_error)?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = AccountUpdateBody,
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Blank name or email", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You doesn't have enough permissions to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(user_error)?
        .ok_or(WebError::resource_not_found(ResourceType::User))?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(user_error)?;

    let conflict = UserEntity::find_by_email(state.pool(), &payload.email)
        .await
        .map_err(user_error)?;

    if conflict.is_some_and(|other| other.id() != found.id()) {
        return Err(WebError::registration_conflict());
    }

    let role = found.role();
    let payload = UserEntityCreateUpdate {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        password_hash: String::new(), // not in use
        role,
    };

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                user_error(e)
            }
        })?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user",
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(user_error)?
        .ok_or(WebError::resource_not_found(ResourceType::User))?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(user_error)?;

    found.delete(state.pool(), user).await.map_err(user_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/forgot-password",
    request_body = ForgotPasswordBody,
    description = "Emails a one hour password reset link",
    responses(
        (status = 200, description = "Reset link sent", body = MessageResponse),
        (status = 404, description = "No user with this email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
#[tracing::instrument(skip_all)]
async fn account_forgot_password_handler(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordBody>,
) -> WebResult<impl IntoResponse> {
    let found = UserEntity::find_by_email(state.pool(), &payload.email)
        .await
        .map_err(user_error)?
        .ok_or(WebError::resource_not_found(ResourceType::User))?;

    let token = ResetToken::generate();
    PasswordReset::create(state.pool(), found.id(), &token)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::PasswordReset, e))?;

    let link = reset_link(state.config().app().base_url(), &token.raw);
    state
        .integrations()
        .mailer
        .send(password_reset_email(found.email(), found.first_name(), &link))
        .await
        .map_err(WebError::server_integration_error)?;

    tracing::info!("password reset requested for user {}", found.id());
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password reset link sent to your email.")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/reset-password",
    request_body = ResetPasswordBody,
    description = "Sets a new password using an emailed reset token",
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Token or password missing", body = ErrorResponse),
        (status = 409, description = "Token invalid or expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
#[tracing::instrument(skip_all)]
async fn account_reset_password_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordBody>,
) -> WebResult<impl IntoResponse> {
    let (token, password) = payload.parts().ok_or(WebError::resource_bad_request(
        ResourceType::PasswordReset,
        "token and new_password are required",
    ))?;

    let reset = PasswordReset::find_valid(state.pool(), &hash_reset_token(token))
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::PasswordReset, e))?
        .ok_or(WebError::reset_token_invalid())?;

    let mut found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), reset.user_id())
        .await
        .map_err(user_error)?
        .ok_or(WebError::reset_token_invalid())?;

    let hash = hash_password(password).map_err(WebError::server_crypt_error)?;
    found.set_password(state.pool(), hash).await.map_err(user_error)?;

    PasswordReset::delete_for_user(state.pool(), found.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::PasswordReset, e))?;

    tracing::info!("password reset completed for user {}", found.id());
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password has been reset successfully.")),
    ))
}
