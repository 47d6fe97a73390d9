use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Session cookie carrying a signed JWT for `user_id`.
pub fn session_cookie(user_id: Uuid, jwt_secret: &str) -> Result<Cookie<'static>, WebError> {
    let token = auth::generate_token(auth::session_claims(user_id), jwt_secret)
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(tower_cookies::cookie::time::Duration::hours(
        auth::SESSION_TTL_HOURS,
    ));
    Ok(cookie)
}

pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = match cookies.get(AUTH_TOKEN) {
        Some(token) => token,
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let claims = auth::process_token(token.value(), state.config().app().jwt())
        .map_err(|e| WebError::auth_cookie_invalid(AUTH_TOKEN, e))?;

    let Ok(id) = claims.claims.sub.parse::<Uuid>() else {
        tracing::warn!("session token with malformed subject `{}`", claims.claims.sub);
        return Err(WebError::auth_required());
    };

    let user = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    // a deleted account leaves a valid token behind, treat it as anonymous
    let maybe_user = user.map(|user| AuthenticatedUser::new(id, user.role()));
    req.extensions_mut().insert(RequestContext::new(maybe_user));
    Ok(next.run(req).await)
}
