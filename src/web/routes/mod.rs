use crate::{
    Config,
    web::{AppState, doc::ApiDoc},
};
use axum::{Router, extract::DefaultBodyLimit};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod account;
pub mod assistant;
pub mod enrollments;
pub mod learners;
pub mod modules;
pub mod payments;
pub mod programs;
pub mod progress;
pub mod quiz;
pub mod resources;
pub mod topics;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    20
}

pub const MAX_PAGE_SIZE: i64 = 100;

/// Keeps caller-supplied paging inside what the database accepts.
pub fn clamp_paging(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_SIZE), offset.max(0))
}

impl PaginationQuery {
    pub fn paging(&self) -> (i64, i64) {
        clamp_paging(self.limit, self.offset)
    }
}

pub fn build_app<S: Send + Sync + Clone + 'static>(
    state: AppState,
    config: &'static Config,
) -> Router<S> {
    // Multipart uploads (resources and photos) may exceed axum's 2 MB default.
    let upload_limit = DefaultBodyLimit::max(config.media().max_upload_bytes());

    let mut router = Router::new()
        .nest("/api/v1/account", account::routes(state.clone()))
        .nest(
            "/api/v1/learners",
            learners::routes(state.clone()).layer(upload_limit.clone()),
        )
        .nest("/api/v1/enrollments", enrollments::routes(state.clone()))
        .nest("/api/v1/programs", programs::routes(state.clone()))
        .nest("/api/v1/modules", modules::routes(state.clone()))
        .nest("/api/v1/topics", topics::routes(state.clone()))
        .nest(
            "/api/v1/resources",
            resources::routes(state.clone()).layer(upload_limit),
        )
        .nest("/api/v1/progress", progress::routes(state.clone()))
        .nest("/api/v1/quiz", quiz::routes(state.clone()))
        .nest("/api/v1/payments", payments::routes(state.clone()))
        .nest("/api/v1/assistant", assistant::routes(state.clone()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        assert_eq!(clamp_paging(20, 0), (20, 0));
        assert_eq!(clamp_paging(-5, -10), (1, 0));
        assert_eq!(clamp_paging(0, 3), (1, 3));
        assert_eq!(clamp_paging(10_000, 40), (MAX_PAGE_SIZE, 40));
    }

    #[test]
    fn pagination_query_defaults() {
        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.paging(), (20, 0));

        let query: PaginationQuery =
            serde_json::from_str(r#"{"limit": -1, "offset": -1}"#).unwrap();
        assert_eq!(query.paging(), (1, 0));
    }
}
