use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::Value;

use crate::{
    integrations::CourseQuery,
    model::{
        DatabaseError, ResourceType,
        entity::{Program, ProgramFilter},
    },
    web::{
        AppState, WebError, WebResult,
        dto::assistant::{ChatBody, ChatResponse},
        error::ErrorResponse,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/chat", post(chat_handler))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/assistant/chat",
    request_body = ChatBody,
    description = "Answers a free-form question about the catalog. The model picks a category or course and which fields to return.",
    responses(
        (status = 200, description = "What the model understood and the matching catalog entries", body = ChatResponse),
        (status = 400, description = "Empty message", body = ErrorResponse),
        (status = 500, description = "Model unavailable or its reply was unusable", body = ErrorResponse),
    ),
    tag = "assistant",
)]
#[tracing::instrument(skip_all)]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatBody>,
) -> WebResult<impl IntoResponse> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(WebError::resource_bad_request(
            ResourceType::Course,
            "message is required",
        ));
    }

    let query = state
        .integrations()
        .assistant
        .classify(message)
        .await
        .map_err(WebError::server_integration_error)?;
    tracing::debug!("assistant understood {query:?}");

    let fetch_error = |e: DatabaseError| WebError::resource_fetch_error(ResourceType::Program, e);

    let results: Vec<Value> = if query.wants_all_categories() {
        Program::categories(state.pool())
            .await
            .map_err(fetch_error)?
            .into_iter()
            .map(Value::String)
            .collect()
    } else if let Some(filter) = catalog_filter(&query) {
        let programs = Program::search_all(state.pool(), &filter)
            .await
            .map_err(fetch_error)?;
        programs
            .iter()
            .map(|p| serde_json::to_value(p).map(|v| query.project(v)))
            .collect::<Result<_, _>>()
            .map_err(|e: serde_json::Error| fetch_error(e.into()))?
    } else {
        Vec::new()
    };

    Ok((
        StatusCode::OK,
        Json(ChatResponse {
            success: true,
            ai_understanding: query,
            results,
        }),
    ))
}

/// Category wins over course name. `None` when the model recognised neither.
fn catalog_filter(query: &CourseQuery) -> Option<ProgramFilter> {
    if query.wants_all_courses() {
        return Some(ProgramFilter::default());
    }

    let given = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(category) = given(&query.category) {
        return Some(ProgramFilter {
            category: Some(category),
            search: None,
        });
    }
    given(&query.course_name).map(|name| ProgramFilter {
        category: None,
        search: Some(name),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn query(category: Option<&str>, course_name: Option<&str>) -> CourseQuery {
        CourseQuery {
            category: category.map(str::to_string),
            course_name: course_name.map(str::to_string),
            select: None,
        }
    }

    #[test]
    fn nothing_recognised_looks_up_nothing() {
        assert!(catalog_filter(&CourseQuery::default()).is_none());
        assert!(catalog_filter(&query(Some(" "), Some(""))).is_none());
    }

    #[test]
    fn category_takes_precedence_over_name() {
        let filter = catalog_filter(&query(Some("React"), Some("Bootcamp"))).unwrap();
        assert_eq!(filter.category.as_deref(), Some("React"));
        assert!(filter.search.is_none());

        let filter = catalog_filter(&query(None, Some("Bootcamp"))).unwrap();
        assert!(filter.category.is_none());
        assert_eq!(filter.search.as_deref(), Some("Bootcamp"));
    }

    #[test]
    fn all_courses_is_unfiltered() {
        let filter = catalog_filter(&query(None, Some("all"))).unwrap();
        assert!(filter.category.is_none() && filter.search.is_none());
    }
}
