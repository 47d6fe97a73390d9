use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::{middlewares::AUTH_TOKEN, routes};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT session token of the signed in user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "eduportal", description = "Programs, enrollments, progress tracking and quizzes"),
    paths(
        routes::account::account_signup_handler,
        routes::account::account_signin_handler,
        routes::account::account_signout_handler,
        routes::account::account_me_handler,
        routes::account::account_list_handler,
        routes::account::account_update_handler,
        routes::account::account_delete_handler,
        routes::account::account_forgot_password_handler,
        routes::account::account_reset_password_handler,
        routes::learners::learner_photo_upload_handler,
        routes::learners::learner_photo_delete_handler,
        routes::learners::learner_enrollments_handler,
        routes::learners::learner_unenroll_handler,
        routes::enrollments::enrollment_create_handler,
        routes::enrollments::enrollment_check_handler,
        routes::programs::program_list_handler,
        routes::programs::program_categories_handler,
        routes::programs::program_get_handler,
        routes::programs::program_create_handler,
        routes::programs::program_update_handler,
        routes::programs::program_delete_handler,
        routes::programs::program_attach_module_handler,
        routes::programs::program_detach_module_handler,
        routes::programs::program_progress_handler,
        routes::modules::module_list_handler,
        routes::modules::module_get_handler,
        routes::modules::module_create_handler,
        routes::modules::module_update_handler,
        routes::modules::module_delete_handler,
        routes::modules::module_attach_topic_handler,
        routes::modules::module_detach_topic_handler,
        routes::topics::topic_get_handler,
        routes::topics::topic_create_handler,
        routes::topics::topic_update_handler,
        routes::topics::topic_delete_handler,
        routes::topics::topic_attach_resource_handler,
        routes::topics::topic_detach_resource_handler,
        routes::resources::resource_list_handler,
        routes::resources::resource_get_handler,
        routes::resources::resource_create_handler,
        routes::resources::resource_update_handler,
        routes::resources::resource_notification_handler,
        routes::progress::progress_mark_handler,
        routes::quiz::question_list_handler,
        routes::quiz::question_create_handler,
        routes::quiz::question_update_handler,
        routes::quiz::question_delete_handler,
        routes::quiz::paper_create_handler,
        routes::quiz::paper_get_handler,
        routes::quiz::paper_delete_handler,
        routes::quiz::paper_attach_question_handler,
        routes::quiz::paper_detach_question_handler,
        routes::quiz::assignment_list_handler,
        routes::quiz::assignment_create_handler,
        routes::quiz::assignment_get_handler,
        routes::quiz::assignment_update_handler,
        routes::quiz::assignment_delete_handler,
        routes::quiz::attempt_get_handler,
        routes::quiz::attempt_start_handler,
        routes::quiz::attempt_answer_handler,
        routes::quiz::attempt_submit_handler,
        routes::payments::order_create_handler,
        routes::payments::webhook_handler,
        routes::assistant::chat_handler,
    ),
    tags(
        (name = "account", description = "Signup, sessions and password recovery"),
        (name = "learners", description = "Learner profile photo and enrollments"),
        (name = "enrollments", description = "Program enrollment"),
        (name = "programs", description = "Program catalog and outlines"),
        (name = "modules", description = "Modules and their topics"),
        (name = "topics", description = "Topics and their resources"),
        (name = "resources", description = "Learning material hosted on the media CDN"),
        (name = "progress", description = "Completion markers"),
        (name = "quiz", description = "Question pool, papers, assignments and attempts"),
        (name = "payments", description = "Gateway orders and webhook"),
        (name = "assistant", description = "AI course finder"),
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_router_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/account/signup",
            "/api/v1/programs/{id}/progress",
            "/api/v1/quiz/assignments/{id}/submit",
            "/api/v1/payments/webhook",
            "/api/v1/assistant/chat",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("cookie"));
    }
}
