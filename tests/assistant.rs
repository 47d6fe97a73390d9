mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_program_action, setup_server, setup_test_db, signin_admin_action,
};

#[tokio::test]
async fn route_chat_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_program_action("Rust 101", "Programming", 10.0))
        .step(create_program_action("Watercolor", "Art", 10.0))
        .step(
            Action::new("chat_empty", "POST", "/api/v1/assistant/chat")
                .with_clear_cookies(true)
                .with_body(json!({ "message": "   " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("chat_categories", "POST", "/api/v1/assistant/chat")
                .with_body(json!({ "message": "which categories exist?" }))
                .assert_body(|body| {
                    let reply: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(reply["success"], true);
                    assert_eq!(reply["ai_understanding"]["category"], "all");
                    assert_eq!(reply["results"], json!(["Art", "Programming"]));
                }),
        )
        .step(
            Action::new("chat_course", "POST", "/api/v1/assistant/chat")
                .with_body(json!({ "message": "rust" }))
                .assert_body(|body| {
                    let reply: Value = serde_json::from_str(body).unwrap();
                    let results = reply["results"].as_array().unwrap();
                    assert_eq!(results.len(), 1);
                    assert_eq!(results[0]["title"], "Rust 101");
                }),
        )
        .step(
            Action::new("chat_no_match", "POST", "/api/v1/assistant/chat")
                .with_body(json!({ "message": "hello there" }))
                .assert_body(|body| {
                    let reply: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(reply["success"], true);
                    assert_eq!(reply["results"], json!([]));
                }),
        )
        // category is used even when a course name came along
        .step(
            Action::new("chat_category_first", "POST", "/api/v1/assistant/chat")
                .with_body(json!({ "message": "category:art Rust" }))
                .assert_body(|body| {
                    let reply: Value = serde_json::from_str(body).unwrap();
                    let results = reply["results"].as_array().unwrap();
                    assert_eq!(results.len(), 1);
                    assert_eq!(results[0]["title"], "Watercolor");
                }),
        )
        .run(&mut server, pool)
        .await;
}
