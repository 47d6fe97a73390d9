mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    ADMIN_EMAIL, ADMIN_PASSWORD, Action, Flow, build_outline, id_of, setup_server, setup_test_db,
    signup_action,
};

#[tokio::test]
async fn route_progress_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    build_outline(Flow::new())
        .step(signup_action("learner@example.com", "secret").with_clear_cookies(true))
        .step(
            Action::new("mark_nothing", "POST", "/api/v1/progress")
                .with_body(json!({}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("mark_topic", "POST", "/api/v1/progress")
                .with_dyn_body(|ctx| json!({ "topic_id": id_of(ctx, "topic_a") }))
                .assert_body(|body| {
                    let recorded: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(recorded["progress_type"], "topic");
                })
                .with_expect(StatusCode::CREATED),
        )
        // marking twice is harmless
        .step(
            Action::new("mark_topic_again", "POST", "/api/v1/progress")
                .with_dyn_body(|ctx| json!({ "topic_id": id_of(ctx, "topic_a") }))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("program_progress", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/programs/{}/progress", id_of(ctx, "program")))
                .assert_body(|body| {
                    let progress: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(progress["total_topics"], 2);
                    assert_eq!(progress["completed_topics"], 1);
                    assert_eq!(progress["percent_rounded"], 50);
                    assert_eq!(progress["completed"], false);
                }),
        )
        .step(
            Action::new("topic_flag", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/topics/{}", id_of(ctx, "topic_a")))
                .assert_body(|body| {
                    let topic: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(topic["completed"], true);
                }),
        )
        .step(
            Action::new("me", "GET", "/api/v1/account/me").assert_body(|body| {
                let me: Value = serde_json::from_str(body).unwrap();
                assert_eq!(me["completed_topics"].as_object().unwrap().len(), 1);
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_progress_marked_once_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    server
        .post("/api/v1/account/signin")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .assert_status_ok();
    let program: Value = server
        .post("/api/v1/programs")
        .json(&json!({ "title": "Rust 101", "category": "Programming", "price": 0.0 }))
        .await
        .json();
    let program_id = program["id"].as_str().unwrap();

    let mark = || {
        server
            .post("/api/v1/progress")
            .json(&json!({ "program_id": program_id }))
    };
    let first = mark().await;
    first.assert_status(StatusCode::CREATED);
    let second = mark().await;
    second.assert_status(StatusCode::CREATED);

    assert_eq!(first.json::<Value>()["id"], second.json::<Value>()["id"]);
}
