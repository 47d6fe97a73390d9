mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_program_action, id_of, setup_server, setup_test_db, signin_admin_action,
    signup_action,
};

#[tokio::test]
async fn route_enrollment_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_program_action("Rust 101", "Programming", 0.0).with_save_as("program"))
        .step(
            signup_action("learner@example.com", "secret")
                .with_clear_cookies(true)
                .with_save_as("learner"),
        )
        .step(
            Action::new("check_before", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/enrollments/check?program_id={}", id_of(ctx, "program"))
                })
                .assert_body(|body| assert_eq!(body, r#"{"enrolled":false}"#)),
        )
        .step(
            Action::new("enroll", "POST", "/api/v1/enrollments")
                .with_dyn_body(|ctx| json!({ "program_id": id_of(ctx, "program") }))
                .with_expect(StatusCode::CREATED),
        )
        // one enrollment per learner and program
        .step(
            Action::new("enroll_again", "POST", "/api/v1/enrollments")
                .with_dyn_body(|ctx| json!({ "program_id": id_of(ctx, "program") }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("check_after", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/enrollments/check?program_id={}", id_of(ctx, "program"))
                })
                .assert_body(|body| assert_eq!(body, r#"{"enrolled":true}"#)),
        )
        .step(
            Action::new("my_programs", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/learners/{}/enrollments", id_of(ctx, "learner")))
                .assert_body(|body| {
                    let programs: Vec<Value> = serde_json::from_str(body).unwrap();
                    assert_eq!(programs.len(), 1);
                    assert_eq!(programs[0]["title"], "Rust 101");
                }),
        )
        .step(
            Action::new("me", "GET", "/api/v1/account/me").assert_body(|body| {
                let me: Value = serde_json::from_str(body).unwrap();
                assert_eq!(me["enrolled_course_ids"].as_object().unwrap().len(), 1);
            }),
        )
        .step(
            Action::new("unenroll", "DELETE", "dynamic").with_dyn_path(|ctx| {
                format!(
                    "/api/v1/learners/{}/enrollments/{}",
                    id_of(ctx, "learner"),
                    id_of(ctx, "program")
                )
            }),
        )
        .step(
            Action::new("unenroll_again", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/learners/{}/enrollments/{}",
                        id_of(ctx, "learner"),
                        id_of(ctx, "program")
                    )
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_enroll_someone_else_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_program_action("Rust 101", "Programming", 0.0).with_save_as("program"))
        .step(
            signup_action("first@example.com", "secret")
                .with_save_cookies(false)
                .with_save_as("first"),
        )
        .step(signup_action("second@example.com", "secret").with_clear_cookies(true))
        .step(
            Action::new("enroll_other", "POST", "/api/v1/enrollments")
                .with_dyn_body(|ctx| {
                    json!({ "program_id": id_of(ctx, "program"), "learner_id": id_of(ctx, "first") })
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("enroll_missing_program", "POST", "/api/v1/enrollments")
                .with_body(json!({ "program_id": uuid::Uuid::new_v4() }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}
