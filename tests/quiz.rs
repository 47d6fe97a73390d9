mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    ADMIN_EMAIL, ADMIN_PASSWORD, Action, Flow, id_of, setup_server, setup_test_db,
    signin_admin_action, signup_action,
};

/// Admin builds a paper worth 10 points (radio 7 + text 3) and publishes it.
fn publish_quiz(flow: Flow) -> Flow {
    flow.step(signin_admin_action())
        .step(
            Action::new("question_radio", "POST", "/api/v1/quiz/questions")
                .with_body(json!({
                    "question_text": "2 + 2?",
                    "question_type": "radio",
                    "options": ["3", "4"],
                    "correct_answer": "4",
                    "points": 7,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("radio"),
        )
        .step(
            Action::new("question_text", "POST", "/api/v1/quiz/questions")
                .with_body(json!({
                    "question_text": "Capital of France?",
                    "question_type": "text",
                    "correct_answer": "Paris",
                    "points": 3,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("text"),
        )
        .step(
            Action::new("paper", "POST", "/api/v1/quiz/papers")
                .with_body(json!({ "title": "Warmup" }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("paper"),
        )
        .step(
            Action::new("attach_radio", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quiz/papers/{}/questions", id_of(ctx, "paper")))
                .with_dyn_body(|ctx| json!({ "id": id_of(ctx, "radio"), "position": 1 }))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("attach_text", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quiz/papers/{}/questions", id_of(ctx, "paper")))
                .with_dyn_body(|ctx| json!({ "id": id_of(ctx, "text"), "position": 2 }))
                .assert_body(|body| {
                    let paper: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(paper["questions"].as_array().unwrap().len(), 2);
                })
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("assignment", "POST", "/api/v1/quiz/assignments")
                .with_dyn_body(|ctx| {
                    json!({
                        "question_paper_id": id_of(ctx, "paper"),
                        "title": "Warmup quiz",
                        "rules": { "settings": { "time_limit_seconds": 600 } },
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("assignment"),
        )
}

fn assignment_path(ctx: &common::FlowContext, tail: &str) -> String {
    format!("/api/v1/quiz/assignments/{}{tail}", id_of(ctx, "assignment"))
}

#[tokio::test]
async fn route_quiz_pass_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    publish_quiz(Flow::new())
        .step(signup_action("learner@example.com", "secret").with_clear_cookies(true))
        .step(
            Action::new("assignment_view", "GET", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, ""))
                .assert_body(|body| {
                    assert!(!body.contains("correct_answer"));
                    assert!(body.contains("2 + 2?"));
                }),
        )
        .step(
            Action::new("no_attempt_yet", "GET", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/attempt"))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("start", "POST", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/attempt"))
                .assert_body(|body| {
                    let attempt: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(attempt["status"], "in_progress");
                })
                .with_expect(StatusCode::CREATED),
        )
        // a single attempt per learner
        .step(
            Action::new("start_again", "POST", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/attempt"))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("answer_radio", "PUT", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/answers"))
                .with_dyn_body(|ctx| json!({ "question_id": id_of(ctx, "radio"), "answer": "4" }))
                .assert_body(|body| {
                    let attempt: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(attempt["attempt"]["score"], 0.7);
                }),
        )
        .step(
            Action::new("answer_text", "PUT", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/answers"))
                .with_dyn_body(|ctx| json!({ "question_id": id_of(ctx, "text"), "answer": "London" })),
        )
        .step(
            Action::new("answer_unknown", "PUT", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/answers"))
                .with_dyn_body(|_| json!({ "question_id": uuid::Uuid::new_v4(), "answer": "x" }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/submit"))
                .assert_body(|body| {
                    let result: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(result["score"]["earned_points"], 7);
                    assert_eq!(result["score"]["total_points"], 10);
                    assert_eq!(result["score"]["passed"], true);
                    assert_eq!(result["status"], "passed");
                    assert_eq!(result["grades"].as_array().unwrap().len(), 2);
                }),
        )
        .step(
            Action::new("submit_again", "POST", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/submit"))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("answer_after_submit", "PUT", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/answers"))
                .with_dyn_body(|ctx| json!({ "question_id": id_of(ctx, "text"), "answer": "Paris" }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("me", "GET", "/api/v1/account/me").assert_body(|body| {
                let me: Value = serde_json::from_str(body).unwrap();
                let completed = me["completed_quizzes"].as_object().unwrap();
                assert_eq!(completed.values().next(), Some(&json!(0.7)));
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_fail_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    publish_quiz(Flow::new())
        .step(signup_action("learner@example.com", "secret").with_clear_cookies(true))
        .step(
            Action::new("start", "POST", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/attempt"))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("answer_text", "PUT", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/answers"))
                .with_dyn_body(|ctx| json!({ "question_id": id_of(ctx, "text"), "answer": " paris " })),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, "/submit"))
                .assert_body(|body| {
                    let result: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(result["score"]["earned_points"], 3);
                    assert_eq!(result["score"]["passed"], false);
                    assert_eq!(result["status"], "failed");
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_admin_only_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    publish_quiz(Flow::new())
        .step(
            Action::new("question_untyped", "POST", "/api/v1/quiz/questions")
                .with_body(json!({ "question_text": "No type" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("disable", "PUT", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, ""))
                .with_dyn_body(|ctx| {
                    json!({
                        "question_paper_id": id_of(ctx, "paper"),
                        "title": "Warmup quiz",
                        "enabled": false,
                    })
                }),
        )
        .step(signup_action("learner@example.com", "secret").with_clear_cookies(true))
        .step(
            Action::new("learner_creates_question", "POST", "/api/v1/quiz/questions")
                .with_body(json!({ "question_text": "Mine", "question_type": "text" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // disabled assignments are hidden from learners
        .step(
            Action::new("assignment_hidden", "GET", "dynamic")
                .with_dyn_path(|ctx| assignment_path(ctx, ""))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("assignment_list", "GET", "/api/v1/quiz/assignments").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 0);
            }),
        )
        .run(&mut server, pool)
        .await;
}

/// Plain server calls, the attempt clock is moved between steps.
async fn publish_timed_quiz(server: &axum_test::TestServer, time_limit: i64) -> (String, String) {
    server
        .post("/api/v1/account/signin")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .assert_status_ok();

    let question: Value = server
        .post("/api/v1/quiz/questions")
        .json(&json!({
            "question_text": "2 + 2?",
            "question_type": "radio",
            "options": ["3", "4"],
            "correct_answer": "4",
            "points": 1,
        }))
        .await
        .json();
    let question_id = question["id"].as_str().unwrap().to_string();

    let paper: Value = server
        .post("/api/v1/quiz/papers")
        .json(&json!({ "title": "Timed" }))
        .await
        .json();
    let paper_id = paper["id"].as_str().unwrap();
    server
        .post(&format!("/api/v1/quiz/papers/{paper_id}/questions"))
        .json(&json!({ "id": question_id, "position": 1 }))
        .await
        .assert_status(StatusCode::CREATED);

    let assignment: Value = server
        .post("/api/v1/quiz/assignments")
        .json(&json!({
            "question_paper_id": paper_id,
            "title": "Timed quiz",
            "rules": { "settings": { "time_limit_seconds": time_limit } },
        }))
        .await
        .json();
    let assignment_id = assignment["id"].as_str().unwrap().to_string();

    (assignment_id, question_id)
}

#[tokio::test]
async fn route_quiz_time_limit_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    let (assignment_id, question_id) = publish_timed_quiz(&server, 60).await;
    let base = format!("/api/v1/quiz/assignments/{assignment_id}");

    server
        .post("/api/v1/account/signup")
        .json(&json!({
            "first_name": "Sam",
            "last_name": "Slow",
            "email": "slow@example.com",
            "password": "secret",
        }))
        .await
        .assert_status_ok();
    server
        .post(&format!("{base}/attempt"))
        .await
        .assert_status(StatusCode::CREATED);

    pool.backdate_attempts(120).await;

    let late = server
        .put(&format!("{base}/answers"))
        .json(&json!({ "question_id": question_id, "answer": "4" }))
        .await;
    late.assert_status(StatusCode::CONFLICT);
    assert!(late.text().contains("time limit"));

    // submitting still closes the attempt with what was stored
    let submitted: Value = server.post(&format!("{base}/submit")).await.json();
    assert_eq!(submitted["score"]["earned_points"], 0);
    assert_eq!(submitted["score"]["passed"], false);
}

#[tokio::test]
async fn route_assignment_soft_delete_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    let (assignment_id, _) = publish_timed_quiz(&server, 600).await;
    let base = format!("/api/v1/quiz/assignments/{assignment_id}");

    server.get(&base).await.assert_status_ok();
    server.delete(&base).await.assert_status_ok();
    server.get(&base).await.assert_status(StatusCode::NOT_FOUND);
    server.delete(&base).await.assert_status(StatusCode::NOT_FOUND);

    let page: Value = server.get("/api/v1/quiz/assignments").await.json();
    assert_eq!(page["total"], 0);

    // nor can a learner start it
    server
        .post("/api/v1/account/signup")
        .json(&json!({
            "first_name": "Late",
            "last_name": "Comer",
            "email": "late@example.com",
            "password": "secret",
        }))
        .await
        .assert_status_ok();
    server
        .post(&format!("{base}/attempt"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
