mod common;
use eduportal::model::entity::UserEntity;
use eduportal::web::middlewares::AUTH_TOKEN;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tower_cookies::cookie::SameSite;

use crate::common::{
    Action, Flow, id_of, setup_server, setup_test_db, signin_action, signin_admin_action,
    signup_action,
};

#[tokio::test]
async fn route_signup_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("ada@example.com", "lovelace")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.email(), "ada@example.com");
                    assert!(!body.contains("password"));
                    assert!(body.contains("\"role\":\"learner\""));
                })
                .with_expect(StatusCode::OK),
        )
        // same email twice
        .step(signup_action("ada@example.com", "other").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("signup_blank", "POST", "/api/v1/account/signup")
                .with_body(json!({
                    "first_name": "Ada",
                    "last_name": " ",
                    "email": "blank@example.com",
                    "password": "x",
                }))
                .assert_body(|body| assert!(body.contains("last_name")))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_signin_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("signin@example.com", "secret").with_save_cookies(false))
        .step(
            signin_action("signin@example.com", "secret")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid JSON format");
                    assert_eq!(ent.email(), "signin@example.com");
                    assert!(ent.last_login().is_some());
                })
                .with_expect(StatusCode::OK)
                .with_clear_cookies(true),
        )
        // wrong credentials
        .step(
            signin_action("signin@example.com", "WRONGPASSWORD")
                .with_save_cookies(false)
                .with_clear_cookies(true)
                .assert_body(|body| {
                    assert!(body.contains("Authentication error"));
                })
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        // non-existing account
        .step(
            signin_action("nobody@example.com", "nvm")
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| assert!(body.contains("Authentication error"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_me_and_signout_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("me_anonymous", "GET", "/api/v1/account/me")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signup_action("me@example.com", "secret"))
        .step(
            Action::new("me", "GET", "/api/v1/account/me")
                .assert_body(|body| {
                    let me: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(me["user"]["email"], "me@example.com");
                    assert_eq!(me["enrolled_course_ids"], json!({}));
                    assert_eq!(me["completed_quizzes"], json!({}));
                }),
        )
        .step(Action::new("signout", "POST", "/api/v1/account/signout"))
        .step(
            Action::new("me_after_signout", "GET", "/api/v1/account/me")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_account_list_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("learner@example.com", "secret"))
        // learners can't list accounts
        .step(
            Action::new("account_list", "GET", "/api/v1/account/page")
                .with_param("limit", "5")
                .with_param("offset", "0")
                .assert_body(|body| assert!(body.contains("admin role required")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action())
        .step(
            Action::new("account_list", "GET", "/api/v1/account/page")
                .with_param("limit", "5")
                .with_param("offset", "0")
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 2);
                    assert_eq!(page["limit"], 5);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_account_update_test() {
    let pool = setup_test_db().await;
    pool.seed_admin().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("first@example.com", "secret")
                .with_save_cookies(false)
                .with_save_as("first"),
        )
        .step(signup_action("second@example.com", "secret").with_save_as("second"))
        // learners only touch their own account
        .step(
            Action::new("update_other", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}", id_of(ctx, "first")))
                .with_body(json!({
                    "first_name": "Mallory",
                    "last_name": "X",
                    "email": "mallory@example.com",
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("update_self", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}", id_of(ctx, "second")))
                .with_body(json!({
                    "first_name": "Second",
                    "last_name": "Learner",
                    "email": "renamed@example.com",
                }))
                .assert_body(|body| assert!(body.contains("renamed@example.com"))),
        )
        .step(
            Action::new("update_blank", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}", id_of(ctx, "second")))
                .with_body(json!({
                    "first_name": "Second",
                    "last_name": " ",
                    "email": "renamed@example.com",
                }))
                .assert_body(|body| assert!(body.contains("last_name")))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // email taken by someone else
        .step(
            Action::new("update_conflict", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}", id_of(ctx, "second")))
                .with_body(json!({
                    "first_name": "Second",
                    "last_name": "Learner",
                    "email": "first@example.com",
                }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(signin_admin_action())
        .step(
            Action::new("admin_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}", id_of(ctx, "first"))),
        )
        .step(
            signin_action("first@example.com", "secret")
                .with_save_cookies(false)
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_password_reset_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("reset@example.com", "secret").with_save_cookies(false))
        .step(
            Action::new("forgot_unknown", "POST", "/api/v1/account/forgot-password")
                .with_body(json!({ "email": "ghost@example.com" }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("forgot", "POST", "/api/v1/account/forgot-password")
                .with_body(json!({ "email": "reset@example.com" })),
        )
        .step(
            Action::new("reset_missing", "POST", "/api/v1/account/reset-password")
                .with_body(json!({ "token": "abc" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("reset_bogus", "POST", "/api/v1/account/reset-password")
                .with_body(json!({ "token": "not-a-token", "new_password": "next" }))
                .with_expect(StatusCode::CONFLICT),
        )
        // the old password keeps working
        .step(signin_action("reset@example.com", "secret").with_save_cookies(false))
        .run(&mut server, pool)
        .await;
}
