//! Web API Identity Tests
//!
//! Integration tests for registration, sessions and localized strings.

mod common;

use axum::http::StatusCode;
use common::{session_cookie, TestApp};
use postbox::web::session::SESSION_COOKIE;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_assigns_postal_code() {
    let app = TestApp::new().await;
    let (session, user) = app.register("Alice").await;

    assert!(!session.is_empty());
    assert_eq!(user["user"]["username"], "Alice");

    let code = user["user"]["postalCode"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.bytes().all(|b| b.is_ascii_digit()));

    assert_eq!(user["cooldowns"]["public"]["ready"], true);
    assert_eq!(user["cooldowns"]["private"]["ready"], true);
    assert_eq!(user["cooldowns"]["public"]["remainingHours"], 0);
    assert!(user["cooldowns"]["public"]["lastPost"].is_null());
}

#[tokio::test]
async fn test_register_trims_username() {
    let app = TestApp::new().await;
    let (_, user) = app.register("  Bob  ").await;
    assert_eq!(user["user"]["username"], "Bob");
}

#[tokio::test]
async fn test_register_is_idempotent_per_session() {
    let app = TestApp::new().await;
    let (session, first) = app.register("Alice").await;

    let response = app
        .server
        .post("/api/register")
        .add_cookie(session_cookie(&session))
        .json(&json!({ "username": "Someone Else" }))
        .await;
    response.assert_status_ok();

    let second = response.json::<Value>()["data"].clone();
    assert_eq!(second["user"]["postalCode"], first["user"]["postalCode"]);
    assert_eq!(second["user"]["username"], "Alice");
    assert_eq!(response.cookie(SESSION_COOKIE).value(), session);
    assert_eq!(app.state.office.identities().count().await, 1);
}

#[tokio::test]
async fn test_register_replaces_unknown_session_cookie() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/register")
        .add_cookie(session_cookie("a"))
        .json(&json!({ "username": "Victim" }))
        .await;
    response.assert_status_ok();

    let issued = response.cookie(SESSION_COOKIE).value().to_string();
    assert_ne!(issued, "a");

    app.server
        .get("/api/me")
        .add_cookie(session_cookie("a"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let me = app.get_as(&issued, "/api/me").await;
    assert_eq!(me["user"]["username"], "Victim");
}

#[tokio::test]
async fn test_sessions_get_distinct_codes() {
    let app = TestApp::new().await;
    let (session_a, a) = app.register("Alice").await;
    let (session_b, b) = app.register("Bob").await;

    assert_ne!(session_a, session_b);
    assert_ne!(a["user"]["postalCode"], b["user"]["postalCode"]);
}

#[tokio::test]
async fn test_register_rejects_invalid_username() {
    let app = TestApp::new().await;

    let too_long = "x".repeat(41);
    for username in ["", "   ", too_long.as_str()] {
        let response = app
            .server
            .post("/api/register")
            .json(&json!({ "username": username }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    assert_eq!(app.state.office.identities().count().await, 0);
}

#[tokio::test]
async fn test_register_rejects_malformed_json() {
    let app = TestApp::new().await;
    let response = app
        .server
        .post("/api/register")
        .text("{not json")
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_returns_session_user() {
    let app = TestApp::new().await;
    let (session, user) = app.register("Alice").await;

    let me = app.get_as(&session, "/api/me").await;
    assert_eq!(me["user"], user["user"]);
}

#[tokio::test]
async fn test_me_without_session() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/me").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_me_with_unknown_session_is_localized() {
    let app = TestApp::new().await;

    let en = app
        .server
        .get("/api/me")
        .add_cookie(session_cookie("nobody"))
        .await;
    en.assert_status(StatusCode::NOT_FOUND);

    let fa = app
        .server
        .get("/api/me")
        .add_query_param("lang", "fa")
        .add_cookie(session_cookie("nobody"))
        .await;
    fa.assert_status(StatusCode::NOT_FOUND);

    let en_message = en.json::<Value>()["error"]["message"].clone();
    let fa_message = fa.json::<Value>()["error"]["message"].clone();
    assert!(en_message.as_str().is_some_and(|m| !m.is_empty()));
    assert_ne!(en_message, fa_message);
}

#[tokio::test]
async fn test_get_locale() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/i18n/fa").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["data"]["locale"], "fa");
    assert_eq!(body["data"]["messages"]["compose.send"], "ارسال نامه");

    let response = app.server.get("/api/i18n/en").await;
    let body = response.json::<Value>();
    assert!(body["data"]["messages"]["reject.cooldown_active"]
        .as_str()
        .unwrap()
        .contains("{{hours}}"));
}

#[tokio::test]
async fn test_get_unknown_locale() {
    let app = TestApp::new().await;
    app.server
        .get("/api/i18n/xx")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
