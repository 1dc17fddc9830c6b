//! Sign-up / sign-in / sign-out flows through the full middleware chain.

mod common;

use std::sync::Arc;

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use auth_gateway::gate::LocalPolicyEngine;

use common::{empty, json_body, request, test_config, with_json, TestApp};

/// Auth-flow tests run with the gate disabled so they exercise the
/// handlers, not guest-tier budgets. Gate behavior has its own suite.
fn app() -> TestApp {
    let mut config = test_config();
    config.gate.enabled = false;
    let engine = Arc::new(LocalPolicyEngine::from_config(&config.gate).unwrap());
    TestApp::new(config, engine)
}

#[tokio::test]
async fn sign_up_creates_account_and_opens_a_session() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            json!({ "email": "new@example.com", "password": "a strong password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("sign-up must set a session cookie");
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], "new@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"].get("password_hash").is_none());

    // The issued token authenticates the profile endpoint.
    let token = body["token"].as_str().unwrap().to_string();
    let me = app
        .router
        .clone()
        .oneshot(empty(
            request("GET", "/api/v1/users/me", [203, 0, 113, 9])
                .header("authorization", format!("Bearer {token}")),
        ))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me = json_body(me).await;
    assert_eq!(me["email"], "new@example.com");
}

#[tokio::test]
async fn duplicate_sign_up_conflicts() {
    let app = app();
    let body = json!({ "email": "dup@example.com", "password": "a strong password" });

    let first = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = json_body(second).await;
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn malformed_sign_up_input_is_rejected() {
    let app = app();

    let bad_email = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            json!({ "email": "not-an-address", "password": "a strong password" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);

    let weak_password = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            json!({ "email": "ok@example.com", "password": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(weak_password.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_in_verifies_credentials() {
    let app = app();
    app.router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            json!({ "email": "member@example.com", "password": "a strong password" }),
        ))
        .await
        .unwrap();

    let ok = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-in", [203, 0, 113, 9]),
            json!({ "email": "member@example.com", "password": "a strong password" }),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(ok.headers().get(header::SET_COOKIE).is_some());

    let wrong_password = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-in", [203, 0, 113, 9]),
            json!({ "email": "member@example.com", "password": "not the password" }),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-in", [203, 0, 113, 9]),
            json!({ "email": "ghost@example.com", "password": "a strong password" }),
        ))
        .await
        .unwrap();

    // Unknown email and wrong password are indistinguishable.
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(wrong_password).await,
        json_body(unknown_email).await
    );
}

#[tokio::test]
async fn session_cookie_authenticates_requests() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9]),
            json!({ "email": "cookie@example.com", "password": "a strong password" }),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let token = body["token"].as_str().unwrap();

    let me = app
        .router
        .clone()
        .oneshot(empty(
            request("GET", "/api/v1/users/me", [203, 0, 113, 9])
                .header(header::COOKIE, format!("session={token}")),
        ))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn me_without_credentials_is_unauthorized() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(empty(request("GET", "/api/v1/users/me", [203, 0, 113, 9])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn sign_out_clears_the_session_cookie() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(empty(request("POST", "/api/v1/auth/sign-out", [203, 0, 113, 9])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn full_chain_with_gate_enabled_still_signs_up() {
    // End to end sanity: identity, gate (local engine) and handler all in
    // one pass.
    let config = test_config();
    let engine = Arc::new(LocalPolicyEngine::from_config(&config.gate).unwrap());
    let app = TestApp::new(config, engine);

    let response = app
        .router
        .clone()
        .oneshot(with_json(
            request("POST", "/api/v1/auth/sign-up", [203, 0, 113, 9])
                .header("user-agent", "Mozilla/5.0"),
            json!({ "email": "gated@example.com", "password": "a strong password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}
