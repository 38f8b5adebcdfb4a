mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use std::sync::Arc;
use std::time::Duration;

use common::{auth_query, body_text, get, make_server, test_config, FakeDb, FakeFs};
use mpdsonic::server::Server;

fn app() -> axum::Router {
    make_server(FakeDb::default(), FakeFs::default()).router()
}

fn connection_header(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get("connection")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// ── Method check ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn disallowed_method_returns_405() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/rest/ping.view?{}", auth_query()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn disallowed_method_skips_credential_parsing() {
    // No parameters at all: a parsed request would be a missing-parameter error.
    let response = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/rest/ping.view")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let text = body_text(response).await;
    assert_eq!(text, "method not allowed");
}

#[tokio::test]
async fn post_is_allowed() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/rest/ping.view?{}", auth_query()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains(r#"status="ok""#), "Expected ok response:\n{text}");
}

// ── Connection: close ─────────────────────────────────────────────────────────

#[tokio::test]
async fn success_response_closes_connection() {
    let response = app()
        .oneshot(get(&format!("/rest/ping.view?{}", auth_query())))
        .await
        .unwrap();
    assert_eq!(connection_header(&response), "close");
}

#[tokio::test]
async fn method_not_allowed_closes_connection() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/rest/ping.view?{}", auth_query()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(connection_header(&response), "close");
}

#[tokio::test]
async fn rejected_response_closes_connection() {
    let response = app().oneshot(get("/rest/ping.view")).await.unwrap();
    assert_eq!(connection_header(&response), "close");
}

// ── Missing parameters ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_parameters_return_200_with_error_10() {
    for query in [
        "p=sesame&c=test&v=1.13.0",
        "u=joe&p=sesame&v=1.13.0",
        "u=joe&p=sesame&c=test",
        "u=joe&c=test&v=1.13.0",
        "u=joe&c=test&v=1.13.0&t=abc",
    ] {
        let response = app()
            .oneshot(get(&format!("/rest/ping.view?{query}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "query: {query}");
        let text = body_text(response).await;
        assert!(text.contains(r#"status="failed""#), "query {query}:\n{text}");
        assert!(text.contains(r#"code="10""#), "query {query}:\n{text}");
    }
}

// ── Authentication ────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_password_returns_200_with_error_40() {
    let response = app()
        .oneshot(get("/rest/ping.view?u=joe&p=wrong&c=test&v=1.13.0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains(r#"code="40""#), "Expected unauthorized error:\n{text}");
}

#[tokio::test]
async fn wrong_user_returns_error_40() {
    let response = app()
        .oneshot(get("/rest/ping.view?u=bob&p=sesame&c=test&v=1.13.0"))
        .await
        .unwrap();
    let text = body_text(response).await;
    assert!(text.contains(r#"code="40""#), "Expected unauthorized error:\n{text}");
}

#[tokio::test]
async fn encoded_password_authenticates() {
    let response = app()
        .oneshot(get("/rest/ping.view?u=joe&p=enc:736573616d65&c=test&v=1.13.0"))
        .await
        .unwrap();
    let text = body_text(response).await;
    assert!(text.contains(r#"status="ok""#), "Expected ok response:\n{text}");
}

#[tokio::test]
async fn token_and_salt_authenticate() {
    let response = app()
        .oneshot(get(
            "/rest/ping.view?u=joe&t=26719a1196d2a940705a59634eb18eab&s=c19b2d&c=test&v=1.13.0",
        ))
        .await
        .unwrap();
    let text = body_text(response).await;
    assert!(text.contains(r#"status="ok""#), "Expected ok response:\n{text}");
}

#[tokio::test]
async fn wrong_token_returns_error_40() {
    let response = app()
        .oneshot(get(
            "/rest/ping.view?u=joe&t=00000000000000000000000000000000&s=c19b2d&c=test&v=1.13.0",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains(r#"code="40""#), "Expected unauthorized error:\n{text}");
}

#[tokio::test]
async fn error_bodies_are_distinguishable() {
    let missing = body_text(app().oneshot(get("/rest/ping.view")).await.unwrap()).await;
    let unauthorized = body_text(
        app()
            .oneshot(get("/rest/ping.view?u=joe&p=wrong&c=test&v=1.13.0"))
            .await
            .unwrap(),
    )
    .await;
    assert_ne!(missing, unauthorized);
}

#[tokio::test]
async fn non_utf8_encoded_password_is_checked_not_skipped() {
    // Valid hex that is not UTF-8 is still a password; the token is ignored.
    let response = app()
        .oneshot(get(
            "/rest/ping.view?u=joe&p=enc:ff&t=26719a1196d2a940705a59634eb18eab&s=c19b2d&c=test&v=1.13.0",
        ))
        .await
        .unwrap();
    let text = body_text(response).await;
    assert!(text.contains(r#"code="40""#), "Expected unauthorized error:\n{text}");

    let response = app()
        .oneshot(get("/rest/ping.view?u=joe&p=enc:ff&c=test&v=1.13.0"))
        .await
        .unwrap();
    let text = body_text(response).await;
    assert!(text.contains(r#"code="40""#), "Expected unauthorized error:\n{text}");
}

#[tokio::test]
async fn repeated_parameter_uses_first_value() {
    let response = app()
        .oneshot(get("/rest/ping.view?u=joe&u=bob&p=sesame&p=wrong&c=test&v=1.13.0"))
        .await
        .unwrap();
    let text = body_text(response).await;
    assert!(text.contains(r#"status="ok""#), "Expected ok response:\n{text}");
}

#[tokio::test]
async fn verbose_gate_still_authenticates() {
    let config = mpdsonic::config::Config {
        verbose: true,
        ..test_config(Duration::ZERO)
    };
    let server = Server::new(
        Arc::new(FakeDb::default()),
        Arc::new(FakeFs::default()),
        config,
    );

    let ok = server
        .router()
        .oneshot(get(&format!("/rest/ping.view?{}", auth_query())))
        .await
        .unwrap();
    assert_eq!(connection_header(&ok), "close");
    assert!(body_text(ok).await.contains(r#"status="ok""#));

    let rejected = server
        .router()
        .oneshot(get("/rest/ping.view?u=joe&p=wrong&c=test&v=1.13.0"))
        .await
        .unwrap();
    assert!(body_text(rejected).await.contains(r#"code="40""#));
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_path_after_auth_returns_404() {
    let response = app()
        .oneshot(get(&format!("/rest/nope.view?{}", auth_query())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_path_without_auth_is_rejected_first() {
    let response = app().oneshot(get("/rest/nope.view")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains(r#"code="10""#), "Expected missing-parameter error:\n{text}");
}
