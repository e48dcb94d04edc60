//! API Integration Tests
//!
//! Every test drives the full router against a fresh in-memory store.
//!
//! Author: hephaex@gmail.com

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bookshelf_api::auth::{Identity, TokenClass};
use bookshelf_api::{create_router, create_router_for_testing, testing_state};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn register(app: &Router, email: &str, password: &str, name: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": email, "password": password, "name": name })),
        ),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/users/_login",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await
}

/// Register Ann and log in, returning the login payload
async fn ann_session(app: &Router) -> Value {
    let (status, _) = register(app, "a@x.com", "secret123", "Ann").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(app, "a@x.com", "secret123").await;
    assert_eq!(status, StatusCode::OK);

    body["data"].clone()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/ready", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["store"], "memory");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request("GET", "/api-docs/openapi.json", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/users/_login"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
}

// =============================================================================
// Registration and Login Tests
// =============================================================================

#[tokio::test]
async fn test_register_returns_public_profile() {
    let app = create_router_for_testing();

    let (status, json) = register(&app, "a@x.com", "secret123", "Ann").await;

    assert_eq!(status, StatusCode::OK);
    let user = &json["data"];
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["name"], "Ann");
    assert!(user["id"].is_string());
    assert!(user["created_at"].is_i64());
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
    assert!(user.get("token").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = create_router_for_testing();

    let (first, _) = register(&app, "a@x.com", "secret123", "Ann").await;
    let (second, json) = register(&app, "a@x.com", "other-password", "Impostor").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    // Original credentials still work, the impostor's do not
    let (status, body) = login(&app, "a@x.com", "secret123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["name"], "Ann");

    let (status, _) = login(&app, "a@x.com", "other-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let app = create_router_for_testing();
    let long_name = "n".repeat(101);

    let (status, _) = register(&app, "a@x.com", "", "Ann").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = register(&app, "a@x.com", "secret123", &long_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = register(&app, "not-an-email", "secret123", "Ann").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_identical() {
    let app = create_router_for_testing();
    register(&app, "a@x.com", "secret123", "Ann").await;

    let wrong_password = login(&app, "a@x.com", "wrong").await;
    let unknown_email = login(&app, "nobody@x.com", "secret123").await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_login_returns_pair() {
    let state = testing_state();
    let app = create_router(state.clone());

    let session = ann_session(&app).await;
    let access_token = session["access_token"].as_str().unwrap();
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let access = state
        .auth
        .tokens()
        .verify(access_token, TokenClass::Access)
        .unwrap();
    let refresh = state
        .auth
        .tokens()
        .verify(refresh_token, TokenClass::Refresh)
        .unwrap();

    assert_eq!(session["expires_in"], json!(access.exp));
    assert_eq!(session["user"]["id"], json!(access.user.id));
    assert_eq!(refresh.user, access.user);
}

// =============================================================================
// Gate Tests
// =============================================================================

#[tokio::test]
async fn test_current_user_with_access_token() {
    let app = create_router_for_testing();
    let session = ann_session(&app).await;
    let bearer = format!("Bearer {}", session["access_token"].as_str().unwrap());

    let (status, json) = send(
        &app,
        create_json_request("GET", "/api/users/_current", Some(&bearer), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["email"], "a@x.com");
}

#[tokio::test]
async fn test_access_gate_rejections_are_uniform() {
    let app = create_router_for_testing();
    let session = ann_session(&app).await;
    let access_token = session["access_token"].as_str().unwrap();
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let attempts = [
        None,
        Some(format!("Token {access_token}")),
        Some(format!("Refresh {access_token}")),
        Some(format!("Bearer {refresh_token}")),
        Some(format!("Bearer {access_token}x")),
        Some("Bearer not.a.jwt".to_string()),
    ];

    let mut bodies = Vec::new();
    for authorization in &attempts {
        let (status, json) = send(
            &app,
            create_json_request("GET", "/api/books", authorization.as_deref(), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
        bodies.push(json);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_access_gate_rejects_unknown_identity() {
    let state = testing_state();
    let app = create_router(state.clone());

    let ghost = Identity {
        id: "00000000-0000-0000-0000-000000000000".to_string(),
        email: "ghost@x.com".to_string(),
        name: "Ghost".to_string(),
    };
    let pair = state.auth.tokens().issue_pair(&ghost).unwrap();

    let (status, _) = send(
        &app,
        create_json_request(
            "GET",
            "/api/books",
            Some(&format!("Bearer {}", pair.access_token)),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The refresh gate trusts the decoded claims by default
    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/users/_refresh",
            Some(&format!("Refresh {}", pair.refresh_token)),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_issues_fresh_pair() {
    let app = create_router_for_testing();
    let session = ann_session(&app).await;
    let refresh = format!("Refresh {}", session["refresh_token"].as_str().unwrap());

    let (status, json) = send(
        &app,
        create_json_request("POST", "/api/users/_refresh", Some(&refresh), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let renewed = &json["data"];
    assert_ne!(renewed["access_token"], session["access_token"]);
    assert_ne!(renewed["refresh_token"], session["refresh_token"]);
    assert!(renewed["expires_in"].is_i64());

    // The new access token opens protected routes
    let bearer = format!("Bearer {}", renewed["access_token"].as_str().unwrap());
    let (status, _) = send(
        &app,
        create_json_request("GET", "/api/books", Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = create_router_for_testing();
    let session = ann_session(&app).await;
    let access_token = session["access_token"].as_str().unwrap();

    for authorization in [
        format!("Refresh {access_token}"),
        format!("Bearer {access_token}"),
    ] {
        let (status, _) = send(
            &app,
            create_json_request("POST", "/api/users/_refresh", Some(&authorization), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// =============================================================================
// Book Tests
// =============================================================================

#[tokio::test]
async fn test_create_and_list_books() {
    let app = create_router_for_testing();
    let session = ann_session(&app).await;
    let bearer = format!("Bearer {}", session["access_token"].as_str().unwrap());

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/books",
            Some(&bearer),
            Some(json!({ "title": "Dune", "author_id": "frank-herbert" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let book = json["data"].clone();
    assert_eq!(book["title"], "Dune");
    assert!(book["id"].is_string());

    let (status, json) = send(
        &app,
        create_json_request("GET", "/api/books", Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([book]));
}

#[tokio::test]
async fn test_create_book_validation() {
    let app = create_router_for_testing();
    let session = ann_session(&app).await;
    let bearer = format!("Bearer {}", session["access_token"].as_str().unwrap());

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/books",
            Some(&bearer),
            Some(json!({ "title": "", "author_id": "frank-herbert" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_books_require_authentication() {
    let app = create_router_for_testing();

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/books",
            None,
            Some(json!({ "title": "Dune", "author_id": "frank-herbert" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
