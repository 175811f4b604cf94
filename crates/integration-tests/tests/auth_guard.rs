//! Protected endpoints turn away callers without a usable token before
//! anything reaches the store.

use aizome_integration_tests::{body_json, json_request, mint_token, request, send};
use axum::body::Body;
use axum::http::{StatusCode, header};
use serde_json::json;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    for (method, uri) in [
        ("GET", "/api/cart"),
        ("GET", "/api/orders"),
        ("GET", "/api/wallet"),
        ("GET", "/api/game/works"),
        ("GET", "/api/items/inventory"),
        ("GET", "/api/tasks"),
        ("GET", "/api/files"),
        ("DELETE", "/api/comments/6f9619ff-8b86-d011-b42d-00c04fc964ff"),
    ] {
        let response = send(request(method, uri).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Authentication required");
    }
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let token = mint_token(uuid::Uuid::new_v4(), -3600);
    let response = send(
        request("GET", "/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Session expired, please sign in again");
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    for value in ["Bearer not-a-token", "Bearer a.b.c", "Basic dXNlcjpwYXNz"] {
        let response = send(
            request("GET", "/api/auth/me")
                .header(header::AUTHORIZATION, value)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
    }
}

#[tokio::test]
async fn test_foreign_signature_is_unauthorized() {
    let token = mint_token(uuid::Uuid::new_v4(), 600);
    let (head, _) = token.rsplit_once('.').unwrap();
    let forged = format!("{head}.c2lnbmF0dXJlLWZyb20tc29tZW9uZS1lbHNl");

    let response = send(json_request(
        "POST",
        "/api/listings/create",
        &json!({"work_id": uuid::Uuid::new_v4(), "price": 100}),
        Some(&forged),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
