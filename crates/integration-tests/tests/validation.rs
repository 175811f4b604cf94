//! Input validation that is decided before any store access.

use aizome_core::WorkId;
use aizome_integration_tests::{body_json, json_request, mint_token, send};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_listing_price_must_be_positive() {
    let token = mint_token(uuid::Uuid::new_v4(), 600);

    for price in [0, -1, 100_001] {
        let response = send(json_request(
            "POST",
            "/api/listings/create",
            &json!({"work_id": WorkId::generate(), "price": price}),
            Some(&token),
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "price {price}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "price must be between 1 and 100000");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let token = mint_token(uuid::Uuid::new_v4(), 600);
    let response = send(json_request(
        "POST",
        "/api/listings/create",
        &json!({"work_id": "not-a-uuid", "price": 10}),
        Some(&token),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_course_progress_out_of_range() {
    let token = mint_token(uuid::Uuid::new_v4(), 600);
    let response = send(json_request(
        "PUT",
        "/api/courses/6f9619ff-8b86-d011-b42d-00c04fc964ff/progress",
        &json!({"progress": 101}),
        Some(&token),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_body_is_required() {
    let token = mint_token(uuid::Uuid::new_v4(), 600);
    let response = send(json_request(
        "POST",
        "/api/courses/6f9619ff-8b86-d011-b42d-00c04fc964ff/comments",
        &json!({"body": "   "}),
        Some(&token),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
