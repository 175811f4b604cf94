//! Liveness and readiness endpoints.

use aizome_integration_tests::{request, send};
use axum::body::Body;
use axum::http::StatusCode;

#[tokio::test]
async fn test_liveness_is_ok_without_database() {
    let response = send(request("GET", "/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let response = send(request("GET", "/health/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
