//! Headers every response carries.

use aizome_integration_tests::{request, send};
use axum::body::Body;
use axum::http::{StatusCode, header};

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let response = send(request("GET", "/health").body(Body::empty()).unwrap()).await;
    let headers = response.headers();

    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
    assert!(
        headers[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .starts_with("default-src 'none'")
    );
    assert!(!headers["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let response = send(
        request("GET", "/health")
            .header("x-request-id", "edge-42")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.headers()["x-request-id"], "edge-42");
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let response = send(
        request("OPTIONS", "/api/products")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = send(request("GET", "/api/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
