//! Rate limiter rejections use the JSON error envelope.

use aizome_integration_tests::{body_json, json_request, test_app};
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_auth_burst_is_limited_with_envelope() {
    let app = test_app();
    // Invalid emails fail validation before any platform call.
    let body = json!({"email": "not-an-email", "password": "long enough"});

    let mut limited = None;
    for _ in 0..8 {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/login", &body, None))
            .await
            .expect("router is infallible");
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = Some(response);
            break;
        }
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = limited.expect("burst of 5 is exceeded within 8 requests");
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers()["content-type"], "application/json");

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too many requests, please retry later");
}
