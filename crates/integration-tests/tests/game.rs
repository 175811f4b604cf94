//! Score preview runs entirely in memory.

use aizome_integration_tests::{body_json, json_request, send};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_score_preview_returns_card() {
    let layers = json!({"layers": [
        {"technique": "itajime", "dip_count": 4, "oxidation_secs": 90, "coverage": 70},
        {"technique": "kumo", "dip_count": 3, "oxidation_secs": 120, "coverage": 60}
    ]});
    let response = send(json_request("POST", "/api/game/score", &layers, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let card = &body["data"];
    let score = card["score"].as_i64().unwrap();
    assert!((0..=100).contains(&score));
    assert!(["S", "A", "B", "C", "D"].contains(&card["grade"].as_str().unwrap()));
    assert!(card["suggested_price"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_score_preview_rejects_empty_layers() {
    let response = send(json_request("POST", "/api/game/score", &json!({"layers": []}), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_score_preview_rejects_unknown_technique() {
    let layers = json!({"layers": [
        {"technique": "batik", "dip_count": 4, "oxidation_secs": 90, "coverage": 70}
    ]});
    let response = send(json_request("POST", "/api/game/score", &layers, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
