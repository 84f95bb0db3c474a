//! End-to-end walk through register, login, upload and fetch.

use axum::http::StatusCode;
use serde_json::json;

use super::test_utils::{FilePart, get, json, json_request, multipart_request, png_bytes, send, test_app};

#[tokio::test]
async fn test_register_login_upload_fetch() {
    let (app, _state) = test_app();

    let (status, _) = send(
        &app,
        json_request("/register", json!({ "username": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        json_request("/login", json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        json_request("/login", json!({ "username": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = json(&body)["token"].as_str().unwrap().to_string();

    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[FilePart::new("file", "holiday.png", "image/png", png_bytes(2 * 1024 * 1024))],
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/fetch", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["filename"], "holiday.png");
}
