//! Upload validation and persistence tests.

use axum::http::StatusCode;

use imgvault_api::uploads::{MAX_BATCH_FILES, MAX_FILE_SIZE};

use super::test_utils::{FilePart, json, multipart_request, png_bytes, seed_user, send, test_app};

// =============================================================================
// Single upload
// =============================================================================

#[tokio::test]
async fn test_single_upload_is_owned_by_caller() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[FilePart::new("file", "cat.png", "image/png", png_bytes(4096))],
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["filename"], "cat.png");

    let images = state.db.get_images(&alice.to_string()).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, body["id"].as_str().unwrap());
    assert_eq!(images[0].content_type, "image/png");
    assert_eq!(images[0].data, png_bytes(4096));

    let owned = state.db.get_owned_upload_ids(&alice.to_string()).unwrap();
    assert_eq!(owned, vec![images[0].id.clone()]);
}

#[tokio::test]
async fn test_pdf_is_rejected() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[FilePart::new("file", "doc.pdf", "application/pdf", b"%PDF-1.7".to_vec())],
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid file type");
    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 0);
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[FilePart::new("file", "huge.png", "image/png", png_bytes(MAX_FILE_SIZE + 1))],
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "File too large");
    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 0);
}

#[tokio::test]
async fn test_file_at_size_limit_is_accepted() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[FilePart::new("file", "edge.gif", "image/gif", png_bytes(MAX_FILE_SIZE))],
    );
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 1);
}

#[tokio::test]
async fn test_missing_file_is_bad_request() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "alice");

    let (status, body) = send(&app, multipart_request("/upload/single", Some(&token), &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "No file uploaded.");

    // A part under another field name is not the file.
    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[FilePart::new("photo", "cat.png", "image/png", png_bytes(16))],
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_file_part_is_rejected() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let request = multipart_request(
        "/upload/single",
        Some(&token),
        &[
            FilePart::new("file", "one.png", "image/png", png_bytes(16)),
            FilePart::new("file", "two.png", "image/png", png_bytes(16)),
        ],
    );
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 0);
}

// =============================================================================
// Batch upload
// =============================================================================

#[tokio::test]
async fn test_batch_upload_stores_every_file() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let parts: Vec<FilePart> = ["a.png", "b.jpg", "c.gif"]
        .iter()
        .zip(["image/png", "image/jpeg", "image/gif"])
        .map(|(name, mime)| FilePart::new("files", name, mime, png_bytes(256)))
        .collect();

    let (status, body) = send(&app, multipart_request("/upload/multiple", Some(&token), &parts)).await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["uploaded"], 3);
    assert_eq!(body["failed"].as_array().unwrap().len(), 0);

    let mut names: Vec<String> = state
        .db
        .get_images(&alice.to_string())
        .unwrap()
        .into_iter()
        .map(|row| row.filename)
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.png", "b.jpg", "c.gif"]);
    assert_eq!(state.db.get_owned_upload_ids(&alice.to_string()).unwrap().len(), 3);
}

#[tokio::test]
async fn test_batch_store_failures_are_reported_per_file() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    // Every insert now fails after the image row, inside its transaction.
    state
        .db
        .with_conn(|conn| {
            conn.execute_batch("DROP TABLE user_uploads")?;
            Ok(())
        })
        .unwrap();

    let parts = vec![
        FilePart::new("files", "a.png", "image/png", png_bytes(64)),
        FilePart::new("files", "b.png", "image/png", png_bytes(64)),
    ];
    let (status, body) = send(&app, multipart_request("/upload/multiple", Some(&token), &parts)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let body = json(&body);
    assert_eq!(body["uploaded"], 0);

    let failed = body["failed"].as_array().unwrap();
    let mut names: Vec<&str> = failed.iter().map(|f| f["filename"].as_str().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["a.png", "b.png"]);
    assert!(failed.iter().all(|f| f["reason"].as_str().is_some_and(|r| !r.is_empty())));

    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 0);
}

#[tokio::test]
async fn test_batch_with_one_bad_file_stores_nothing() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let parts = vec![
        FilePart::new("files", "ok.png", "image/png", png_bytes(64)),
        FilePart::new("files", "bad.txt", "text/plain", b"hello".to_vec()),
    ];
    let (status, _) = send(&app, multipart_request("/upload/multiple", Some(&token), &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 0);
}

#[tokio::test]
async fn test_batch_limit_is_enforced() {
    let (app, state) = test_app();
    let (alice, token) = seed_user(&state, "alice");

    let parts: Vec<FilePart> = (0..=MAX_BATCH_FILES)
        .map(|i| FilePart::new("files", &format!("{i}.png"), "image/png", png_bytes(16)))
        .collect();
    let (status, _) = send(&app, multipart_request("/upload/multiple", Some(&token), &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.db.count_images(&alice.to_string()).unwrap(), 0);
}

#[tokio::test]
async fn test_batch_without_files_is_bad_request() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "alice");

    let (status, body) = send(&app, multipart_request("/upload/multiple", Some(&token), &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "No files uploaded.");
}
