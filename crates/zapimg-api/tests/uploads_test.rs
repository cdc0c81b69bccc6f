//! Upload API integration tests.
//!
//! Run with: `cargo test -p zapimg-api --test uploads_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{fixtures, setup_test_app, setup_test_app_with};

fn image_form(data: Vec<u8>, filename: &str, mime: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "image",
        Part::bytes(data).file_name(filename).mime_type(mime),
    )
}

#[tokio::test]
async fn test_upload_jpeg_succeeds() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/upload")
        .multipart(image_form(fixtures::jpeg_fixture(), "photo.JPG", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();

    let file_id = body["fileID"].as_str().expect("fileID present");
    assert_eq!(file_id.len(), 8);
    assert!(file_id
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

    let file_name = body["fileName"].as_str().expect("fileName present");
    assert_eq!(file_name, format!("{}.jpg", file_id));
    assert_eq!(body["route"], format!("/i/{}", file_name));
    assert_eq!(body["url"], format!("https://zapimg.io/i/{}", file_name));
    assert_eq!(
        body["imageUrl"],
        format!("https://i.zapimg.io/{}", file_name)
    );
    assert_eq!(body["message"], "Image uploaded successfully.");
    assert_eq!(body["lightningDestination"], "lnurl1testtip");
    assert_eq!(body["lightningPaymentLink"], "lightning:lnurl1testtip");

    // The stored object is the re-encoded JPEG
    let stored = app.stored_files();
    assert_eq!(stored, vec![file_name.to_string()]);
    let content = std::fs::read(app.storage_dir.path().join(file_name)).unwrap();
    assert_eq!(&content[0..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_upload_png_keeps_png_content_type() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/upload")
        .multipart(image_form(fixtures::png_fixture(), "pixel.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let file_name = body["fileName"].as_str().unwrap();
    assert!(file_name.ends_with(".png"));

    let content = std::fs::read(app.storage_dir.path().join(file_name)).unwrap();
    assert_eq!(&content[1..4], b"PNG");
}

#[tokio::test]
async fn test_third_upload_hits_quota() {
    let app = setup_test_app().await;

    for _ in 0..2 {
        let response = app
            .server
            .post("/upload")
            .multipart(image_form(fixtures::jpeg_fixture(), "photo.jpg", "image/jpeg"))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let response = app
        .server
        .post("/upload")
        .multipart(image_form(fixtures::jpeg_fixture(), "photo.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert!(body["message"].as_str().unwrap().contains("quota"));
    // Nothing extra was stored
    assert_eq!(app.stored_files().len(), 2);
}

#[tokio::test]
async fn test_upload_rejects_text_plain_before_storage() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/upload")
        .multipart(image_form(b"hello world".to_vec(), "note.txt", "text/plain"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(body["message"].as_str().unwrap().contains("jpeg"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_size_boundary() {
    let fixture = fixtures::jpeg_fixture();
    let limit = fixture.len();
    let app = setup_test_app_with(|config| {
        config.max_file_size_bytes = limit;
    })
    .await;

    // Exactly at the limit succeeds
    let response = app
        .server
        .post("/upload")
        .multipart(image_form(fixture.clone(), "photo.jpg", "image/jpeg"))
        .await;
    assert_eq!(response.status_code(), 200);

    // One byte over fails with a message naming the limit
    let mut oversized = fixture;
    oversized.push(0x00);
    let response = app
        .server
        .post("/upload")
        .multipart(image_form(oversized, "photo.jpg", "image/jpeg"))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("too large"));
    assert!(message.contains("MB"));
    assert_eq!(app.stored_files().len(), 1);
}

#[tokio::test]
async fn test_upload_missing_field_is_rejected() {
    let app = setup_test_app().await;

    let form = MultipartForm::new().add_part(
        "wrong_field",
        Part::bytes(fixtures::jpeg_fixture())
            .file_name("photo.jpg")
            .mime_type("image/jpeg"),
    );
    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["message"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_upload_filename_without_extension_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/upload")
        .multipart(image_form(fixtures::jpeg_fixture(), "photo", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_gifify_missing_video_is_rejected() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("crop", r#"{"x":0,"y":0,"width":1,"height":1}"#)
        .add_text("length", "3");
    let response = app.server.post("/upload/gifify").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["message"].as_str().unwrap().contains("video"));
}

#[tokio::test]
async fn test_gifify_invalid_crop_is_rejected() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part(
            "video",
            Part::bytes(vec![0u8; 128])
                .file_name("clip.mp4")
                .mime_type("video/mp4"),
        )
        .add_text("crop", r#"{"x":0.8,"y":0,"width":0.5,"height":1}"#)
        .add_text("length", "3");
    let response = app.server.post("/upload/gifify").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_gifify_denied_after_quota() {
    let app = setup_test_app_with(|config| {
        config.free_upload_quota = 0;
    })
    .await;

    // Gate denies before the body is even parsed
    let form = MultipartForm::new().add_text("length", "3");
    let response = app.server.post("/upload/gifify").multipart(form).await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_tinify_rejects_non_http_url() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get("/upload/tinify")
        .add_query_param("imageUrl", "ftp://example.com/a.gif")
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_tinify_denied_after_quota() {
    let app = setup_test_app_with(|config| {
        config.free_upload_quota = 0;
    })
    .await;

    let response = app
        .server
        .get("/upload/tinify")
        .add_query_param("imageUrl", "https://example.com/a.gif")
        .await;

    assert_eq!(response.status_code(), 401);
}
