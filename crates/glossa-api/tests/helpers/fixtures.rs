//! Test fixtures: multipart forms and minimal media blobs.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use bytes::Bytes;
use uuid::Uuid;

use super::auth::TestUser;

/// Minimal valid 1x1 PNG bytes.
pub fn create_minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// Arbitrary bytes standing in for an MP4 or MP3 file
pub fn create_test_media(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn file_part(file_name: &str, mime_type: &str, data: Vec<u8>) -> Part {
    Part::bytes(Bytes::from(data))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string())
}

/// Language text of the "Colors" topic in language 1
pub fn colors_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("language_id", "1")
        .add_text("file_name", "colors")
        .add_text("title", "Colors")
        .add_text("note", "Basic colors")
        .add_text("description", "Red, green and blue")
}

pub fn with_png(form: MultipartForm, slot: &str) -> MultipartForm {
    form.add_part(
        format!("{}_file", slot),
        file_part(&format!("{}.png", slot), "image/png", create_minimal_png()),
    )
}

pub async fn post_form(
    client: &TestServer,
    path: &str,
    user: &TestUser,
    form: MultipartForm,
) -> TestResponse {
    client
        .post(path)
        .add_header("Authorization", user.bearer())
        .multipart(form)
        .await
}

/// Upload a form and return the entity id from the response
pub async fn upload_ok(
    client: &TestServer,
    path: &str,
    user: &TestUser,
    form: MultipartForm,
) -> (Uuid, serde_json::Value) {
    let response = post_form(client, path, user, form).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body: serde_json::Value = response.json();
    let id = Uuid::parse_str(
        body.get("id")
            .and_then(|v: &serde_json::Value| v.as_str())
            .expect("Expected 'id' in upload response"),
    )
    .expect("Invalid UUID in upload response");
    (id, body)
}
