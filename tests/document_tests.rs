/// Integration tests for the document library and photo gallery
///
/// These tests exercise tiered document visibility, signed upload and
/// download URLs, and the photo publication workflow through the HTTP
/// stack.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::{json, Value};
use stargazer::models::UserRole;

async fn upload_document(
    app: &mut axum::Router,
    token: &str,
    title: &str,
    visibility: &str,
) -> Value {
    let request = json_request(
        Method::POST,
        "/api/documents",
        Some(token),
        &json!({
            "title": title,
            "file_name": "minutes 2026-03.pdf",
            "content_type": "application/pdf",
            "size_bytes": 48_213,
            "visibility": visibility,
        }),
    );
    let (status, response) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    response
}

async fn upload_photo(app: &mut axum::Router, token: &str, title: &str) -> Value {
    let request = json_request(
        Method::POST,
        "/api/photos",
        Some(token),
        &json!({
            "title": title,
            "file_name": "m42 stack.png",
            "content_type": "image/png",
            "caption": "Orion Nebula, 40x120s",
            "credit": null,
            "captured_at": null,
        }),
    );
    let (status, response) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    response
}

/// Tests that the document shelves honor the visibility tiers
///
/// This test verifies:
/// 1. Board members upload to any tier and get a signed upload URL
/// 2. Anonymous, member, and board listings each see their shelf
/// 3. Uploads are closed to ordinary members
#[tokio::test]
async fn test_document_shelves_are_tiered() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (board_token, _) =
        register_with_role(&mut app, &state, "chair@example.com", "Cass", UserRole::Board).await;
    let (member_token, _) = register(&mut app, "vera@example.com", "Vera").await;

    let newsletter = upload_document(&mut app, &board_token, "Spring Newsletter", "public").await;
    upload_document(&mut app, &board_token, "Observing Site Directions", "members").await;
    upload_document(&mut app, &board_token, "March Board Minutes", "board").await;

    let key = newsletter["document"]["file_key"].as_str().unwrap();
    assert!(key.starts_with("documents/"));
    let upload_url = newsletter["upload_url"].as_str().unwrap();
    assert!(upload_url.contains(key));
    assert!(upload_url.contains("signature="));

    let request = bare_request(Method::GET, "/api/documents", None);
    let (status, shelf) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shelf.as_array().unwrap().len(), 1);

    let request = bare_request(Method::GET, "/api/documents", Some(&member_token));
    let (_, shelf) = send(&mut app, request).await;
    assert_eq!(shelf.as_array().unwrap().len(), 2);

    let request = bare_request(Method::GET, "/api/documents", Some(&board_token));
    let (_, shelf) = send(&mut app, request).await;
    assert_eq!(shelf.as_array().unwrap().len(), 3);

    let request = json_request(
        Method::POST,
        "/api/documents",
        Some(&member_token),
        &json!({
            "title": "Not my shelf",
            "file_name": "x.pdf",
            "content_type": "application/pdf",
            "size_bytes": 10,
            "visibility": "public",
        }),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Tests that download links stop at the caller's tier
///
/// This test verifies:
/// 1. Anyone can fetch a public document's signed download URL
/// 2. A member is told a board document does not exist, not that it
///    is forbidden
#[tokio::test]
async fn test_download_links_stop_at_the_tier() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (board_token, _) =
        register_with_role(&mut app, &state, "chair@example.com", "Cass", UserRole::Board).await;
    let (member_token, _) = register(&mut app, "vera@example.com", "Vera").await;

    let newsletter = upload_document(&mut app, &board_token, "Spring Newsletter", "public").await;
    let minutes = upload_document(&mut app, &board_token, "March Board Minutes", "board").await;

    let uri = format!(
        "/api/documents/{}/download",
        newsletter["document"]["id"].as_str().unwrap()
    );
    let request = bare_request(Method::GET, &uri, None);
    let (status, link) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(link["download_url"]
        .as_str()
        .unwrap()
        .contains("signature="));

    // The shelf above yours looks empty, by name or by link
    let uri = format!(
        "/api/documents/{}/download",
        minutes["document"]["id"].as_str().unwrap()
    );
    let request = bare_request(Method::GET, &uri, Some(&member_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = bare_request(Method::GET, &uri, Some(&board_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
}

/// Tests removing a document from the library
///
/// This test verifies:
/// 1. Deletion is reserved for admins, even against board members
/// 2. A deleted document is gone from the shelf
/// 3. Deleting it twice is a 404
#[tokio::test]
async fn test_document_removal_is_admin_only() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (admin_token, _) =
        register_with_role(&mut app, &state, "admin@example.com", "Ada", UserRole::Admin).await;
    let (board_token, _) =
        register_with_role(&mut app, &state, "chair@example.com", "Cass", UserRole::Board).await;

    let document = upload_document(&mut app, &board_token, "Outdated Bylaws", "public").await;
    let uri = format!("/api/documents/{}", document["document"]["id"].as_str().unwrap());

    let request = bare_request(Method::DELETE, &uri, Some(&board_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = bare_request(Method::DELETE, &uri, Some(&admin_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = bare_request(Method::GET, "/api/documents", None);
    let (_, shelf) = send(&mut app, request).await;
    assert!(shelf.as_array().unwrap().is_empty());

    let request = bare_request(Method::DELETE, &uri, Some(&admin_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Tests that member photos arrive unpublished
///
/// This test verifies:
/// 1. Any member can submit a photo and gets a signed upload URL
/// 2. New photos are not published
/// 3. Non-image uploads and anonymous submissions are refused
#[tokio::test]
async fn test_photos_arrive_unpublished() {
    let mut app = create_test_app();
    let (vera_token, vera) = register(&mut app, "vera@example.com", "Vera").await;

    let response = upload_photo(&mut app, &vera_token, "Orion Nebula").await;
    assert_eq!(response["photo"]["published"], false);
    assert_eq!(response["photo"]["owner_id"], vera["id"]);
    assert!(response["photo"]["file_key"]
        .as_str()
        .unwrap()
        .starts_with("photos/"));
    assert!(response["upload_url"].as_str().unwrap().contains("signature="));

    let request = json_request(
        Method::POST,
        "/api/photos",
        Some(&vera_token),
        &json!({"title": "A PDF", "file_name": "scan.pdf", "content_type": "application/pdf"}),
    );
    let (status, error) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("image"));

    let request = json_request(
        Method::POST,
        "/api/photos",
        None,
        &json!({"title": "Drive-by", "file_name": "x.png", "content_type": "image/png"}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Tests who sees what in the gallery
///
/// This test verifies:
/// 1. Visitors see only published photos
/// 2. A member sees published photos plus their own submissions
/// 3. Publication itself is an admin decision, not the owner's
#[tokio::test]
async fn test_gallery_visibility_and_publication() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (admin_token, _) =
        register_with_role(&mut app, &state, "admin@example.com", "Ada", UserRole::Admin).await;
    let (vera_token, _) = register(&mut app, "vera@example.com", "Vera").await;
    let (finn_token, _) = register(&mut app, "finn@example.com", "Finn").await;

    let photo = upload_photo(&mut app, &vera_token, "Orion Nebula").await;
    let uri = format!("/api/photos/{}", photo["photo"]["id"].as_str().unwrap());

    let request = bare_request(Method::GET, "/api/photos", None);
    let (_, gallery) = send(&mut app, request).await;
    assert!(gallery.as_array().unwrap().is_empty());

    let request = bare_request(Method::GET, "/api/photos", Some(&vera_token));
    let (_, gallery) = send(&mut app, request).await;
    assert_eq!(gallery.as_array().unwrap().len(), 1);

    let request = bare_request(Method::GET, "/api/photos", Some(&finn_token));
    let (_, gallery) = send(&mut app, request).await;
    assert!(gallery.as_array().unwrap().is_empty());

    // The owner cannot publish their own photo
    let request = json_request(
        Method::PATCH,
        &uri,
        Some(&vera_token),
        &json!({"published": true}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = json_request(
        Method::PATCH,
        &uri,
        Some(&admin_token),
        &json!({"published": true}),
    );
    let (status, published) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["published"], true);

    let request = bare_request(Method::GET, "/api/photos", None);
    let (_, gallery) = send(&mut app, request).await;
    assert_eq!(gallery.as_array().unwrap().len(), 1);
}

/// Tests photo edits and takedowns
///
/// This test verifies:
/// 1. The owner can retitle and recaption their photo
/// 2. Strangers cannot edit or delete it
/// 3. Both the owner and an admin can take it down
#[tokio::test]
async fn test_photo_edits_and_takedowns() {
    let state = create_test_state();
    let mut app = stargazer::create_app(state.clone());
    let (admin_token, _) =
        register_with_role(&mut app, &state, "admin@example.com", "Ada", UserRole::Admin).await;
    let (vera_token, _) = register(&mut app, "vera@example.com", "Vera").await;
    let (finn_token, _) = register(&mut app, "finn@example.com", "Finn").await;

    let photo = upload_photo(&mut app, &vera_token, "Orion Nebula").await;
    let uri = format!("/api/photos/{}", photo["photo"]["id"].as_str().unwrap());

    let request = json_request(
        Method::PATCH,
        &uri,
        Some(&vera_token),
        &json!({"caption": "Reprocessed with better flats"}),
    );
    let (status, updated) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["caption"], "Reprocessed with better flats");

    let request = json_request(
        Method::PATCH,
        &uri,
        Some(&finn_token),
        &json!({"caption": "Mine now"}),
    );
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = bare_request(Method::DELETE, &uri, Some(&finn_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = bare_request(Method::DELETE, &uri, Some(&vera_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);

    // An admin can clear out someone else's photo too
    let second = upload_photo(&mut app, &vera_token, "Pleiades").await;
    let uri = format!("/api/photos/{}", second["photo"]["id"].as_str().unwrap());
    let request = bare_request(Method::DELETE, &uri, Some(&admin_token));
    let (status, _) = send(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
}
