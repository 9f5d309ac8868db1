use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{CreateDocumentDto, DocumentUploadResponseDto, DownloadUrlDto};
use crate::errors::ApiError;
use crate::models::{Document, User, Visibility};
use crate::repo;
use crate::signing;
use crate::state::AppState;

/// The highest document tier the caller may see
fn caller_tier(caller: Option<&User>) -> Visibility {
    match caller {
        Some(user) if user.is_board() => Visibility::Board,
        Some(_) => Visibility::Members,
        None => Visibility::Public,
    }
}

/// Handler for adding a document to the club library
///
/// This function handles POST requests to `/api/documents`.
///
/// Only the record is written here; the response carries a signed URL
/// the client PUTs the file bytes to before it expires.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The document title, file details, and visibility
///
/// ### Returns
///
/// The document record and the signed upload URL as JSON
#[instrument(skip(state, headers, payload), fields(title = %payload.title))]
pub async fn create_document_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateDocumentDto>,
) -> Result<Json<DocumentUploadResponseDto>, ApiError> {
    let user = auth::require_board(&state.pool, &headers)?;

    info!("Creating document: {}", payload.title);

    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title cannot be empty".to_string()));
    }
    if payload.size_bytes < 0 {
        return Err(ApiError::Validation(
            "File size cannot be negative".to_string(),
        ));
    }

    let file_key = signing::object_key("documents", &payload.file_name);

    // Call the repository function to create the document record
    let document = repo::create_document(
        &state.pool,
        payload.title,
        file_key.clone(),
        payload.content_type,
        payload.size_bytes,
        payload.visibility,
        &user.get_id(),
    )
    .await
    .map_err(ApiError::Database)?;

    let upload_url = state
        .signer
        .upload_url(&file_key, state.config.upload_url_ttl());

    info!("Created document with id: {}", document.get_id());

    // Return the document and upload URL as JSON
    Ok(Json(DocumentUploadResponseDto {
        document,
        upload_url,
    }))
}

/// Handler for listing the club library
///
/// This function handles GET requests to `/api/documents`. No login is
/// required; the caller's tier decides how much of the library shows.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers, which may carry a bearer token
///
/// ### Returns
///
/// A list of visible documents as JSON, newest first
#[instrument(skip(state, headers))]
pub async fn list_documents_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Document>>, ApiError> {
    let caller = auth::optional_user(&state.pool, &headers)?;
    let tier = caller_tier(caller.as_ref());

    debug!("Listing documents at tier {}", tier);

    let documents = repo::list_documents(&state.pool, tier).map_err(ApiError::Database)?;

    // Return the list of documents as JSON
    Ok(Json(documents))
}

/// Handler for fetching a document's download link
///
/// This function handles GET requests to `/api/documents/{id}/download`.
///
/// Documents above the caller's tier are reported as missing rather than
/// forbidden, so the library's restricted shelf cannot be enumerated.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `document_id` - The ID of the document, extracted from the URL path
/// * `headers` - The request headers, which may carry a bearer token
///
/// ### Returns
///
/// A signed, expiring download URL as JSON
#[instrument(skip(state, headers), fields(document_id = %document_id))]
pub async fn download_document_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the document ID from the URL path
    Path(document_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<DownloadUrlDto>, ApiError> {
    let caller = auth::optional_user(&state.pool, &headers)?;
    let tier = caller_tier(caller.as_ref());

    debug!("Issuing download link");

    let document = repo::get_document(&state.pool, &document_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if document.get_visibility() > tier {
        return Err(ApiError::NotFound);
    }

    let download_url = state
        .signer
        .download_url(&document.get_file_key(), state.config.upload_url_ttl());

    info!("Issued download link for document {}", document_id);

    // Return the download URL as JSON
    Ok(Json(DownloadUrlDto { download_url }))
}

/// Handler for removing a document from the library
///
/// This function handles DELETE requests to `/api/documents/{id}`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `document_id` - The ID of the document to delete
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// An empty JSON response on success
#[instrument(skip(state, headers), fields(document_id = %document_id))]
pub async fn delete_document_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the document ID from the URL path
    Path(document_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Deleting document");

    // First check the document exists
    repo::get_document(&state.pool, &document_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // Call the repository function to delete the document
    repo::delete_document(&state.pool, &document_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Deleted document {}", document_id);

    // Return an empty response
    Ok(Json(()))
}
