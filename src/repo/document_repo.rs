use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::{Document, Visibility};
use crate::schema::documents;
use anyhow::{Result, anyhow};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a document record in the club library
///
/// Only the record is created here; the file bytes are PUT to object
/// storage by the client against a signed URL.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `title` - Title shown in the library listing
/// * `file_key` - Object-storage key the bytes will live under
/// * `content_type` - MIME type of the file
/// * `size_bytes` - Declared file size in bytes
/// * `visibility` - Who may see the document
/// * `uploaded_by` - The uploading user's ID
///
/// ### Returns
///
/// A Result containing the newly created Document if successful
#[instrument(skip(pool), fields(uploaded_by = %uploaded_by))]
pub async fn create_document(
    pool: &DbPool,
    title: String,
    file_key: String,
    content_type: String,
    size_bytes: i64,
    visibility: Visibility,
    uploaded_by: &str,
) -> Result<Document> {
    debug!("Creating document: {}", title);

    let document = Document::new(
        title,
        file_key,
        content_type,
        size_bytes,
        visibility,
        uploaded_by.to_string(),
    );

    let conn = &mut pool.get()?;
    diesel::insert_into(documents::table)
        .values(document.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Created document with id: {}", document.get_id());

    Ok(document)
}

/// Retrieves a document from the database by its ID
#[instrument(skip(pool), fields(document_id = %document_id))]
pub fn get_document(pool: &DbPool, document_id: &str) -> Result<Option<Document>> {
    let conn = &mut pool.get()?;

    let result = documents::table
        .find(document_id)
        .first::<Document>(conn)
        .optional()?;

    Ok(result)
}

/// Lists documents up to a visibility tier, newest first
///
/// Tiers nest: board callers see everything, members see member and
/// public documents, anonymous callers see public ones only.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `tier` - The highest tier the caller may see
///
/// ### Returns
///
/// A Result containing a vector of visible Documents
#[instrument(skip(pool))]
pub fn list_documents(pool: &DbPool, tier: Visibility) -> Result<Vec<Document>> {
    debug!("Listing documents visible at tier {}", tier);

    let allowed: Vec<Visibility> = match tier {
        Visibility::Public => vec![Visibility::Public],
        Visibility::Members => vec![Visibility::Public, Visibility::Members],
        Visibility::Board => vec![Visibility::Public, Visibility::Members, Visibility::Board],
    };

    let conn = &mut pool.get()?;
    let results = documents::table
        .filter(documents::visibility.eq_any(allowed))
        .order_by(documents::created_at.desc())
        .load::<Document>(conn)?;

    info!("Retrieved {} documents", results.len());

    Ok(results)
}

/// Deletes a document record
///
/// ### Errors
///
/// Returns an error if the document does not exist
#[instrument(skip(pool), fields(document_id = %document_id))]
pub async fn delete_document(pool: &DbPool, document_id: &str) -> Result<()> {
    debug!("Deleting document");

    get_document(pool, document_id)?.ok_or(anyhow!("Document not found"))?;

    let conn = &mut pool.get()?;
    diesel::delete(documents::table.find(document_id.to_string()))
        .execute_with_retry(conn)
        .await?;

    info!("Deleted document {}", document_id);
    Ok(())
}

#[cfg(test)]
mod tests;
