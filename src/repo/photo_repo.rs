use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::UpdatePhotoDto;
use crate::models::Photo;
use crate::schema::photos;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a photo in the member gallery
///
/// New photos are unpublished until an admin approves them; the image
/// bytes are PUT to object storage under `file_key` by the client.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `owner_id` - The uploading user's ID
/// * `title` - Title shown under the photo
/// * `file_key` - Object-storage key the image will live under
/// * `caption` - Longer caption, if provided
/// * `credit` - Photographer credit line, if provided
/// * `captured_at` - When the photo was taken, if known
///
/// ### Returns
///
/// A Result containing the newly created Photo if successful
#[instrument(skip(pool, caption, credit), fields(owner_id = %owner_id))]
pub async fn create_photo(
    pool: &DbPool,
    owner_id: &str,
    title: String,
    file_key: String,
    caption: Option<String>,
    credit: Option<String>,
    captured_at: Option<DateTime<Utc>>,
) -> Result<Photo> {
    debug!("Creating photo: {}", title);

    let mut photo = Photo::new(owner_id.to_string(), title, file_key);
    photo.set_caption(caption);
    photo.set_credit(credit);
    photo.set_captured_at(captured_at);

    let conn = &mut pool.get()?;
    diesel::insert_into(photos::table)
        .values(photo.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Created photo with id: {}", photo.get_id());

    Ok(photo)
}

/// Retrieves a photo from the database by its ID
#[instrument(skip(pool), fields(photo_id = %photo_id))]
pub fn get_photo(pool: &DbPool, photo_id: &str) -> Result<Option<Photo>> {
    let conn = &mut pool.get()?;

    let result = photos::table
        .find(photo_id)
        .first::<Photo>(conn)
        .optional()?;

    Ok(result)
}

/// Lists published photos, newest first
///
/// This is the public gallery view.
#[instrument(skip(pool))]
pub fn list_published_photos(pool: &DbPool) -> Result<Vec<Photo>> {
    let conn = &mut pool.get()?;

    let results = photos::table
        .filter(photos::published.eq(true))
        .order_by(photos::created_at.desc())
        .load::<Photo>(conn)?;

    info!("Retrieved {} published photos", results.len());

    Ok(results)
}

/// Lists every photo, published or not, newest first
///
/// Admin review view.
#[instrument(skip(pool))]
pub fn list_all_photos(pool: &DbPool) -> Result<Vec<Photo>> {
    let conn = &mut pool.get()?;

    let results = photos::table
        .order_by(photos::created_at.desc())
        .load::<Photo>(conn)?;

    info!("Retrieved {} photos", results.len());

    Ok(results)
}

/// Lists the photos a member may see: everything published, plus their
/// own unpublished uploads, newest first
#[instrument(skip(pool), fields(viewer_id = %viewer_id))]
pub fn list_photos_for_viewer(pool: &DbPool, viewer_id: &str) -> Result<Vec<Photo>> {
    let conn = &mut pool.get()?;

    let results = photos::table
        .filter(
            photos::published
                .eq(true)
                .or(photos::owner_id.eq(viewer_id.to_string())),
        )
        .order_by(photos::created_at.desc())
        .load::<Photo>(conn)?;

    info!("Retrieved {} photos for viewer", results.len());

    Ok(results)
}

/// Updates a photo's details
///
/// Only the provided fields are changed. Ownership and publish-permission
/// checks belong to the caller; this just applies the edit.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `photo_id` - The ID of the photo to update
/// * `dto` - The fields to change
///
/// ### Returns
///
/// A Result containing the updated Photo
///
/// ### Errors
///
/// Returns an error if the photo does not exist or the update fails
#[instrument(skip(pool, dto), fields(photo_id = %photo_id))]
pub async fn update_photo(pool: &DbPool, photo_id: &str, dto: &UpdatePhotoDto) -> Result<Photo> {
    let existing = get_photo(pool, photo_id)?.ok_or(anyhow!("Photo not found"))?;

    let new_title = dto.title.clone().unwrap_or_else(|| existing.get_title());
    let new_caption = dto.caption.clone().or_else(|| existing.get_caption());
    let new_credit = dto.credit.clone().or_else(|| existing.get_credit());
    let new_captured = dto.captured_at.or_else(|| existing.get_captured_at());
    let new_published = dto.published.unwrap_or_else(|| existing.is_published());

    let conn = &mut pool.get()?;
    diesel::update(photos::table.find(photo_id.to_string()))
        .set((
            photos::title.eq(new_title),
            photos::caption.eq(new_caption),
            photos::credit.eq(new_credit),
            photos::captured_at.eq(new_captured.map(|dt| dt.naive_utc())),
            photos::published.eq(new_published),
        ))
        .execute_with_retry(conn)
        .await?;

    debug!("Updated photo {}", photo_id);

    get_photo(pool, photo_id)?.ok_or(anyhow!("Photo disappeared during update"))
}

/// Deletes a photo record
///
/// ### Errors
///
/// Returns an error if the photo does not exist
#[instrument(skip(pool), fields(photo_id = %photo_id))]
pub async fn delete_photo(pool: &DbPool, photo_id: &str) -> Result<()> {
    debug!("Deleting photo");

    get_photo(pool, photo_id)?.ok_or(anyhow!("Photo not found"))?;

    let conn = &mut pool.get()?;
    diesel::delete(photos::table.find(photo_id.to_string()))
        .execute_with_retry(conn)
        .await?;

    info!("Deleted photo {}", photo_id);
    Ok(())
}
