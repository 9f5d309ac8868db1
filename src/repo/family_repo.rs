use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::FamilyMember;
use crate::schema::family_members;
use anyhow::{Result, anyhow};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Adds a family member record to a user's account
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the owning user
/// * `name` - Full name of the family member
/// * `relation` - Relation to the account holder
/// * `birth_year` - Birth year, if the household wants youth pricing
///
/// ### Returns
///
/// A Result containing the newly created FamilyMember if successful
#[instrument(skip(pool), fields(user_id = %user_id))]
pub async fn create_family_member(
    pool: &DbPool,
    user_id: &str,
    name: String,
    relation: String,
    birth_year: Option<i32>,
) -> Result<FamilyMember> {
    debug!("Adding family member");

    let member = FamilyMember::new(user_id.to_string(), name, relation, birth_year);

    let conn = &mut pool.get()?;
    diesel::insert_into(family_members::table)
        .values(member.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Added family member {} for user {}", member.get_id(), user_id);

    Ok(member)
}

/// Retrieves a family member record by its ID
#[instrument(skip(pool), fields(member_id = %member_id))]
pub fn get_family_member(pool: &DbPool, member_id: &str) -> Result<Option<FamilyMember>> {
    let conn = &mut pool.get()?;

    let result = family_members::table
        .find(member_id)
        .first::<FamilyMember>(conn)
        .optional()?;

    Ok(result)
}

/// Lists all family members attached to a user's account
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the owning user
///
/// ### Returns
///
/// A Result containing a vector of the user's FamilyMembers
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_family_members(pool: &DbPool, user_id: &str) -> Result<Vec<FamilyMember>> {
    let conn = &mut pool.get()?;

    let results = family_members::table
        .filter(family_members::user_id.eq(user_id))
        .order_by(family_members::created_at.asc())
        .load::<FamilyMember>(conn)?;

    Ok(results)
}

/// Updates a family member record
///
/// Only the provided fields are changed.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `member_id` - The ID of the record to update
/// * `name` - A new name, or None to leave it alone
/// * `relation` - A new relation, or None to leave it alone
/// * `birth_year` - A new birth year, or None to leave it alone
///
/// ### Returns
///
/// A Result containing the updated FamilyMember
///
/// ### Errors
///
/// Returns an error if the record does not exist or the update fails
#[instrument(skip(pool), fields(member_id = %member_id))]
pub async fn update_family_member(
    pool: &DbPool,
    member_id: &str,
    name: Option<String>,
    relation: Option<String>,
    birth_year: Option<i32>,
) -> Result<FamilyMember> {
    let existing =
        get_family_member(pool, member_id)?.ok_or(anyhow!("Family member not found"))?;

    let new_name = name.unwrap_or_else(|| existing.get_name());
    let new_relation = relation.unwrap_or_else(|| existing.get_relation());
    let new_birth_year = birth_year.or(existing.get_birth_year());

    let conn = &mut pool.get()?;
    diesel::update(family_members::table.find(member_id.to_string()))
        .set((
            family_members::name.eq(new_name),
            family_members::relation.eq(new_relation),
            family_members::birth_year.eq(new_birth_year),
        ))
        .execute_with_retry(conn)
        .await?;

    debug!("Updated family member {}", member_id);

    get_family_member(pool, member_id)?.ok_or(anyhow!("Family member disappeared during update"))
}

/// Deletes a family member record
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `member_id` - The ID of the record to delete
#[instrument(skip(pool), fields(member_id = %member_id))]
pub async fn delete_family_member(pool: &DbPool, member_id: &str) -> Result<()> {
    debug!("Deleting family member");

    let conn = &mut pool.get()?;
    diesel::delete(family_members::table.find(member_id.to_string()))
        .execute_with_retry(conn)
        .await?;

    debug!("Successfully deleted family member with id: {}", member_id);
    Ok(())
}
