use super::*;
use crate::dto::MemberQueryDto;
use crate::repo::tests::setup_test_db;
use chrono::{Duration, TimeDelta};

#[tokio::test]
async fn test_create_user() {
    let pool = setup_test_db();

    let user = create_user(&pool, "ada@example.com", "a strong password", "Ada Lovelace")
        .await
        .unwrap();

    assert_eq!(user.get_email(), "ada@example.com");
    assert_eq!(user.get_name(), "Ada Lovelace");
    assert_eq!(user.get_role(), UserRole::Member);
    assert!(!user.is_deactivated());
    // The stored hash is salted, never the plaintext
    assert_ne!(user.get_password_hash(), "a strong password");
}

#[tokio::test]
async fn test_create_user_normalizes_email() {
    let pool = setup_test_db();

    let user = create_user(&pool, "  Ada@Example.COM ", "a strong password", "Ada")
        .await
        .unwrap();

    assert_eq!(user.get_email(), "ada@example.com");

    // Lookups with the normalized form find the account
    let found = find_user_by_email(&pool, "ada@example.com").unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let pool = setup_test_db();

    create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();

    // Same address with different casing still collides
    let result = create_user(&pool, "ADA@example.com", "another password", "Imposter").await;

    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("already registered"));
}

#[tokio::test]
async fn test_get_user() {
    let pool = setup_test_db();

    let created = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();

    let retrieved = get_user(&pool, &created.get_id()).unwrap().unwrap();

    assert_eq!(retrieved.get_id(), created.get_id());
    assert_eq!(retrieved.get_email(), "ada@example.com");
}

#[tokio::test]
async fn test_get_nonexistent_user() {
    let pool = setup_test_db();

    let result = get_user(&pool, "nonexistent-id").unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_find_user_by_unknown_email() {
    let pool = setup_test_db();

    let result = find_user_by_email(&pool, "nobody@example.com").unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_list_members_default_hides_deactivated() {
    let pool = setup_test_db();

    let active = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();
    let gone = create_user(&pool, "bruno@example.com", "a strong password", "Bruno")
        .await
        .unwrap();
    deactivate_user(&pool, &gone.get_id()).await.unwrap();

    let members = list_members(&pool, &MemberQueryDto::default()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].get_id(), active.get_id());

    // Asking for deactivated accounts brings both back
    let query = MemberQueryDto {
        include_deactivated: true,
        ..Default::default()
    };
    let members = list_members(&pool, &query).unwrap();
    assert_eq!(members.len(), 2);
}

#[tokio::test]
async fn test_list_members_by_role() {
    let pool = setup_test_db();

    let _member = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();
    let board = create_user(&pool, "bruno@example.com", "a strong password", "Bruno")
        .await
        .unwrap();
    update_member(&pool, &board.get_id(), Some(UserRole::Board), None)
        .await
        .unwrap();

    let query = MemberQueryDto {
        role: Some(UserRole::Board),
        ..Default::default()
    };
    let members = list_members(&pool, &query).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].get_id(), board.get_id());
}

#[tokio::test]
async fn test_list_members_search_matches_name_and_email() {
    let pool = setup_test_db();

    let by_name = create_user(&pool, "vs@example.com", "a strong password", "Vesto Slipher")
        .await
        .unwrap();
    let by_email = create_user(&pool, "slipher-fan@example.com", "a strong password", "Edwin")
        .await
        .unwrap();
    let _other = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();

    let query = MemberQueryDto {
        q: Some("slipher".to_string()),
        ..Default::default()
    };
    let members = list_members(&pool, &query).unwrap();

    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|m| m.get_id() == by_name.get_id()));
    assert!(members.iter().any(|m| m.get_id() == by_email.get_id()));
}

#[tokio::test]
async fn test_list_members_ordered_by_name() {
    let pool = setup_test_db();

    create_user(&pool, "z@example.com", "a strong password", "Zelda")
        .await
        .unwrap();
    create_user(&pool, "a@example.com", "a strong password", "Ada")
        .await
        .unwrap();

    let members = list_members(&pool, &MemberQueryDto::default()).unwrap();

    assert_eq!(members[0].get_name(), "Ada");
    assert_eq!(members[1].get_name(), "Zelda");
}

#[tokio::test]
async fn test_update_member_role() {
    let pool = setup_test_db();

    let user = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();

    let updated = update_member(&pool, &user.get_id(), Some(UserRole::Admin), None)
        .await
        .unwrap();

    assert_eq!(updated.get_role(), UserRole::Admin);
    assert!(updated.is_admin());
    // The expiry was not touched
    assert_eq!(updated.get_membership_expires(), None);
}

#[tokio::test]
async fn test_update_member_expiry() {
    let pool = setup_test_db();

    let user = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();

    let expires = Utc::now() + Duration::days(365);
    let updated = update_member(&pool, &user.get_id(), None, Some(expires))
        .await
        .unwrap();

    assert_eq!(updated.get_role(), UserRole::Member);
    assert!(updated.is_member_in_good_standing(Utc::now()));
}

#[tokio::test]
async fn test_update_nonexistent_member() {
    let pool = setup_test_db();

    let result = update_member(&pool, "nonexistent-id", Some(UserRole::Board), None).await;

    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("not found"));
}

#[tokio::test]
async fn test_deactivate_user_revokes_sessions() {
    let pool = setup_test_db();

    let user = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();
    let session = crate::repo::create_session(&pool, &user.get_id(), TimeDelta::hours(1))
        .await
        .unwrap();

    let deactivated = deactivate_user(&pool, &user.get_id()).await.unwrap();

    assert!(deactivated.is_deactivated());

    // The session was deleted in the same transaction
    let found = crate::repo::find_session(&pool, &session.get_id()).unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_deactivate_user_twice() {
    let pool = setup_test_db();

    let user = create_user(&pool, "ada@example.com", "a strong password", "Ada")
        .await
        .unwrap();
    deactivate_user(&pool, &user.get_id()).await.unwrap();

    let result = deactivate_user(&pool, &user.get_id()).await;

    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("already deactivated"));
}
