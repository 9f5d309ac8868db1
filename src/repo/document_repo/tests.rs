use super::*;
use crate::repo::tests::setup_test_db;
use crate::repo::user_repo;

async fn uploader(pool: &crate::db::DbPool) -> String {
    let user = user_repo::create_user(pool, "librarian@example.com", "orionnebula", "Librarian")
        .await
        .unwrap();
    user.get_id()
}

async fn doc_at(
    pool: &crate::db::DbPool,
    title: &str,
    visibility: Visibility,
    uploaded_by: &str,
) -> Document {
    create_document(
        pool,
        title.to_string(),
        format!("documents/{}.pdf", title),
        "application/pdf".to_string(),
        1024,
        visibility,
        uploaded_by,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_and_get_document() {
    let pool = setup_test_db();
    let user_id = uploader(&pool).await;

    let document = create_document(
        &pool,
        "Minutes 2024-03".to_string(),
        "documents/minutes-2024-03.pdf".to_string(),
        "application/pdf".to_string(),
        48_000,
        Visibility::Board,
        &user_id,
    )
    .await
    .unwrap();

    let fetched = get_document(&pool, &document.get_id()).unwrap().unwrap();
    assert_eq!(fetched.get_title(), "Minutes 2024-03");
    assert_eq!(fetched.get_file_key(), "documents/minutes-2024-03.pdf");
    assert_eq!(fetched.get_content_type(), "application/pdf");
    assert_eq!(fetched.get_size_bytes(), 48_000);
    assert_eq!(fetched.get_visibility(), Visibility::Board);
    assert_eq!(fetched.get_uploaded_by(), user_id);
}

#[tokio::test]
async fn test_get_nonexistent_document() {
    let pool = setup_test_db();

    let result = get_document(&pool, "no-such-document").unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_list_documents_respects_visibility_tiers() {
    let pool = setup_test_db();
    let user_id = uploader(&pool).await;

    doc_at(&pool, "newsletter", Visibility::Public, &user_id).await;
    doc_at(&pool, "bylaws", Visibility::Members, &user_id).await;
    doc_at(&pool, "minutes", Visibility::Board, &user_id).await;

    let public = list_documents(&pool, Visibility::Public).unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].get_title(), "newsletter");

    let members = list_documents(&pool, Visibility::Members).unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|d| d.get_visibility() != Visibility::Board));

    let board = list_documents(&pool, Visibility::Board).unwrap();
    assert_eq!(board.len(), 3);
}

#[tokio::test]
async fn test_list_documents_newest_first() {
    let pool = setup_test_db();
    let user_id = uploader(&pool).await;

    doc_at(&pool, "older", Visibility::Public, &user_id).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    doc_at(&pool, "newer", Visibility::Public, &user_id).await;

    let results = list_documents(&pool, Visibility::Public).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].get_title(), "newer");
    assert_eq!(results[1].get_title(), "older");
}

#[tokio::test]
async fn test_delete_document() {
    let pool = setup_test_db();
    let user_id = uploader(&pool).await;
    let document = doc_at(&pool, "retired", Visibility::Public, &user_id).await;

    delete_document(&pool, &document.get_id()).await.unwrap();

    assert!(get_document(&pool, &document.get_id()).unwrap().is_none());
}

#[tokio::test]
async fn test_delete_nonexistent_document() {
    let pool = setup_test_db();

    let result = delete_document(&pool, "no-such-document").await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}
