use super::*;
use crate::repo::tests::setup_test_db;
use chrono::Duration;

async fn nth_user(pool: &crate::db::DbPool, n: usize) -> String {
    let user = user_repo::create_user(
        pool,
        &format!("officer{}@example.com", n),
        "andromedam31",
        &format!("Officer {}", n),
    )
    .await
    .unwrap();
    user.get_id()
}

async fn seat(
    pool: &crate::db::DbPool,
    user_id: &str,
    office: &str,
    sort_order: i32,
    starts: DateTime<Utc>,
    ends: DateTime<Utc>,
) -> BoardMember {
    create_board_member(pool, user_id, office.to_string(), sort_order, starts, ends)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_and_get_board_member() {
    let pool = setup_test_db();
    let user_id = nth_user(&pool, 0).await;
    let now = Utc::now();

    let entry = create_board_member(
        &pool,
        &user_id,
        "President".to_string(),
        0,
        now - Duration::days(30),
        now + Duration::days(335),
    )
    .await
    .unwrap();

    let fetched = get_board_member(&pool, &entry.get_id()).unwrap().unwrap();
    assert_eq!(fetched.get_office(), "President");
    assert_eq!(fetched.get_user_id(), user_id);
    assert_eq!(fetched.get_sort_order(), 0);
    assert!(fetched.is_current(now));
}

#[tokio::test]
async fn test_create_board_member_unknown_user() {
    let pool = setup_test_db();
    let now = Utc::now();

    let result = create_board_member(
        &pool,
        "no-such-user",
        "Treasurer".to_string(),
        3,
        now,
        now + Duration::days(365),
    )
    .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("User not found"));
}

#[tokio::test]
async fn test_create_board_member_inverted_term() {
    let pool = setup_test_db();
    let user_id = nth_user(&pool, 0).await;
    let now = Utc::now();

    let result = create_board_member(
        &pool,
        &user_id,
        "Secretary".to_string(),
        2,
        now,
        now - Duration::days(1),
    )
    .await;

    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("end after it starts")
    );
}

#[tokio::test]
async fn test_roster_hides_expired_and_future_terms() {
    let pool = setup_test_db();
    let sitting = nth_user(&pool, 0).await;
    let outgoing = nth_user(&pool, 1).await;
    let incoming = nth_user(&pool, 2).await;
    let now = Utc::now();

    seat(
        &pool,
        &sitting,
        "President",
        0,
        now - Duration::days(30),
        now + Duration::days(335),
    )
    .await;
    seat(
        &pool,
        &outgoing,
        "Past President",
        0,
        now - Duration::days(400),
        now - Duration::days(35),
    )
    .await;
    seat(
        &pool,
        &incoming,
        "President Elect",
        0,
        now + Duration::days(335),
        now + Duration::days(700),
    )
    .await;

    let roster = list_current_roster(&pool).unwrap();

    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].0.get_user_id(), sitting);
}

#[tokio::test]
async fn test_roster_is_ordered_and_carries_names() {
    let pool = setup_test_db();
    let president = nth_user(&pool, 0).await;
    let treasurer = nth_user(&pool, 1).await;
    let now = Utc::now();

    // Inserted out of order; sort_order decides the listing
    seat(
        &pool,
        &treasurer,
        "Treasurer",
        3,
        now - Duration::days(1),
        now + Duration::days(364),
    )
    .await;
    seat(
        &pool,
        &president,
        "President",
        0,
        now - Duration::days(1),
        now + Duration::days(364),
    )
    .await;

    let roster = list_current_roster(&pool).unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].0.get_office(), "President");
    assert_eq!(roster[0].1.get_name(), "Officer 0");
    assert_eq!(roster[1].0.get_office(), "Treasurer");
    assert_eq!(roster[1].1.get_name(), "Officer 1");
}

#[tokio::test]
async fn test_delete_board_member() {
    let pool = setup_test_db();
    let user_id = nth_user(&pool, 0).await;
    let now = Utc::now();
    let entry = seat(
        &pool,
        &user_id,
        "Secretary",
        2,
        now,
        now + Duration::days(365),
    )
    .await;

    delete_board_member(&pool, &entry.get_id()).await.unwrap();

    assert!(get_board_member(&pool, &entry.get_id()).unwrap().is_none());

    let result = delete_board_member(&pool, &entry.get_id()).await;
    assert!(result.is_err());
}
