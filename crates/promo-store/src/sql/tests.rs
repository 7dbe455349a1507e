//! Tests for the SQL record store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::sql::{DatabaseType, SqlStore, SqlStoreConfig};
use crate::{
    IssueOutcome, JoinOutcome, PromoCode, RecordStore, StoreError, StoredTime, StubOutcome,
    UserId, UserRecord,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Create a test SqlStore with in-memory SQLite.
async fn setup_test_db() -> SqlStore {
    let config = SqlStoreConfig::new("sqlite::memory:")
        .max_connections(1)
        .init_schema(true);

    SqlStore::connect(config).await.expect("Failed to connect")
}

/// Insert a raw row, bypassing the store's conditional writes.
async fn insert_raw(store: &SqlStore, user_id: &str, code: Option<&str>, joined_at: Option<&str>) {
    sqlx::query("INSERT INTO promo_subscribers (user_id, code, joined_at) VALUES (?, ?, ?)")
        .bind(user_id.to_string())
        .bind(code.map(str::to_string))
        .bind(joined_at.map(str::to_string))
        .execute(store.pool())
        .await
        .expect("Failed to insert row");
}

#[tokio::test]
async fn test_database_type_detection() {
    assert_eq!(
        DatabaseType::from_url("postgres://localhost/db"),
        Some(DatabaseType::PostgreSQL)
    );
    assert_eq!(
        DatabaseType::from_url("postgresql://localhost/db"),
        Some(DatabaseType::PostgreSQL)
    );
    assert_eq!(
        DatabaseType::from_url("mysql://localhost/db"),
        Some(DatabaseType::MySQL)
    );
    assert_eq!(
        DatabaseType::from_url("mariadb://localhost/db"),
        Some(DatabaseType::MySQL)
    );
    assert_eq!(
        DatabaseType::from_url("sqlite::memory:"),
        Some(DatabaseType::SQLite)
    );
    assert_eq!(DatabaseType::from_url("invalid://localhost"), None);
}

#[tokio::test]
async fn test_connect_rejects_unknown_scheme() {
    let err = SqlStore::connect(SqlStoreConfig::new("redis://localhost"))
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn test_init_schema_idempotent() {
    let store = setup_test_db().await;
    assert_eq!(store.database_type(), DatabaseType::SQLite);
    store.init_schema().await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_absent() {
    let store = setup_test_db().await;
    assert_eq!(store.find(UserId(1)).await.unwrap(), None);
}

#[tokio::test]
async fn test_upsert_join_write_once() {
    let store = setup_test_db().await;
    let id = UserId(10);

    assert_eq!(
        store.upsert_join(id, Some("erin"), t0()).await.unwrap(),
        JoinOutcome::Created
    );
    assert_eq!(
        store
            .upsert_join(id, Some("other"), t0() + Duration::hours(30))
            .await
            .unwrap(),
        JoinOutcome::AlreadyJoined
    );

    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.joined_at, Some(StoredTime::At(t0())));
    assert_eq!(record.display_name.as_deref(), Some("erin"));
}

#[tokio::test]
async fn test_upsert_join_opens_window_on_stub() {
    let store = setup_test_db().await;
    let id = UserId(11);
    assert_eq!(
        store.create_stub(id, None).await.unwrap(),
        StubOutcome::Created
    );
    assert_eq!(
        store.upsert_join(id, Some("finn"), t0()).await.unwrap(),
        JoinOutcome::WindowOpened
    );
    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.joined_at, Some(StoredTime::At(t0())));
    assert_eq!(record.display_name.as_deref(), Some("finn"));
}

#[tokio::test]
async fn test_empty_string_join_counts_as_absent() {
    let store = setup_test_db().await;
    insert_raw(&store, "12", None, Some("")).await;

    let record = store.find(UserId(12)).await.unwrap().unwrap();
    assert_eq!(record.joined_at, None);
    assert_eq!(
        store.upsert_join(UserId(12), None, t0()).await.unwrap(),
        JoinOutcome::WindowOpened
    );
}

#[tokio::test]
async fn test_malformed_join_kept_and_not_overwritten() {
    let store = setup_test_db().await;
    insert_raw(&store, "13", None, Some("garbage")).await;

    assert_eq!(
        store.upsert_join(UserId(13), None, t0()).await.unwrap(),
        JoinOutcome::AlreadyJoined
    );
    let record = store.find(UserId(13)).await.unwrap().unwrap();
    assert_eq!(record.joined_at, Some(StoredTime::Malformed("garbage".into())));
}

#[tokio::test]
async fn test_issue_code_compare_and_set() {
    let store = setup_test_db().await;
    let id = UserId(14);
    store.upsert_join(id, None, t0()).await.unwrap();

    let first = PromoCode::new("PROMO-ABCDEF");
    assert_eq!(
        store.issue_code(id, &first, t0()).await.unwrap(),
        IssueOutcome::Issued
    );
    assert_eq!(
        store
            .issue_code(id, &PromoCode::new("PROMO-123456"), t0())
            .await
            .unwrap(),
        IssueOutcome::AlreadyIssued
    );

    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.code, Some(first));
    assert_eq!(record.code_issued_at, Some(StoredTime::At(t0())));
}

#[tokio::test]
async fn test_issue_code_missing_record() {
    let store = setup_test_db().await;
    let err = store
        .issue_code(UserId(15), &PromoCode::new("PROMO-000000"), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingRecord(UserId(15))));
}

#[tokio::test]
async fn test_create_stub_idempotent() {
    let store = setup_test_db().await;
    let id = UserId(16);
    store.upsert_join(id, None, t0()).await.unwrap();
    assert_eq!(
        store.create_stub(id, Some("late")).await.unwrap(),
        StubOutcome::AlreadyExists
    );
    let record = store.find(id).await.unwrap().unwrap();
    assert!(record.has_joined_at());
}

#[tokio::test]
async fn test_create_joined_is_insert_only() {
    let store = setup_test_db().await;
    let stub = UserId(17);
    store.create_stub(stub, None).await.unwrap();
    assert_eq!(
        store.create_joined(stub, Some("x"), t0()).await.unwrap(),
        StubOutcome::AlreadyExists
    );
    let record = store.find(stub).await.unwrap().unwrap();
    assert!(!record.has_joined_at());

    let fresh = UserId(18);
    assert_eq!(
        store.create_joined(fresh, Some("x"), t0()).await.unwrap(),
        StubOutcome::Created
    );
    let record = store.find(fresh).await.unwrap().unwrap();
    assert_eq!(record.joined_at, Some(StoredTime::At(t0())));
}

#[tokio::test]
async fn test_insert_if_absent_never_overwrites() {
    let store = setup_test_db().await;
    let id = UserId(17);
    store.upsert_join(id, None, t0()).await.unwrap();
    store
        .issue_code(id, &PromoCode::new("PROMO-KEEPME"), t0())
        .await
        .unwrap();

    let mut incoming = UserRecord::joined(id, Some("import"), t0());
    incoming.code = Some(PromoCode::new("PROMO-OTHER1"));
    assert!(!store.insert_if_absent(&incoming).await.unwrap());

    let fresh = UserRecord::stub(UserId(18), Some("new"));
    assert!(store.insert_if_absent(&fresh).await.unwrap());
    assert_eq!(store.find(UserId(18)).await.unwrap(), Some(fresh));

    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.code, Some(PromoCode::new("PROMO-KEEPME")));
}

#[tokio::test]
async fn test_duplicate_rows_use_first_inserted() {
    let config = SqlStoreConfig::new("sqlite::memory:")
        .max_connections(1)
        .init_schema(false);
    let store = SqlStore::connect(config).await.unwrap();
    // A hand-made table without the primary key.
    sqlx::query(
        "CREATE TABLE promo_subscribers (user_id TEXT, display_name TEXT, code TEXT, \
         code_issued_at TEXT, joined_at TEXT)",
    )
    .execute(store.pool())
    .await
    .unwrap();
    insert_raw(&store, "30", None, Some("2025-03-01T11:00:00.000000Z")).await;
    insert_raw(&store, "30", Some("PROMO-FFFFFF"), None).await;

    let record = store.find(UserId(30)).await.unwrap().unwrap();
    assert!(!record.has_code());
    assert!(record.has_joined_at());
}

#[tokio::test]
async fn test_list_numeric_order() {
    let store = setup_test_db().await;
    for id in [100, 9, 20] {
        store.create_stub(UserId(id), None).await.unwrap();
    }
    let ids: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.user_id)
        .collect();
    assert_eq!(ids, vec![UserId(9), UserId(20), UserId(100)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_single_winner() {
    let store = Arc::new(setup_test_db().await);
    let id = UserId(19);
    store.upsert_join(id, None, t0()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let code = PromoCode::new(format!("PROMO-{i:06X}"));
            store.issue_code(id, &code, t0()).await.unwrap()
        }));
    }

    let mut issued = 0;
    for handle in handles {
        if handle.await.unwrap() == IssueOutcome::Issued {
            issued += 1;
        }
    }
    assert_eq!(issued, 1);
}
