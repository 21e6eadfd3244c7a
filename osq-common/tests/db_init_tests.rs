//! Database initialization tests

use osq_common::db::{get_setting, get_setting_i64, init_database, set_setting};
use tempfile::TempDir;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_init_creates_file_and_schema() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sub").join("osq.db");

    let pool = init_database(&db_path).await.unwrap();

    assert!(db_path.exists());
    assert_eq!(
        table_names(&pool).await,
        vec![
            "note_quests",
            "notes",
            "pending_notes",
            "quest_statistics",
            "settings",
            "way_traffic_flow",
        ]
    );
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("osq.db");

    let pool = init_database(&db_path).await.unwrap();
    set_setting(&pool, "db_max_lock_wait_ms", "1234").await.unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    assert_eq!(
        get_setting(&pool, "db_max_lock_wait_ms").await.unwrap().as_deref(),
        Some("1234")
    );
}

#[tokio::test]
async fn test_wal_journal_mode() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("osq.db")).await.unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_setting_i64_default_and_override() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("osq.db")).await.unwrap();

    assert_eq!(get_setting_i64(&pool, "db_max_lock_wait_ms", 5000).await.unwrap(), 5000);

    set_setting(&pool, "db_max_lock_wait_ms", "250").await.unwrap();
    assert_eq!(get_setting_i64(&pool, "db_max_lock_wait_ms", 5000).await.unwrap(), 250);
}
