//! Database Test Utilities

use osq_upload::db::note_queue;
use osq_upload::models::{NewPendingNote, PendingNote};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// In-memory database with the full schema.
///
/// A single connection, so every query sees the same in-memory database.
pub async fn create_memory_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    osq_common::db::create_schema(&pool).await.unwrap();
    pool
}

/// Enqueue `note` and load it back as the coordinator would see it
pub async fn queue_note(pool: &SqlitePool, note: NewPendingNote) -> PendingNote {
    let id = note_queue::add(pool, &note).await.unwrap();
    note_queue::get(pool, id).await.unwrap().unwrap()
}
