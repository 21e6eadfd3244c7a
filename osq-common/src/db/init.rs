//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates every table used by the
//! upload core. Table creation is idempotent and runs on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open the database at `db_path`, creating file, parent folder and schema as needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Per-connection pragmas, applied to every pooled connection.
    // WAL lets UI readers observe snapshots while the upload task writes.
    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(250));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_pending_notes_table(pool).await?;
    create_notes_table(pool).await?;
    create_note_quests_table(pool).await?;
    create_quest_statistics_table(pool).await?;
    create_way_traffic_flow_table(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores runtime key-value settings.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the pending_notes table (the local note queue)
///
/// `element_type` and `element_id` are both NULL or both set.
pub async fn create_pending_notes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending_notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            element_type TEXT,
            element_id INTEGER,
            quest_title TEXT,
            image_paths TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            CHECK ((element_type IS NULL) = (element_id IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the notes table (local mirror of remote notes)
pub async fn create_notes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            closed_at TEXT,
            comments TEXT NOT NULL DEFAULT '[]',
            last_sync TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_position ON notes(latitude, longitude)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the note_quests table (quests derived from notes)
pub async fn create_note_quests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS note_quests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            note_id INTEGER NOT NULL UNIQUE REFERENCES notes(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            last_update TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the quest_statistics table (per quest type answered counters)
pub async fn create_quest_statistics_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quest_statistics (
            quest_type TEXT PRIMARY KEY,
            succeeded INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the way_traffic_flow table (resolved one-way directions)
pub async fn create_way_traffic_flow_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS way_traffic_flow (
            way_id INTEGER PRIMARY KEY,
            is_forward INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
