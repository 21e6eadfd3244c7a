//! Local mirror of remote notes

use chrono::{DateTime, Utc};
use osq_common::{Error, LatLon, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::max_lock_wait_ms;
use crate::models::{Note, NoteComment, NoteStatus};
use crate::utils::retry_on_lock;

/// Insert or replace a note snapshot
pub async fn put(pool: &SqlitePool, note: &Note) -> Result<()> {
    let comments = serde_json::to_string(&note.comments)
        .map_err(|e| Error::Internal(format!("Failed to serialize comments: {}", e)))?;
    let created_at = note.created_at.to_rfc3339();
    let closed_at = note.closed_at.map(|dt| dt.to_rfc3339());
    let last_sync = Utc::now().to_rfc3339();

    let max_wait_ms = max_lock_wait_ms(pool).await?;
    retry_on_lock("put note", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO notes (
                id, latitude, longitude, status, created_at, closed_at, comments, last_sync
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                status = excluded.status,
                closed_at = excluded.closed_at,
                comments = excluded.comments,
                last_sync = excluded.last_sync
            "#,
        )
        .bind(note.id)
        .bind(note.position.lat)
        .bind(note.position.lon)
        .bind(note.status.as_str())
        .bind(&created_at)
        .bind(&closed_at)
        .bind(&comments)
        .bind(&last_sync)
        .execute(pool)
        .await?;

        Ok::<_, Error>(())
    })
    .await
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Note>> {
    let row = sqlx::query(
        r#"
        SELECT id, latitude, longitude, status, created_at, closed_at, comments
        FROM notes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_note(&r)).transpose()
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn row_to_note(row: &SqliteRow) -> Result<Note> {
    let status: String = row.try_get("status")?;
    let status: NoteStatus = status.parse()?;

    let comments: String = row.try_get("comments")?;
    let comments: Vec<NoteComment> = serde_json::from_str(&comments)
        .map_err(|e| Error::Internal(format!("Failed to deserialize comments: {}", e)))?;

    let created_at: String = row.try_get("created_at")?;
    let closed_at: Option<String> = row.try_get("closed_at")?;

    Ok(Note {
        id: row.try_get("id")?,
        position: LatLon::new(row.try_get("latitude")?, row.try_get("longitude")?),
        status,
        created_at: parse_timestamp(&created_at, "created_at")?,
        closed_at: closed_at
            .map(|s| parse_timestamp(&s, "closed_at"))
            .transpose()?,
        comments,
    })
}
