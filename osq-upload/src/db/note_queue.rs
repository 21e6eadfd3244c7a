//! Durable queue of pending note intents

use chrono::Utc;
use osq_common::{ElementKey, ElementType, Error, LatLon, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::max_lock_wait_ms;
use crate::models::{NewPendingNote, PendingNote};
use crate::utils::retry_on_lock;

/// Enqueue a note intent, returning its local id
pub async fn add(pool: &SqlitePool, note: &NewPendingNote) -> Result<i64> {
    let element_type = note.element.map(|e| e.element_type.as_str());
    let element_id = note.element.map(|e| e.id);
    let image_paths = serde_json::to_string(&note.image_paths)
        .map_err(|e| Error::Internal(format!("Failed to serialize image paths: {}", e)))?;
    let created_at = Utc::now().to_rfc3339();

    let max_wait_ms = max_lock_wait_ms(pool).await?;
    retry_on_lock("enqueue pending note", max_wait_ms, || async {
        let result = sqlx::query(
            r#"
            INSERT INTO pending_notes (
                text, latitude, longitude, element_type, element_id,
                quest_title, image_paths, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.text)
        .bind(note.position.lat)
        .bind(note.position.lon)
        .bind(element_type)
        .bind(element_id)
        .bind(&note.quest_title)
        .bind(&image_paths)
        .bind(&created_at)
        .execute(pool)
        .await?;

        Ok::<_, Error>(result.last_insert_rowid())
    })
    .await
}

/// Load one pending note
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<PendingNote>> {
    let row = sqlx::query(
        r#"
        SELECT id, text, latitude, longitude, element_type, element_id,
               quest_title, image_paths, created_at
        FROM pending_notes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_pending_note(&r)).transpose()
}

/// Load all pending notes, oldest first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<PendingNote>> {
    let rows = sqlx::query(
        r#"
        SELECT id, text, latitude, longitude, element_type, element_id,
               quest_title, image_paths, created_at
        FROM pending_notes
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_pending_note).collect()
}

/// Remove a pending note; `false` if it was not queued
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let max_wait_ms = max_lock_wait_ms(pool).await?;
    retry_on_lock("delete pending note", max_wait_ms, || async {
        let result = sqlx::query("DELETE FROM pending_notes WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok::<_, Error>(result.rows_affected() > 0)
    })
    .await
}

/// Number of queued notes
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_notes")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn row_to_pending_note(row: &SqliteRow) -> Result<PendingNote> {
    let element_type: Option<String> = row.try_get("element_type")?;
    let element_id: Option<i64> = row.try_get("element_id")?;
    let element = match (element_type, element_id) {
        (Some(t), Some(id)) => Some(ElementKey::new(t.parse::<ElementType>()?, id)),
        (None, None) => None,
        _ => {
            return Err(Error::InvalidInput(
                "pending note has a partial element reference".to_string(),
            ))
        }
    };

    let image_paths: String = row.try_get("image_paths")?;
    let image_paths: Vec<String> = serde_json::from_str(&image_paths)
        .map_err(|e| Error::Internal(format!("Failed to deserialize image paths: {}", e)))?;

    let created_at: String = row.try_get("created_at")?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(PendingNote {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        position: LatLon::new(row.try_get("latitude")?, row.try_get("longitude")?),
        element,
        quest_title: row.try_get("quest_title")?,
        image_paths,
        created_at,
    })
}
