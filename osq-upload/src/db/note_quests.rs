//! Quest records derived from notes

use chrono::Utc;
use osq_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::max_lock_wait_ms;
use crate::models::{NoteQuest, QuestStatus};
use crate::utils::retry_on_lock;

/// Store a quest for a note, replacing an existing quest for the same note.
/// Returns the local quest id.
pub async fn add(pool: &SqlitePool, quest: &NoteQuest) -> Result<i64> {
    let last_update = quest.last_update.to_rfc3339();

    let max_wait_ms = max_lock_wait_ms(pool).await?;
    retry_on_lock("add note quest", max_wait_ms, || async {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO note_quests (note_id, status, last_update) VALUES (?, ?, ?)
            ON CONFLICT(note_id) DO UPDATE SET
                status = excluded.status,
                last_update = excluded.last_update
            RETURNING id
            "#,
        )
        .bind(quest.note_id)
        .bind(quest.status.as_str())
        .bind(&last_update)
        .fetch_one(pool)
        .await?;

        Ok::<_, Error>(id)
    })
    .await
}

pub async fn get_by_note_id(pool: &SqlitePool, note_id: i64) -> Result<Option<NoteQuest>> {
    let row = sqlx::query(
        "SELECT id, note_id, status, last_update FROM note_quests WHERE note_id = ?",
    )
    .bind(note_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_quest(&r)).transpose()
}

fn row_to_quest(row: &SqliteRow) -> Result<NoteQuest> {
    let status: String = row.try_get("status")?;
    let last_update: String = row.try_get("last_update")?;
    let last_update = chrono::DateTime::parse_from_rfc3339(&last_update)
        .map_err(|e| Error::Internal(format!("Failed to parse last_update: {}", e)))?
        .with_timezone(&Utc);

    Ok(NoteQuest {
        id: Some(row.try_get("id")?),
        note_id: row.try_get("note_id")?,
        status: status.parse::<QuestStatus>()?,
        last_update,
    })
}
