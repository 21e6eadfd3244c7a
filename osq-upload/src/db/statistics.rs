//! Per quest type answered counters

use osq_common::{Error, Result};
use sqlx::SqlitePool;

use super::max_lock_wait_ms;
use crate::utils::retry_on_lock;

/// Counter key for notes created or commented by this user
pub const NOTE_QUEST_TYPE: &str = "OsmNoteQuestType";

/// Increment the counter of `quest_type` by one
pub async fn add_one(pool: &SqlitePool, quest_type: &str) -> Result<()> {
    let max_wait_ms = max_lock_wait_ms(pool).await?;
    retry_on_lock("increment quest statistics", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO quest_statistics (quest_type, succeeded) VALUES (?, 1)
            ON CONFLICT(quest_type) DO UPDATE SET succeeded = succeeded + 1
            "#,
        )
        .bind(quest_type)
        .execute(pool)
        .await?;
        Ok::<_, Error>(())
    })
    .await
}

pub async fn add_one_note(pool: &SqlitePool) -> Result<()> {
    add_one(pool, NOTE_QUEST_TYPE).await
}

pub async fn get_amount(pool: &SqlitePool, quest_type: &str) -> Result<i64> {
    let amount: Option<i64> =
        sqlx::query_scalar("SELECT succeeded FROM quest_statistics WHERE quest_type = ?")
            .bind(quest_type)
            .fetch_optional(pool)
            .await?;
    Ok(amount.unwrap_or(0))
}

pub async fn get_note_amount(pool: &SqlitePool) -> Result<i64> {
    get_amount(pool, NOTE_QUEST_TYPE).await
}

/// Sum over all quest types
pub async fn total(pool: &SqlitePool) -> Result<i64> {
    let total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(succeeded), 0) FROM quest_statistics")
            .fetch_one(pool)
            .await?;
    Ok(total)
}
