//! Resolved traffic-flow direction per way

use osq_common::{Error, Result};
use sqlx::SqlitePool;

use super::max_lock_wait_ms;
use crate::utils::retry_on_lock;

/// Remember whether traffic on `way_id` flows in the direction of its nodes
pub async fn put(pool: &SqlitePool, way_id: i64, is_forward: bool) -> Result<()> {
    let max_wait_ms = max_lock_wait_ms(pool).await?;
    retry_on_lock("put way traffic flow", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO way_traffic_flow (way_id, is_forward) VALUES (?, ?)
            ON CONFLICT(way_id) DO UPDATE SET is_forward = excluded.is_forward
            "#,
        )
        .bind(way_id)
        .bind(is_forward)
        .execute(pool)
        .await?;
        Ok::<_, Error>(())
    })
    .await
}

/// `None` when the direction of the way is unknown
pub async fn is_forward(pool: &SqlitePool, way_id: i64) -> Result<Option<bool>> {
    let value: Option<bool> =
        sqlx::query_scalar("SELECT is_forward FROM way_traffic_flow WHERE way_id = ?")
            .bind(way_id)
            .fetch_optional(pool)
            .await?;
    Ok(value)
}

pub async fn delete(pool: &SqlitePool, way_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM way_traffic_flow WHERE way_id = ?")
        .bind(way_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
