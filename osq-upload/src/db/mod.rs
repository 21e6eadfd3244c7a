//! Local persistence for the upload core
//!
//! Every module is a set of functions over the shared `SqlitePool`; the schema
//! is created by `osq_common::db::init_database`.

pub mod note_queue;
pub mod note_quests;
pub mod notes;
pub mod statistics;
pub mod way_traffic_flow;

use osq_common::Result;
use sqlx::SqlitePool;

/// Settings key bounding the lock retry of local writes
pub const MAX_LOCK_WAIT_SETTING: &str = "db_max_lock_wait_ms";
const DEFAULT_MAX_LOCK_WAIT_MS: i64 = 5000;

/// Lock retry budget from the settings table (default 5000ms)
pub(crate) async fn max_lock_wait_ms(pool: &SqlitePool) -> Result<u64> {
    let ms = osq_common::db::get_setting_i64(pool, MAX_LOCK_WAIT_SETTING, DEFAULT_MAX_LOCK_WAIT_MS)
        .await?;
    Ok(ms.max(0) as u64)
}
