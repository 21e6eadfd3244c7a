//! Local quest records derived from notes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    New,
    Answered,
    Hidden,
    /// User already contributed to the note; not shown as a quest again
    Closed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::New => "new",
            QuestStatus::Answered => "answered",
            QuestStatus::Hidden => "hidden",
            QuestStatus::Closed => "closed",
        }
    }
}

impl FromStr for QuestStatus {
    type Err = osq_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(QuestStatus::New),
            "answered" => Ok(QuestStatus::Answered),
            "hidden" => Ok(QuestStatus::Hidden),
            "closed" => Ok(QuestStatus::Closed),
            other => Err(osq_common::Error::InvalidInput(format!(
                "unknown quest status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteQuest {
    /// Local id, `None` until stored
    pub id: Option<i64>,
    pub note_id: i64,
    pub status: QuestStatus,
    pub last_update: DateTime<Utc>,
}

impl NoteQuest {
    /// Marker quest for a note this user created or commented on
    pub fn contributed(note_id: i64) -> Self {
        Self {
            id: None,
            note_id,
            status: QuestStatus::Closed,
            last_update: Utc::now(),
        }
    }
}
