//! Notes as known to the remote notes service

use chrono::{DateTime, Utc};
use osq_common::LatLon;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Open,
    Closed,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Open => "open",
            NoteStatus::Closed => "closed",
        }
    }
}

impl FromStr for NoteStatus {
    type Err = osq_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(NoteStatus::Open),
            "closed" => Ok(NoteStatus::Closed),
            // hidden notes are invisible to normal users, treat them as resolved
            "hidden" => Ok(NoteStatus::Closed),
            other => Err(osq_common::Error::InvalidInput(format!(
                "unknown note status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentAction {
    Opened,
    Commented,
    Closed,
    Reopened,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteComment {
    pub date: DateTime<Utc>,
    pub action: CommentAction,
    pub text: String,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
}

/// Snapshot of a remote note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub position: LatLon,
    pub status: NoteStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Oldest first
    pub comments: Vec<NoteComment>,
}

impl Note {
    pub fn is_open(&self) -> bool {
        self.status == NoteStatus::Open
    }

    /// Text of the comment that opened the note
    pub fn opening_text(&self) -> Option<&str> {
        self.comments.first().map(|c| c.text.as_str())
    }
}
