//! Upload event types and broadcast bus
//!
//! The upload task is the only emitter. Readers (UI, CLI) subscribe and may
//! miss events if they lag; every event is also reflected in the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ElementKey;

/// Why a pending note was dropped without uploading anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The associated element no longer exists remotely
    ElementDeleted,
    /// The matching remote note has been closed already
    NoteClosed,
    /// The remote note changed state while commenting
    Conflict,
}

/// Per-note upload outcome notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UploadEvent {
    /// Upload run started
    UploadStarted {
        pending: usize,
        timestamp: DateTime<Utc>,
    },
    /// A pending note was uploaded as a new note or a comment
    NoteUploaded {
        pending_note_id: i64,
        note_id: i64,
        commented: bool,
        timestamp: DateTime<Utc>,
    },
    /// A pending note was dropped
    NoteDiscarded {
        pending_note_id: i64,
        element: Option<ElementKey>,
        reason: DiscardReason,
        timestamp: DateTime<Utc>,
    },
    /// A pending note failed and stays queued
    NoteFailed {
        pending_note_id: i64,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Upload run finished (completed or cancelled)
    UploadFinished {
        uploaded: usize,
        discarded: usize,
        failed: usize,
        cancelled: bool,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for [`UploadEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UploadEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: UploadEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
