//! Note upload coordinator
//!
//! Drains the pending note queue once per run. For each pending note:
//!
//! 1. If it refers to an element, check the element still exists remotely.
//!    Deleted elements drop the note.
//! 2. Look for an existing note about the same element near the position.
//! 3. Comment on that note if it is open, drop the pending note if it is closed,
//!    otherwise create a new note.
//! 4. Mirror the resulting note locally, mark it as contributed and count it.
//!
//! Notes are processed strictly one after another. A failing note stays queued
//! and does not stop the run; only cancellation does.

use chrono::Utc;
use osq_common::config::TomlConfig;
use osq_common::events::{DiscardReason, EventBus, UploadEvent};
use osq_common::{BoundingBox, ElementKey};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::db::{note_queue, note_quests, notes, statistics};
use crate::error::UploadError;
use crate::models::{Note, NoteQuest, PendingNote};
use crate::remote::{ImageUploadService, RemoteError, RemoteMapService, RemoteNotesService};
use crate::services::note_text;

/// Parameters of the upload run
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSettings {
    /// Client identifier appended to new notes
    pub user_agent: String,
    pub note_search_radius: f64,
    pub note_search_limit: u32,
    pub hide_closed_after_days: u32,
}

impl UploadSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            note_search_radius: config.upload.note_search_radius,
            note_search_limit: config.upload.note_search_limit,
            hide_closed_after_days: config.upload.hide_closed_after_days,
        }
    }
}

/// Counts of one upload run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub discarded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Terminal result of processing one pending note
#[derive(Debug, Clone, PartialEq)]
enum NoteOutcome {
    Uploaded { note: Note, commented: bool },
    Discarded(DiscardReason),
}

pub struct UploadCoordinator {
    db: SqlitePool,
    map: Arc<dyn RemoteMapService>,
    notes: Arc<dyn RemoteNotesService>,
    images: Arc<dyn ImageUploadService>,
    event_bus: EventBus,
    settings: UploadSettings,
}

impl UploadCoordinator {
    pub fn new(
        db: SqlitePool,
        map: Arc<dyn RemoteMapService>,
        notes: Arc<dyn RemoteNotesService>,
        images: Arc<dyn ImageUploadService>,
        event_bus: EventBus,
        settings: UploadSettings,
    ) -> Self {
        Self {
            db,
            map,
            notes,
            images,
            event_bus,
            settings,
        }
    }

    /// Upload every note queued at the start of the run.
    ///
    /// `cancel` is checked before each note; the note in flight always
    /// finishes. When cancelled before the run starts, the queue is not read.
    pub async fn upload(&self, cancel: &CancellationToken) -> Result<UploadSummary, UploadError> {
        let mut summary = UploadSummary::default();

        if cancel.is_cancelled() {
            tracing::info!("Note upload cancelled before start");
            summary.cancelled = true;
            return Ok(summary);
        }

        let pending = note_queue::get_all(&self.db).await?;
        tracing::info!(pending = pending.len(), "Starting note upload");
        self.event_bus.emit_lossy(UploadEvent::UploadStarted {
            pending: pending.len(),
            timestamp: Utc::now(),
        });

        for note in &pending {
            if cancel.is_cancelled() {
                tracing::info!("Note upload cancelled");
                summary.cancelled = true;
                break;
            }

            match self.process(note).await {
                Ok(NoteOutcome::Uploaded {
                    note: uploaded,
                    commented,
                }) => {
                    summary.uploaded += 1;
                    self.event_bus.emit_lossy(UploadEvent::NoteUploaded {
                        pending_note_id: note.id,
                        note_id: uploaded.id,
                        commented,
                        timestamp: Utc::now(),
                    });
                }
                Ok(NoteOutcome::Discarded(reason)) => {
                    summary.discarded += 1;
                    self.event_bus.emit_lossy(UploadEvent::NoteDiscarded {
                        pending_note_id: note.id,
                        element: note.element,
                        reason,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        pending_note_id = note.id,
                        error = %e,
                        "Failed to upload {}, keeping it queued",
                        note.log_label()
                    );
                    summary.failed += 1;
                    self.event_bus.emit_lossy(UploadEvent::NoteFailed {
                        pending_note_id: note.id,
                        message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }

        tracing::info!(
            uploaded = summary.uploaded,
            discarded = summary.discarded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Note upload finished"
        );
        self.event_bus.emit_lossy(UploadEvent::UploadFinished {
            uploaded: summary.uploaded,
            discarded: summary.discarded,
            failed: summary.failed,
            cancelled: summary.cancelled,
            timestamp: Utc::now(),
        });

        Ok(summary)
    }

    /// Upload a single pending note.
    ///
    /// Returns the created or commented note, or `None` when the pending note
    /// was dropped (element deleted, matching note closed, or conflict).
    pub async fn upload_one(&self, note: &PendingNote) -> Result<Option<Note>, UploadError> {
        match self.process(note).await? {
            NoteOutcome::Uploaded { note, .. } => Ok(Some(note)),
            NoteOutcome::Discarded(_) => Ok(None),
        }
    }

    async fn process(&self, pending: &PendingNote) -> Result<NoteOutcome, UploadError> {
        let Some(element) = pending.element else {
            return self.create_note(pending).await;
        };

        match self.map.get_element(element).await {
            Ok(_) => {}
            Err(RemoteError::NotFound) => {
                tracing::info!(
                    pending_note_id = pending.id,
                    element = %element,
                    "Dropping note, element was deleted"
                );
                return self.discard(pending, DiscardReason::ElementDeleted).await;
            }
            Err(e) => return Err(e.into()),
        }

        let Some(existing) = self.find_note_about(pending, element).await? else {
            return self.create_note(pending).await;
        };

        if !existing.is_open() {
            tracing::info!(
                pending_note_id = pending.id,
                note_id = existing.id,
                "Dropping note, note about the element is already closed"
            );
            return self.discard(pending, DiscardReason::NoteClosed).await;
        }

        let photo_urls = self.upload_photos(pending).await;
        let body = note_text::with_photo_links(note_text::comment_body(pending), &photo_urls);

        match self.notes.comment(existing.id, &body).await {
            Ok(note) => {
                tracing::info!(
                    pending_note_id = pending.id,
                    note_id = note.id,
                    "Commented on existing note"
                );
                self.on_uploaded(pending, note, true, &photo_urls).await
            }
            Err(RemoteError::Conflict(reason)) => {
                tracing::info!(
                    pending_note_id = pending.id,
                    note_id = existing.id,
                    reason = %reason,
                    "Dropping note, note was closed in the meantime"
                );
                self.discard(pending, DiscardReason::Conflict).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_note(&self, pending: &PendingNote) -> Result<NoteOutcome, UploadError> {
        let photo_urls = self.upload_photos(pending).await;
        let body = note_text::with_photo_links(
            note_text::new_note_body(pending, &self.settings.user_agent),
            &photo_urls,
        );

        let note = self.notes.create(pending.position, &body).await?;
        tracing::info!(
            pending_note_id = pending.id,
            note_id = note.id,
            "Created note"
        );
        self.on_uploaded(pending, note, false, &photo_urls).await
    }

    /// First note near the pending note with a comment referring to `element`
    async fn find_note_about(
        &self,
        pending: &PendingNote,
        element: ElementKey,
    ) -> Result<Option<Note>, UploadError> {
        let pattern = match note_text::marker_pattern(element) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!(element = %element, error = %e, "Invalid element marker pattern");
                return Ok(None);
            }
        };

        let bbox = BoundingBox::around(pending.position, self.settings.note_search_radius);
        let candidates = self
            .notes
            .find_near(
                bbox,
                self.settings.note_search_limit,
                self.settings.hide_closed_after_days,
            )
            .await?;

        Ok(candidates.into_iter().find(|note| {
            note.comments
                .iter()
                .any(|comment| note_text::mentions_element(&comment.text, &pattern))
        }))
    }

    /// Upload attached photos. Failure degrades to a note without photos.
    async fn upload_photos(&self, pending: &PendingNote) -> Vec<String> {
        if pending.image_paths.is_empty() {
            return Vec::new();
        }

        match self.images.upload(&pending.image_paths).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(
                    pending_note_id = pending.id,
                    error = %e,
                    "Photo upload failed, uploading note without photos"
                );
                Vec::new()
            }
        }
    }

    async fn on_uploaded(
        &self,
        pending: &PendingNote,
        note: Note,
        commented: bool,
        photo_urls: &[String],
    ) -> Result<NoteOutcome, UploadError> {
        notes::put(&self.db, &note).await?;
        note_quests::add(&self.db, &NoteQuest::contributed(note.id)).await?;
        statistics::add_one_note(&self.db).await?;
        note_queue::delete(&self.db, pending.id).await?;

        if !photo_urls.is_empty() {
            if let Err(e) = self.images.activate(note.id).await {
                tracing::warn!(note_id = note.id, error = %e, "Failed to activate photos");
            }
        }

        Ok(NoteOutcome::Uploaded { note, commented })
    }

    async fn discard(
        &self,
        pending: &PendingNote,
        reason: DiscardReason,
    ) -> Result<NoteOutcome, UploadError> {
        note_queue::delete(&self.db, pending.id).await?;
        Ok(NoteOutcome::Discarded(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = TomlConfig::default();
        config.user_agent = "osq-test".to_string();
        config.upload.note_search_limit = 3;

        let settings = UploadSettings::from_config(&config);
        assert_eq!(settings.user_agent, "osq-test");
        assert_eq!(settings.note_search_limit, 3);
        assert_eq!(settings.note_search_radius, 0.0);
    }
}
