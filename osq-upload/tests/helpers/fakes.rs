//! Recording fakes of the remote services

use async_trait::async_trait;
use chrono::Utc;
use osq_common::{BoundingBox, ElementKey, LatLon};
use osq_upload::models::{CommentAction, Note, NoteComment, NoteStatus};
use osq_upload::remote::{
    ImageUploadError, ImageUploadService, MapElement, RemoteError, RemoteMapService,
    RemoteNotesService,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Remote note with a single opening comment
pub fn make_note(id: i64, status: NoteStatus, opening_text: &str) -> Note {
    Note {
        id,
        position: LatLon::new(1.0, 2.0),
        status,
        created_at: Utc::now(),
        closed_at: None,
        comments: vec![NoteComment {
            date: Utc::now(),
            action: CommentAction::Opened,
            text: opening_text.to_string(),
            user_id: None,
            user_name: None,
        }],
    }
}

/// Map service knowing a fixed set of elements; everything else is deleted
#[derive(Default)]
pub struct FakeMap {
    pub existing: Mutex<HashSet<ElementKey>>,
    pub requested: Mutex<Vec<ElementKey>>,
    pub offline: Mutex<bool>,
}

impl FakeMap {
    pub fn with_elements(elements: &[ElementKey]) -> Self {
        let map = Self::default();
        map.existing.lock().unwrap().extend(elements.iter().copied());
        map
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteMapService for FakeMap {
    async fn get_element(&self, key: ElementKey) -> Result<MapElement, RemoteError> {
        self.requested.lock().unwrap().push(key);
        if *self.offline.lock().unwrap() {
            return Err(RemoteError::Network("offline".to_string()));
        }
        if self.existing.lock().unwrap().contains(&key) {
            Ok(MapElement {
                key,
                version: 1,
                tags: HashMap::new(),
            })
        } else {
            Err(RemoteError::NotFound)
        }
    }
}

/// Notes service returning preset nearby notes and recording uploads
pub struct FakeNotes {
    pub nearby: Mutex<Vec<Note>>,
    pub find_calls: Mutex<Vec<BoundingBox>>,
    pub created: Mutex<Vec<(LatLon, String)>>,
    pub comments: Mutex<Vec<(i64, String)>>,
    /// Answer every comment with a conflict
    pub conflict_on_comment: Mutex<bool>,
    /// Creating a note whose text contains this fails with a network error
    pub fail_create_containing: Mutex<Option<String>>,
    /// Cancelled as soon as a note is created
    pub cancel_on_create: Mutex<Option<CancellationToken>>,
    next_id: Mutex<i64>,
}

impl Default for FakeNotes {
    fn default() -> Self {
        Self {
            nearby: Mutex::new(Vec::new()),
            find_calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            conflict_on_comment: Mutex::new(false),
            fail_create_containing: Mutex::new(None),
            cancel_on_create: Mutex::new(None),
            next_id: Mutex::new(100),
        }
    }
}

impl FakeNotes {
    pub fn with_nearby(notes: Vec<Note>) -> Self {
        let fake = Self::default();
        *fake.nearby.lock().unwrap() = notes;
        fake
    }

    pub fn calls(&self) -> usize {
        self.find_calls.lock().unwrap().len()
            + self.created.lock().unwrap().len()
            + self.comments.lock().unwrap().len()
    }

    pub fn created_texts(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteNotesService for FakeNotes {
    async fn find_near(
        &self,
        bbox: BoundingBox,
        _limit: u32,
        _hide_closed_after_days: u32,
    ) -> Result<Vec<Note>, RemoteError> {
        self.find_calls.lock().unwrap().push(bbox);
        Ok(self.nearby.lock().unwrap().clone())
    }

    async fn create(&self, position: LatLon, text: &str) -> Result<Note, RemoteError> {
        self.created
            .lock()
            .unwrap()
            .push((position, text.to_string()));

        if let Some(token) = self.cancel_on_create.lock().unwrap().as_ref() {
            token.cancel();
        }

        if let Some(marker) = self.fail_create_containing.lock().unwrap().as_ref() {
            if text.contains(marker.as_str()) {
                return Err(RemoteError::Network("connection reset".to_string()));
            }
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let mut note = make_note(*next_id, NoteStatus::Open, text);
        note.position = position;
        Ok(note)
    }

    async fn comment(&self, note_id: i64, text: &str) -> Result<Note, RemoteError> {
        self.comments
            .lock()
            .unwrap()
            .push((note_id, text.to_string()));

        if *self.conflict_on_comment.lock().unwrap() {
            return Err(RemoteError::Conflict("note is closed".to_string()));
        }

        let mut note = self
            .nearby
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == note_id)
            .cloned()
            .ok_or(RemoteError::NotFound)?;
        note.comments.push(NoteComment {
            date: Utc::now(),
            action: CommentAction::Commented,
            text: text.to_string(),
            user_id: None,
            user_name: None,
        });
        Ok(note)
    }
}

/// Photo service mapping each path to `url of {path}`
#[derive(Default)]
pub struct FakeImages {
    pub uploads: Mutex<Vec<Vec<String>>>,
    pub activated: Mutex<Vec<i64>>,
    pub fail_upload: Mutex<bool>,
}

impl FakeImages {
    pub fn failing() -> Self {
        let fake = Self::default();
        *fake.fail_upload.lock().unwrap() = true;
        fake
    }
}

#[async_trait]
impl ImageUploadService for FakeImages {
    async fn upload(&self, image_paths: &[String]) -> Result<Vec<String>, ImageUploadError> {
        self.uploads.lock().unwrap().push(image_paths.to_vec());
        if *self.fail_upload.lock().unwrap() {
            return Err(ImageUploadError::Api(500, "photo service down".to_string()));
        }
        Ok(image_paths
            .iter()
            .map(|p| format!("url of {}", p))
            .collect())
    }

    async fn activate(&self, note_id: i64) -> Result<(), ImageUploadError> {
        self.activated.lock().unwrap().push(note_id);
        Ok(())
    }
}
