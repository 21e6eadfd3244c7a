//! Remote services used by the upload core
//!
//! Each service is a trait so the coordinator can be driven by the HTTP
//! clients in production and by recording fakes in tests.

pub mod osm_api;
pub mod photo_service;

use async_trait::async_trait;
use osq_common::{BoundingBox, ElementKey, LatLon};
use std::collections::HashMap;
use thiserror::Error;

use crate::models::Note;

pub use osm_api::OsmApiClient;
pub use photo_service::PhotoServiceClient;

/// Errors of the map data and notes services
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not authorized")]
    Unauthorized,
}

/// Errors of the image upload service
#[derive(Debug, Error)]
pub enum ImageUploadError {
    #[error("Cannot read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A map element as far as the upload core cares about it
#[derive(Debug, Clone, PartialEq)]
pub struct MapElement {
    pub key: ElementKey,
    pub version: i64,
    pub tags: HashMap<String, String>,
}

/// Read access to map elements
#[async_trait]
pub trait RemoteMapService: Send + Sync {
    /// Fetch an element; [`RemoteError::NotFound`] when it was deleted
    async fn get_element(&self, key: ElementKey) -> Result<MapElement, RemoteError>;
}

/// The collaborative notes service
#[async_trait]
pub trait RemoteNotesService: Send + Sync {
    /// Notes within `bbox`, open ones plus those closed less than
    /// `hide_closed_after_days` ago
    async fn find_near(
        &self,
        bbox: BoundingBox,
        limit: u32,
        hide_closed_after_days: u32,
    ) -> Result<Vec<Note>, RemoteError>;

    async fn create(&self, position: LatLon, text: &str) -> Result<Note, RemoteError>;

    /// Comment on an open note; [`RemoteError::Conflict`] when it is closed
    async fn comment(&self, note_id: i64, text: &str) -> Result<Note, RemoteError>;
}

/// Photo hosting for note attachments
#[async_trait]
pub trait ImageUploadService: Send + Sync {
    /// Upload local images, returning their public URLs in the same order
    async fn upload(&self, image_paths: &[String]) -> Result<Vec<String>, ImageUploadError>;

    /// Make photos referenced by `note_id` permanent
    async fn activate(&self, note_id: i64) -> Result<(), ImageUploadError>;
}
