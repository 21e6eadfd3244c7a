//! Error types of the upload core

use thiserror::Error;

use crate::remote::RemoteError;

/// Failure of a single pending note. The note stays queued.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Local store error: {0}")]
    Store(#[from] osq_common::Error),
}

/// Failure of a traffic-flow segment fetch
#[derive(Debug, Error)]
pub enum SegmentFetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed segment payload: {0}")]
    MalformedPayload(String),
}
