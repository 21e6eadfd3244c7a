//! osq-upload library
//!
//! Upload core of the survey application: drains locally queued notes to the
//! OSM notes service and fetches traffic-flow segments of one-way roads.

pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod utils;

pub use error::{SegmentFetchError, UploadError};
