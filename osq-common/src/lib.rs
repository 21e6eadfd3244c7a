//! # osq Common Library
//!
//! Shared code for the osq upload core:
//! - Error type used by every store and configuration loader
//! - Bootstrap configuration (TOML + environment)
//! - Database pool initialisation and schema
//! - Geographic and map-element value types
//! - Upload event bus

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod geo;

pub use error::{Error, Result};
pub use geo::{BoundingBox, ElementKey, ElementType, LatLon};
