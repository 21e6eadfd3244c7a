//! Upload core services

pub mod note_text;
pub mod note_upload;
pub mod segment_fetcher;
pub mod traffic_flow_direction;

pub use note_upload::{UploadCoordinator, UploadSettings, UploadSummary};
pub use segment_fetcher::{parse_segments, SegmentFetcher};
pub use traffic_flow_direction::direction_of;
