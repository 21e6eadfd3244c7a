//! Data models for the upload core

pub mod note;
pub mod note_quest;
pub mod pending_note;
pub mod traffic_flow;

pub use note::{CommentAction, Note, NoteComment, NoteStatus};
pub use note_quest::{NoteQuest, QuestStatus};
pub use pending_note::{NewPendingNote, PendingNote};
pub use traffic_flow::{TrafficFlowSegment, WaySegments};
