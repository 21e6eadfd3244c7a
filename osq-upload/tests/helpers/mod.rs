//! Test Helper Utilities
//!
//! Shared utilities for testing osq-upload

#![allow(dead_code)]

pub mod db_utils;
pub mod fakes;

pub use db_utils::{create_memory_db, queue_note};
pub use fakes::{make_note, FakeImages, FakeMap, FakeNotes};
