//! Locally created, not yet uploaded note intents

use chrono::{DateTime, Utc};
use osq_common::{ElementKey, LatLon};
use serde::{Deserialize, Serialize};

/// A note intent as submitted by the UI, before the queue assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPendingNote {
    pub text: String,
    pub position: LatLon,
    pub element: Option<ElementKey>,
    /// Title of the quest that could not be answered; ignored without `element`
    pub quest_title: Option<String>,
    pub image_paths: Vec<String>,
}

impl NewPendingNote {
    /// Free-standing note at a position
    pub fn new(text: impl Into<String>, position: LatLon) -> Self {
        Self {
            text: text.into(),
            position,
            element: None,
            quest_title: None,
            image_paths: Vec::new(),
        }
    }

    /// Note about a map element
    pub fn for_element(
        text: impl Into<String>,
        position: LatLon,
        element: ElementKey,
        quest_title: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            position,
            element: Some(element),
            quest_title,
            image_paths: Vec::new(),
        }
    }

    pub fn with_images(mut self, image_paths: Vec<String>) -> Self {
        self.image_paths = image_paths;
        self
    }
}

/// A queued note intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNote {
    /// Local id, assigned by the queue
    pub id: i64,
    pub text: String,
    pub position: LatLon,
    pub element: Option<ElementKey>,
    pub quest_title: Option<String>,
    pub image_paths: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingNote {
    pub fn has_associated_element(&self) -> bool {
        self.element.is_some()
    }

    /// Quest title, only when there is an element it refers to
    pub fn effective_quest_title(&self) -> Option<&str> {
        self.element.and(self.quest_title.as_deref())
    }

    /// Short description for log lines, never includes the user's text
    pub fn log_label(&self) -> String {
        match &self.element {
            Some(element) => format!("pending note #{} for {}", self.id, element),
            None => format!(
                "pending note #{} at {:.5},{:.5}",
                self.id, self.position.lat, self.position.lon
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osq_common::ElementType;

    fn pending(element: Option<ElementKey>, quest_title: Option<&str>) -> PendingNote {
        PendingNote {
            id: 1,
            text: "jo ho".to_string(),
            position: LatLon::new(1.0, 2.0),
            element,
            quest_title: quest_title.map(str::to_string),
            image_paths: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_quest_title_ignored_without_element() {
        let note = pending(None, Some("What?"));
        assert!(!note.has_associated_element());
        assert_eq!(note.effective_quest_title(), None);
    }

    #[test]
    fn test_quest_title_with_element() {
        let note = pending(Some(ElementKey::new(ElementType::Way, 5)), Some("What?"));
        assert_eq!(note.effective_quest_title(), Some("What?"));
        assert_eq!(note.log_label(), "pending note #1 for way/5");
    }
}
