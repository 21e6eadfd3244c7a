//! Composition of uploaded note texts and recognition of element markers

use osq_common::ElementKey;
use regex::Regex;

use crate::models::PendingNote;

/// Reference to `element` embedded in the opening comment of a note about it
pub fn element_marker(element: ElementKey) -> String {
    format!(
        "https://osm.org/{}/{}",
        element.element_type.as_str(),
        element.id
    )
}

/// Pattern recognizing references to `element`, either as `way #5` or as an
/// `osm.org/way/5` / `openstreetmap.org/way/5` link
pub fn marker_pattern(element: ElementKey) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)(?:{kind}\s*#{id}|(?:osm|openstreetmap)\.org/{kind}/{id})(?:\D|$)",
        kind = element.element_type.as_str(),
        id = element.id
    ))
}

/// Whether `text` contains a reference matched by `pattern`
pub fn mentions_element(text: &str, pattern: &Regex) -> bool {
    pattern.is_match(text)
}

/// Body of a new note for `note`, attributed to `user_agent`
pub fn new_note_body(note: &PendingNote, user_agent: &str) -> String {
    match note.element {
        None => format!("{}\n\nvia {}", note.text, user_agent),
        Some(element) => {
            let header = match note.effective_quest_title() {
                Some(title) => format!(
                    "Unable to answer \"{}\" for {} via {}",
                    title,
                    element_marker(element),
                    user_agent
                ),
                None => format!("for {} via {}", element_marker(element), user_agent),
            };
            format!("{}:\n\n{}", header, note.text)
        }
    }
}

/// Body of a comment on an existing note
pub fn comment_body(note: &PendingNote) -> String {
    note.text.clone()
}

/// Append links to uploaded photos, if any
pub fn with_photo_links(body: String, photo_urls: &[String]) -> String {
    if photo_urls.is_empty() {
        return body;
    }
    format!("{}\n\nAttached photo(s):\n{}", body, photo_urls.join("\n"))
}
