//! OSM API 0.6 client (map data and notes, JSON flavour)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use osq_common::config::TomlConfig;
use osq_common::{BoundingBox, ElementKey, LatLon};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{MapElement, RemoteError, RemoteMapService, RemoteNotesService};
use crate::models::{CommentAction, Note, NoteComment, NoteStatus};

/// Date format of the notes API, e.g. `2013-04-24 08:07:02 UTC`
const NOTE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Deserialize)]
struct ElementsResponse {
    #[serde(default)]
    elements: Vec<ElementJson>,
}

#[derive(Debug, Deserialize)]
struct ElementJson {
    id: i64,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NoteCollection {
    #[serde(default)]
    features: Vec<NoteFeature>,
}

#[derive(Debug, Deserialize)]
struct NoteFeature {
    geometry: PointGeometry,
    properties: NoteProperties,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// `[lon, lat]`
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct NoteProperties {
    id: i64,
    status: String,
    date_created: String,
    #[serde(default)]
    closed_at: Option<String>,
    #[serde(default)]
    comments: Vec<CommentJson>,
}

#[derive(Debug, Deserialize)]
struct CommentJson {
    date: String,
    action: CommentAction,
    #[serde(default)]
    text: String,
    #[serde(default)]
    uid: Option<i64>,
    #[serde(default)]
    user: Option<String>,
}

fn parse_note_date(value: &str) -> Result<DateTime<Utc>, RemoteError> {
    NaiveDateTime::parse_from_str(value, NOTE_DATE_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| RemoteError::Parse(format!("invalid note date '{}': {}", value, e)))
}

impl NoteFeature {
    fn into_note(self) -> Result<Note, RemoteError> {
        let props = self.properties;
        let [lon, lat] = self.geometry.coordinates;

        let status: NoteStatus = props
            .status
            .parse()
            .map_err(|e: osq_common::Error| RemoteError::Parse(e.to_string()))?;

        let comments = props
            .comments
            .into_iter()
            .map(|c| {
                Ok(NoteComment {
                    date: parse_note_date(&c.date)?,
                    action: c.action,
                    text: c.text,
                    user_id: c.uid,
                    user_name: c.user,
                })
            })
            .collect::<Result<Vec<_>, RemoteError>>()?;

        Ok(Note {
            id: props.id,
            position: LatLon::new(lat, lon),
            status,
            created_at: parse_note_date(&props.date_created)?,
            closed_at: props.closed_at.as_deref().map(parse_note_date).transpose()?,
            comments,
        })
    }
}

/// Parse a single GeoJSON note feature
pub fn parse_note(json: &str) -> Result<Note, RemoteError> {
    let feature: NoteFeature =
        serde_json::from_str(json).map_err(|e| RemoteError::Parse(e.to_string()))?;
    feature.into_note()
}

/// Parse a GeoJSON feature collection of notes
pub fn parse_notes(json: &str) -> Result<Vec<Note>, RemoteError> {
    let collection: NoteCollection =
        serde_json::from_str(json).map_err(|e| RemoteError::Parse(e.to_string()))?;
    collection
        .features
        .into_iter()
        .map(NoteFeature::into_note)
        .collect()
}

/// HTTP client for the OSM API
pub struct OsmApiClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl OsmApiClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, RemoteError> {
        Self::new(
            config.osm_api_url.clone(),
            config.osm_access_token.clone(),
            &config.user_agent,
            config.upload.request_timeout(),
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and map error statuses to [`RemoteError`], returning the body
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        match status.as_u16() {
            _ if status.is_success() => Ok(body),
            401 | 403 => Err(RemoteError::Unauthorized),
            404 | 410 => Err(RemoteError::NotFound),
            409 => Err(RemoteError::Conflict(body)),
            code => Err(RemoteError::Api(code, body)),
        }
    }
}

#[async_trait]
impl RemoteMapService for OsmApiClient {
    async fn get_element(&self, key: ElementKey) -> Result<MapElement, RemoteError> {
        let url = format!(
            "{}/{}/{}.json",
            self.base_url,
            key.element_type.as_str(),
            key.id
        );
        tracing::debug!(element = %key, "Fetching element");

        let body = self.send(self.http_client.get(&url)).await?;
        let response: ElementsResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Parse(e.to_string()))?;

        let element = response
            .elements
            .into_iter()
            .find(|e| e.id == key.id)
            .ok_or(RemoteError::NotFound)?;

        Ok(MapElement {
            key,
            version: element.version,
            tags: element.tags,
        })
    }
}

#[async_trait]
impl RemoteNotesService for OsmApiClient {
    async fn find_near(
        &self,
        bbox: BoundingBox,
        limit: u32,
        hide_closed_after_days: u32,
    ) -> Result<Vec<Note>, RemoteError> {
        let url = format!("{}/notes.json", self.base_url);
        let request = self.http_client.get(&url).query(&[
            ("bbox", bbox.to_query_param()),
            ("limit", limit.to_string()),
            ("closed", hide_closed_after_days.to_string()),
        ]);

        let body = self.send(request).await?;
        let notes = parse_notes(&body)?;
        tracing::debug!(count = notes.len(), bbox = %bbox.to_query_param(), "Fetched notes");
        Ok(notes)
    }

    async fn create(&self, position: LatLon, text: &str) -> Result<Note, RemoteError> {
        let url = format!("{}/notes.json", self.base_url);
        let request = self.http_client.post(&url).query(&[
            ("lat", position.lat.to_string()),
            ("lon", position.lon.to_string()),
            ("text", text.to_string()),
        ]);

        let body = self.send(request).await?;
        let note = parse_note(&body)?;
        tracing::info!(note_id = note.id, "Created note");
        Ok(note)
    }

    async fn comment(&self, note_id: i64, text: &str) -> Result<Note, RemoteError> {
        let url = format!("{}/notes/{}/comment.json", self.base_url, note_id);
        let request = self.http_client.post(&url).query(&[("text", text)]);

        let body = self.send(request).await?;
        let note = parse_note(&body)?;
        tracing::info!(note_id = note.id, "Commented on note");
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE_FEATURE: &str = r#"{
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [13.4, 52.5]},
        "properties": {
            "id": 123,
            "url": "https://api.openstreetmap.org/api/0.6/notes/123.json",
            "status": "closed",
            "date_created": "2023-04-24 08:07:02 UTC",
            "closed_at": "2023-04-25 10:00:00 UTC",
            "comments": [
                {
                    "date": "2023-04-24 08:07:02 UTC",
                    "uid": 7,
                    "user": "mapper",
                    "action": "opened",
                    "text": "for https://osm.org/way/5 via osq:\n\nwrong name",
                    "html": "<p>wrong name</p>"
                },
                {
                    "date": "2023-04-25 10:00:00 UTC",
                    "action": "closed",
                    "text": ""
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_note_feature() {
        let note = parse_note(NOTE_FEATURE).unwrap();

        assert_eq!(note.id, 123);
        assert_eq!(note.position, LatLon::new(52.5, 13.4));
        assert_eq!(note.status, NoteStatus::Closed);
        assert!(note.closed_at.is_some());
        assert_eq!(note.comments.len(), 2);
        assert_eq!(note.comments[0].action, CommentAction::Opened);
        assert_eq!(note.comments[0].user_id, Some(7));
        assert_eq!(note.comments[1].user_name, None);
        assert_eq!(
            note.opening_text(),
            Some("for https://osm.org/way/5 via osq:\n\nwrong name")
        );
    }

    #[test]
    fn test_parse_empty_collection() {
        let notes = parse_notes(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_parse_invalid_date() {
        let json = NOTE_FEATURE.replace("2023-04-24 08:07:02 UTC", "yesterday");
        assert!(matches!(parse_note(&json), Err(RemoteError::Parse(_))));
    }

    #[test]
    fn test_client_creation() {
        let client = OsmApiClient::new(
            "https://api.example.org/api/0.6/",
            None,
            "osq-test",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.example.org/api/0.6");
    }
}
