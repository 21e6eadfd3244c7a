//! Traffic-flow segment fetcher
//!
//! Fetches the directed segments of one-way roads within a bounding box from
//! the one-way data service and groups them by way id.

use osq_common::config::TomlConfig;
use osq_common::{BoundingBox, LatLon};
use serde::Deserialize;
use std::time::Duration;

use crate::error::SegmentFetchError;
use crate::models::{TrafficFlowSegment, WaySegments};

#[derive(Debug, Deserialize)]
struct SegmentsResponse {
    #[serde(default)]
    segments: Option<Vec<SegmentJson>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentJson {
    way_id: i64,
    from_position: PositionJson,
    to_position: PositionJson,
}

#[derive(Debug, Deserialize)]
struct PositionJson {
    lon: f64,
    lat: f64,
}

impl PositionJson {
    fn lat_lon(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Drop commas that directly precede a closing `]` or `}` outside of string
/// literals, so `[{..},{..},]` reads as a two element list
fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut open_comma: Option<usize> = None;

    for c in json.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            ',' => open_comma = Some(out.len()),
            ']' | '}' => {
                if let Some(at) = open_comma.take() {
                    out.remove(at);
                }
            }
            c if c.is_whitespace() => {}
            '"' => {
                open_comma = None;
                in_string = true;
            }
            _ => open_comma = None,
        }
        out.push(c);
    }
    out
}

/// Parse a segment payload, grouping segments by way id in payload order.
///
/// A missing or empty `segments` list yields an empty map and a trailing comma
/// after the last entry is accepted. Any malformed entry fails the whole
/// payload.
pub fn parse_segments(json: &str) -> Result<WaySegments, SegmentFetchError> {
    let response: SegmentsResponse = serde_json::from_str(&strip_trailing_commas(json))
        .map_err(|e| SegmentFetchError::MalformedPayload(e.to_string()))?;

    let mut result = WaySegments::new();
    for segment in response.segments.unwrap_or_default() {
        result
            .entry(segment.way_id)
            .or_default()
            .push(TrafficFlowSegment::new(
                segment.from_position.lat_lon(),
                segment.to_position.lat_lon(),
            ));
    }
    Ok(result)
}

pub struct SegmentFetcher {
    http_client: reqwest::Client,
    api_url: String,
}

impl SegmentFetcher {
    pub fn new(
        api_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, SegmentFetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SegmentFetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_url: api_url.into(),
        })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, SegmentFetchError> {
        Self::new(
            config.oneway_api_url.clone(),
            &config.user_agent,
            config.upload.request_timeout(),
        )
    }

    pub fn request_url(&self, bbox: &BoundingBox) -> String {
        format!("{}?bbox={}", self.api_url, bbox.to_query_param())
    }

    /// Fetch all traffic-flow segments within `bbox`
    pub async fn fetch(&self, bbox: &BoundingBox) -> Result<WaySegments, SegmentFetchError> {
        let url = self.request_url(bbox);
        tracing::debug!(url = %url, "Fetching traffic-flow segments");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SegmentFetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SegmentFetchError::Api(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SegmentFetchError::Network(e.to_string()))?;

        let segments = parse_segments(&body)?;
        tracing::info!(way_count = segments.len(), "Fetched traffic-flow segments");
        Ok(segments)
    }
}
