//! Photo hosting client for note attachments
//!
//! Uploaded photos are only reachable at their `future_url` once activated for
//! the note that links them.

use async_trait::async_trait;
use osq_common::config::TomlConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ImageUploadError, ImageUploadService};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    future_url: String,
}

#[derive(Debug, Serialize)]
struct ActivateRequest {
    osm_note_id: i64,
}

pub struct PhotoServiceClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PhotoServiceClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ImageUploadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ImageUploadError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, ImageUploadError> {
        Self::new(
            config.photo_service_url.clone(),
            &config.user_agent,
            config.upload.request_timeout(),
        )
    }

    async fn upload_one(&self, path: &str) -> Result<String, ImageUploadError> {
        let bytes = tokio::fs::read(path).await?;

        let response = self
            .http_client
            .post(format!("{}/upload.php", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .header("Content-Transfer-Encoding", "binary")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ImageUploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ImageUploadError::Api(status.as_u16(), error_text));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| ImageUploadError::Parse(e.to_string()))?;

        Ok(upload.future_url)
    }
}

#[async_trait]
impl ImageUploadService for PhotoServiceClient {
    async fn upload(&self, image_paths: &[String]) -> Result<Vec<String>, ImageUploadError> {
        let mut urls = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            urls.push(self.upload_one(path).await?);
        }
        tracing::debug!(count = urls.len(), "Uploaded photos");
        Ok(urls)
    }

    async fn activate(&self, note_id: i64) -> Result<(), ImageUploadError> {
        let response = self
            .http_client
            .post(format!("{}/activate.php", self.base_url))
            .json(&ActivateRequest {
                osm_note_id: note_id,
            })
            .send()
            .await
            .map_err(|e| ImageUploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ImageUploadError::Api(status.as_u16(), error_text));
        }

        tracing::debug!(note_id, "Activated photos");
        Ok(())
    }
}
