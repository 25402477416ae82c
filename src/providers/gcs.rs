//! GCS-flavored object storage REST client.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::Bucket;
use crate::error::{Error, Result};

use super::ObjectStore;

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// REST client for a GCS-shaped object store
pub struct GcsStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GcsStore {
    /// Create a client using the supplied bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at a different API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn get_bucket(&self, name: &str) -> Result<Option<Bucket>> {
        let url = format!("{}/storage/v1/b/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Store(format!("bucket lookup failed: {}", e)))?;

        // Only a true not-found maps to None; authorization and transient
        // failures must not trigger a duplicate create
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "bucket lookup returned {}: {}",
                status,
                body.trim()
            )));
        }

        let bucket = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("bucket response was not valid JSON: {}", e)))?;
        Ok(Some(bucket))
    }

    async fn create_bucket(
        &self,
        project: &str,
        name: &str,
        storage_class: &str,
        location: &str,
    ) -> Result<Bucket> {
        debug!(bucket = %name, %location, "creating bucket");

        let url = format!("{}/storage/v1/b?project={}", self.base_url, project);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "name": name,
                "storageClass": storage_class,
                "location": location,
            }))
            .send()
            .await
            .map_err(|e| Error::Store(format!("bucket create failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "bucket create returned {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Store(format!("bucket response was not valid JSON: {}", e)))
    }

    async fn put_object(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> Result<()> {
        debug!(%bucket, blob = %name, size = bytes.len(), "uploading blob");

        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.base_url, bucket, name
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Store(format!("blob upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "blob upload returned {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(())
    }
}
