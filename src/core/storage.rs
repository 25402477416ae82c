//! Artifact store client: bucket ensure and artifact upload.

use std::sync::Arc;

use tracing::info;

use crate::domain::{Artifact, Bucket};
use crate::error::{Error, Result};
use crate::providers::ObjectStore;

/// Storage class for buckets this tool creates
const STORAGE_CLASS: &str = "STANDARD";

/// Multi-region location for buckets this tool creates
const LOCATION: &str = "US";

/// Client for getting the artifact into durable storage
pub struct ArtifactStore {
    store: Arc<dyn ObjectStore>,
    project: String,
}

impl ArtifactStore {
    pub fn new(store: Arc<dyn ObjectStore>, project: impl Into<String>) -> Self {
        Self {
            store,
            project: project.into(),
        }
    }

    /// Fetch the bucket by name, creating it if truly absent.
    ///
    /// An existing bucket is the success path. Lookup failures other than
    /// not-found propagate rather than triggering a duplicate create.
    pub async fn ensure_bucket(&self, name: &str) -> Result<Bucket> {
        if let Some(bucket) = self.store.get_bucket(name).await? {
            info!(bucket = %name, "bucket already exists");
            return Ok(bucket);
        }

        let bucket = self
            .store
            .create_bucket(&self.project, name, STORAGE_CLASS, LOCATION)
            .await?;
        info!(
            bucket = %bucket.name,
            location = bucket.location.as_deref().unwrap_or(LOCATION),
            "created bucket"
        );
        Ok(bucket)
    }

    /// Stream the artifact's bytes into a blob named after its base
    /// filename, fully overwriting any prior blob of that name.
    pub async fn upload(&self, bucket: &Bucket, artifact: &Artifact) -> Result<()> {
        let bytes = tokio::fs::read(&artifact.staging_path)
            .await
            .map_err(|e| Error::Store(format!("reading artifact for upload: {}", e)))?;

        self.store
            .put_object(&bucket.name, &artifact.blob_name, bytes)
            .await?;

        info!(
            bucket = %bucket.name,
            blob = %artifact.blob_name,
            size_bytes = artifact.size_bytes,
            "artifact uploaded"
        );
        Ok(())
    }
}
