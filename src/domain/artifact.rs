//! The packaged application payload shipped to the instance.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A packaged application artifact
///
/// Produced once per deployment run and immutable afterwards. Lives at a
/// transient staging path until uploaded, then under `blob_name` in the
/// bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Where the archive was written locally
    pub staging_path: PathBuf,

    /// Blob name the archive is uploaded under
    pub blob_name: String,

    /// Relative paths of every file in the archive
    pub manifest: Vec<String>,

    /// Archive size in bytes
    pub size_bytes: u64,

    /// Hex-encoded sha256 of the archive contents
    pub digest: String,

    /// When the archive was produced
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        staging_path: PathBuf,
        manifest: Vec<String>,
        size_bytes: u64,
        digest: String,
    ) -> Self {
        let blob_name = staging_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app.tar.gz".to_string());

        Self {
            staging_path,
            blob_name,
            manifest,
            size_bytes,
            digest,
            created_at: Utc::now(),
        }
    }

    /// Number of files packaged
    pub fn file_count(&self) -> usize {
        self.manifest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_name_from_staging_path() {
        let artifact = Artifact::new(
            PathBuf::from("/tmp/skiff/app.tar.gz"),
            vec!["main.py".to_string()],
            128,
            "ab".repeat(32),
        );

        assert_eq!(artifact.blob_name, "app.tar.gz");
        assert_eq!(artifact.file_count(), 1);
    }
}
