//! Packaging and Upload Integration Tests
//!
//! Verifies the archive's contents match the source tree exactly and
//! that uploads are full overwrites.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use tempfile::TempDir;

use skiff::core::{ArtifactStore, Packager};
use skiff::domain::Bucket;
use skiff::error::Result;
use skiff::providers::ObjectStore;

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Entry names and contents read back out of a gzipped tarball
fn read_archive(path: &Path) -> HashMap<String, String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut entries = HashMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry.path().unwrap().to_string_lossy().into_owned();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        entries.insert(name, contents);
    }
    entries
}

#[test]
fn test_archive_holds_exactly_the_source_files() {
    let source = TempDir::new().unwrap();
    write_file(source.path(), "main.py", "print('hello')");
    write_file(source.path(), "templates/index.html", "<b>hi</b>");
    write_file(source.path(), "templates/deep/footer.html", "<i>bye</i>");
    std::fs::create_dir_all(source.path().join("empty-dir")).unwrap();

    let staging = TempDir::new().unwrap();
    let artifact = Packager::new(staging.path())
        .package(source.path())
        .unwrap();

    let entries = read_archive(&artifact.staging_path);

    // Every regular file exactly once, relative to the source root;
    // the empty directory contributes nothing
    assert_eq!(entries.len(), 3);
    assert_eq!(entries["main.py"], "print('hello')");
    assert_eq!(entries["templates/index.html"], "<b>hi</b>");
    assert_eq!(entries["templates/deep/footer.html"], "<i>bye</i>");

    let mut manifest = artifact.manifest.clone();
    manifest.sort();
    let mut names: Vec<_> = entries.keys().cloned().collect();
    names.sort();
    assert_eq!(manifest, names);
}

#[test]
fn test_repackaging_fully_replaces_the_archive() {
    let source = TempDir::new().unwrap();
    write_file(source.path(), "a.txt", "version one");

    let staging = TempDir::new().unwrap();
    let packager = Packager::new(staging.path());
    packager.package(source.path()).unwrap();

    std::fs::remove_file(source.path().join("a.txt")).unwrap();
    write_file(source.path(), "b.txt", "version two");
    let artifact = packager.package(source.path()).unwrap();

    let entries = read_archive(&artifact.staging_path);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["b.txt"], "version two");
    assert!(!entries.contains_key("a.txt"));
}

/// Object store that keeps blobs in memory
struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }

    fn blob(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(&format!("{}/{}", bucket, name))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_bucket(&self, name: &str) -> Result<Option<Bucket>> {
        Ok(Some(Bucket::new(name)))
    }

    async fn create_bucket(&self, _: &str, name: &str, _: &str, _: &str) -> Result<Bucket> {
        Ok(Bucket::new(name))
    }

    async fn put_object(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(format!("{}/{}", bucket, name), bytes);
        Ok(())
    }
}

#[tokio::test]
async fn test_upload_overwrites_prior_blob() {
    let source = TempDir::new().unwrap();
    write_file(source.path(), "app.py", "first contents");

    let staging = TempDir::new().unwrap();
    let packager = Packager::new(staging.path());

    let store = Arc::new(MemoryStore::new());
    let client = ArtifactStore::new(store.clone(), "p1");
    let bucket = client.ensure_bucket("b1").await.unwrap();

    let first = packager.package(source.path()).unwrap();
    let first_bytes = std::fs::read(&first.staging_path).unwrap();
    client.upload(&bucket, &first).await.unwrap();

    write_file(source.path(), "app.py", "second contents, rather longer");
    let second = packager.package(source.path()).unwrap();
    client.upload(&bucket, &second).await.unwrap();

    // Same blob name, only the second content retrievable
    assert_eq!(first.blob_name, second.blob_name);
    let stored = store.blob("b1", &second.blob_name).unwrap();
    let on_disk = std::fs::read(&second.staging_path).unwrap();
    assert_eq!(stored, on_disk);
    assert_ne!(stored, first_bytes);
}
