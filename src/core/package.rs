//! Packaging of the application payload.
//!
//! Walks the payload directory, writes every regular file into a gzipped
//! tarball at the staging location, and records the manifest plus a
//! content digest. Each call fully replaces any prior archive.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use tracing::info;
use walkdir::WalkDir;

use crate::domain::Artifact;
use crate::error::{Error, Result};

/// Archive file name; the bootstrap metadata carries it under the `zip` key
pub const ARCHIVE_NAME: &str = "app.tar.gz";

/// Packages a directory tree into a single archive artifact
pub struct Packager {
    staging_dir: PathBuf,
}

impl Packager {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// Archive every regular file under `source_dir`, preserving paths
    /// relative to the source root. Traversal order is not significant.
    pub fn package(&self, source_dir: &Path) -> Result<Artifact> {
        let manifest = collect_files(source_dir)?;

        info!(
            source = %source_dir.display(),
            files = manifest.len(),
            "packaging application"
        );
        for path in &manifest {
            info!("  {}", path);
        }

        std::fs::create_dir_all(&self.staging_dir)
            .map_err(|e| Error::io("creating staging directory", e))?;

        let archive_path = self.staging_dir.join(ARCHIVE_NAME);
        // File::create truncates, so a prior archive is fully replaced
        let file = File::create(&archive_path)
            .map_err(|e| Error::io("creating archive", e))?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        for relative in &manifest {
            builder
                .append_path_with_name(source_dir.join(relative), relative)
                .map_err(|e| Error::io(format!("archiving {}", relative), e))?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| Error::io("finishing archive", e))?;
        let mut writer = encoder
            .finish()
            .map_err(|e| Error::io("finishing archive", e))?;
        writer
            .flush()
            .map_err(|e| Error::io("flushing archive", e))?;

        let (size_bytes, digest) = digest_file(&archive_path)?;
        info!(archive = %archive_path.display(), size_bytes, %digest, "archive written");

        Ok(Artifact::new(archive_path, manifest, size_bytes, digest))
    }
}

/// Relative paths of every regular file under `root`, depth-first
fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let io_err = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            Error::io(format!("reading {}", root.display()), io_err)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| {
                Error::io(
                    "resolving relative path",
                    std::io::Error::other("walked entry outside source root"),
                )
            })?
            .to_string_lossy()
            .into_owned();
        files.push(relative);
    }

    Ok(files)
}

/// Size and hex sha256 of a file's contents
fn digest_file(path: &Path) -> Result<(u64, String)> {
    let mut file = File::open(path).map_err(|e| Error::io("reading archive back", e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut size = 0u64;

    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| Error::io("hashing archive", e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok((size, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_manifest_contains_every_regular_file_once() {
        let source = TempDir::new().unwrap();
        write_file(source.path(), "main.py", "print('hi')");
        write_file(source.path(), "lib/util.py", "pass");
        write_file(source.path(), "lib/deep/more.py", "pass");

        let staging = TempDir::new().unwrap();
        let artifact = Packager::new(staging.path())
            .package(source.path())
            .unwrap();

        let mut manifest = artifact.manifest.clone();
        manifest.sort();
        assert_eq!(manifest, vec!["lib/deep/more.py", "lib/util.py", "main.py"]);
        assert!(artifact.staging_path.ends_with(ARCHIVE_NAME));
        assert_eq!(artifact.blob_name, ARCHIVE_NAME);
        assert!(artifact.size_bytes > 0);
        assert_eq!(artifact.digest.len(), 64);
    }

    #[test]
    fn test_repackage_replaces_prior_archive() {
        let source = TempDir::new().unwrap();
        write_file(source.path(), "a.txt", "first");

        let staging = TempDir::new().unwrap();
        let packager = Packager::new(staging.path());
        let first = packager.package(source.path()).unwrap();

        write_file(source.path(), "a.txt", "second, longer contents");
        let second = packager.package(source.path()).unwrap();

        assert_eq!(first.staging_path, second.staging_path);
        assert_ne!(first.digest, second.digest);
    }

    #[test]
    fn test_unreadable_source_fails() {
        let staging = TempDir::new().unwrap();
        let result = Packager::new(staging.path()).package(Path::new("/nonexistent/app"));

        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
