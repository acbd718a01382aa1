use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::{ANNOTATION_ARCHIVE, EMBEDDING_ARCHIVE, STRUCTURED_DB_FILE, VIDEO_PREFIX};
use crate::error::AresError;

/// Path arithmetic for the output tree. The layout owns no I/O policy beyond
/// idempotent directory creation and atomic file placement.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: Utf8PathBuf,
}

impl DataLayout {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn db_path(&self) -> Utf8PathBuf {
        self.root.join(STRUCTURED_DB_FILE)
    }

    pub fn embedding_dir(&self) -> Utf8PathBuf {
        self.root.join("embedding_data")
    }

    pub fn embedding_archive_path(&self) -> Utf8PathBuf {
        self.root.join(EMBEDDING_ARCHIVE)
    }

    pub fn dump_dir(&self) -> Utf8PathBuf {
        self.root.join("annotation_mongodump")
    }

    pub fn dump_archive_path(&self) -> Utf8PathBuf {
        self.root.join(ANNOTATION_ARCHIVE)
    }

    pub fn videos_dir(&self) -> Utf8PathBuf {
        self.root.join(VIDEO_PREFIX)
    }

    pub fn video_archive_path(&self, file_name: &str) -> Utf8PathBuf {
        self.videos_dir().join(file_name)
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(".ares-bootstrap.json")
    }

    pub fn ensure_root(&self) -> Result<(), AresError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))
    }

    pub fn ensure_videos_dir(&self) -> Result<(), AresError> {
        fs::create_dir_all(self.videos_dir().as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))
    }

    /// Stages content next to `dest` and renames into place, so a partial
    /// download never lands at the final path.
    pub fn persist_file_atomic(temp: tempfile::NamedTempFile, dest: &Utf8Path) -> Result<(), AresError> {
        if dest.as_std_path().exists() {
            fs::remove_file(dest.as_std_path())
                .map_err(|err| AresError::Filesystem(err.to_string()))?;
        }
        temp.persist(dest.as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn staging_file(&self, dest: &Utf8Path) -> Result<tempfile::NamedTempFile, AresError> {
        let parent = dest
            .parent()
            .ok_or_else(|| AresError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        tempfile::Builder::new()
            .prefix(".ares-download")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<(), AresError> {
        let path = self.manifest_path();
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(manifest)
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn read_manifest(&self) -> Result<Option<Manifest>, AresError> {
        let path = self.manifest_path();
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        let manifest = serde_json::from_str(&content)
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        Ok(Some(manifest))
    }
}

/// Provenance record written after a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub repo: String,
    pub tool: String,
    pub completed_at: String,
    pub artifacts: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: String,
    pub remote_path: String,
    pub resolved_path: String,
    pub downloaded_at: String,
}
