use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AresError;

pub const STRUCTURED_DB_FILE: &str = "robot_data.db";
pub const EMBEDDING_ARCHIVE: &str = "embedding_data.tar.gz";
pub const ANNOTATION_ARCHIVE: &str = "annotation_mongodump.tar.gz";
pub const VIDEO_PREFIX: &str = "videos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Structured,
    EmbeddingIndex,
    AnnotationDump,
    Video,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Structured => write!(f, "structured"),
            ArtifactKind::EmbeddingIndex => write!(f, "embedding_index"),
            ArtifactKind::AnnotationDump => write!(f, "annotation_dump"),
            ArtifactKind::Video => write!(f, "video"),
        }
    }
}

/// A video tarball path as it appears in the hub tree listing, e.g.
/// `videos/cmu_stretch.tar.gz`. Validation is anchored so nested paths and
/// non-tarball entries are rejected at the parse boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoArchive(String);

impl VideoArchive {
    pub fn remote_path(&self) -> &str {
        &self.0
    }

    /// File name of the tarball, `<dataset>.tar.gz`.
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.0)
    }

    /// Dataset name with the archive suffix stripped.
    pub fn dataset(&self) -> &str {
        self.file_name().trim_end_matches(".tar.gz")
    }
}

impl fmt::Display for VideoArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VideoArchive {
    type Err = AresError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let pattern = video_archive_pattern();
        if !pattern.is_match(value) {
            return Err(AresError::InvalidRemotePath(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

fn video_archive_pattern() -> Regex {
    Regex::new(r"^videos/[A-Za-z0-9][A-Za-z0-9._-]*\.tar\.gz$").unwrap()
}

/// Returns the listed paths that name video tarballs, in listing order.
pub fn filter_video_archives<'a, I>(paths: I) -> Vec<VideoArchive>
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .filter_map(|path| path.parse::<VideoArchive>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_archive_accepts_listed_tarballs() {
        let archive: VideoArchive = "videos/cmu_stretch.tar.gz".parse().unwrap();
        assert_eq!(archive.file_name(), "cmu_stretch.tar.gz");
        assert_eq!(archive.dataset(), "cmu_stretch");
    }

    #[test]
    fn video_archive_rejects_other_paths() {
        assert!("videos/notes.txt".parse::<VideoArchive>().is_err());
        assert!("videos/nested/clip.tar.gz".parse::<VideoArchive>().is_err());
        assert!("robot_data.db".parse::<VideoArchive>().is_err());
        assert!("videos/.tar.gz".parse::<VideoArchive>().is_err());
    }

    #[test]
    fn filter_keeps_listing_order() {
        let listed = [
            "videos/b.tar.gz",
            "videos/README.md",
            "videos/a.tar.gz",
        ];
        let archives = filter_video_archives(listed);
        assert_eq!(archives.len(), 2);
        assert_eq!(archives[0].dataset(), "b");
        assert_eq!(archives[1].dataset(), "a");
    }
}
