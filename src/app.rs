use std::time::Duration;

use camino::Utf8Path;
use serde::Serialize;

use crate::archive;
use crate::domain::{
    ANNOTATION_ARCHIVE, ArtifactKind, EMBEDDING_ARCHIVE, STRUCTURED_DB_FILE, VIDEO_PREFIX,
    VideoArchive, filter_video_archives,
};
use crate::error::AresError;
use crate::hub::HubClient;
use crate::layout::{DataLayout, Manifest, ManifestEntry};
use crate::restore::RestoreClient;

#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    pub dry_run: bool,
    pub skip_restore: bool,
    pub keep_archives: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapResult {
    pub out_dir: String,
    pub items: Vec<ArtifactResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResult {
    pub kind: String,
    pub remote_path: String,
    pub resolved_path: String,
    pub action: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Sequential provisioning of the ARES data directory. Every step is fatal on
/// error; there is no partial-success bookkeeping and no resumability.
pub struct Bootstrapper<H: HubClient, R: RestoreClient> {
    layout: DataLayout,
    hub: H,
    restore: R,
    repo: String,
}

impl<H: HubClient, R: RestoreClient> Bootstrapper<H, R> {
    pub fn new(layout: DataLayout, hub: H, restore: R, repo: String) -> Self {
        Self {
            layout,
            hub,
            restore,
            repo,
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn bootstrap(
        &self,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BootstrapResult, AresError> {
        if !options.dry_run {
            self.layout.ensure_root()?;
            self.layout.ensure_videos_dir()?;
        }

        let mut items = Vec::new();
        let mut manifest_entries = Vec::new();

        items.push(self.fetch_structured(options, sink, &mut manifest_entries)?);
        items.push(self.fetch_embedding_index(options, sink, &mut manifest_entries)?);
        items.push(self.fetch_annotation_dump(options, sink, &mut manifest_entries)?);
        items.extend(self.fetch_videos(options, sink, &mut manifest_entries)?);

        if !options.dry_run {
            let manifest = Manifest {
                repo: self.repo.clone(),
                tool: format!("ares-bootstrap/{}", env!("CARGO_PKG_VERSION")),
                completed_at: iso_timestamp(),
                artifacts: manifest_entries,
            };
            self.layout.write_manifest(&manifest)?;
        }

        Ok(BootstrapResult {
            out_dir: self.layout.root().to_string(),
            items,
        })
    }

    fn fetch_structured(
        &self,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
        manifest: &mut Vec<ManifestEntry>,
    ) -> Result<ArtifactResult, AresError> {
        let dest = self.layout.db_path();
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; structured database {STRUCTURED_DB_FILE}"),
            elapsed: None,
        });
        if options.dry_run {
            return Ok(planned(ArtifactKind::Structured, STRUCTURED_DB_FILE, &dest));
        }

        self.download_atomic(STRUCTURED_DB_FILE, &dest, sink)?;
        manifest.push(manifest_entry(
            ArtifactKind::Structured,
            STRUCTURED_DB_FILE,
            &dest,
        ));
        Ok(ArtifactResult {
            kind: ArtifactKind::Structured.to_string(),
            remote_path: STRUCTURED_DB_FILE.to_string(),
            resolved_path: dest.to_string(),
            action: "download".to_string(),
        })
    }

    fn fetch_embedding_index(
        &self,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
        manifest: &mut Vec<ManifestEntry>,
    ) -> Result<ArtifactResult, AresError> {
        let dest = self.layout.embedding_dir();
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; embedding index {EMBEDDING_ARCHIVE}"),
            elapsed: None,
        });
        if options.dry_run {
            return Ok(planned(ArtifactKind::EmbeddingIndex, EMBEDDING_ARCHIVE, &dest));
        }

        let archive_path = self.layout.embedding_archive_path();
        self.download_atomic(EMBEDDING_ARCHIVE, &archive_path, sink)?;
        self.extract_and_clean(&archive_path, self.layout.root(), options, sink)?;
        manifest.push(manifest_entry(
            ArtifactKind::EmbeddingIndex,
            EMBEDDING_ARCHIVE,
            &dest,
        ));
        Ok(ArtifactResult {
            kind: ArtifactKind::EmbeddingIndex.to_string(),
            remote_path: EMBEDDING_ARCHIVE.to_string(),
            resolved_path: dest.to_string(),
            action: "download".to_string(),
        })
    }

    fn fetch_annotation_dump(
        &self,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
        manifest: &mut Vec<ManifestEntry>,
    ) -> Result<ArtifactResult, AresError> {
        let dump_dir = self.layout.dump_dir();
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; annotation dump {ANNOTATION_ARCHIVE}"),
            elapsed: None,
        });
        if options.dry_run {
            return Ok(planned(ArtifactKind::AnnotationDump, ANNOTATION_ARCHIVE, &dump_dir));
        }

        let archive_path = self.layout.dump_archive_path();
        self.download_atomic(ANNOTATION_ARCHIVE, &archive_path, sink)?;
        self.extract_and_clean(&archive_path, self.layout.root(), options, sink)?;

        let action = if options.skip_restore {
            "download".to_string()
        } else {
            sink.event(ProgressEvent {
                message: "phase=Restore; running mongorestore".to_string(),
                elapsed: None,
            });
            self.restore.restore(dump_dir.as_std_path())?;
            "restored".to_string()
        };
        manifest.push(manifest_entry(
            ArtifactKind::AnnotationDump,
            ANNOTATION_ARCHIVE,
            &dump_dir,
        ));
        Ok(ArtifactResult {
            kind: ArtifactKind::AnnotationDump.to_string(),
            remote_path: ANNOTATION_ARCHIVE.to_string(),
            resolved_path: dump_dir.to_string(),
            action,
        })
    }

    fn fetch_videos(
        &self,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
        manifest: &mut Vec<ManifestEntry>,
    ) -> Result<Vec<ArtifactResult>, AresError> {
        sink.event(ProgressEvent {
            message: format!("phase=Discover; listing {VIDEO_PREFIX}/"),
            elapsed: None,
        });
        let entries = self.hub.list_tree(VIDEO_PREFIX)?;
        let archives = filter_video_archives(
            entries
                .iter()
                .filter(|entry| entry.is_file())
                .map(|entry| entry.path.as_str()),
        );
        tracing::info!(count = archives.len(), "discovered video archives");

        let mut items = Vec::new();
        for video in archives {
            items.push(self.fetch_video(&video, options, sink, manifest)?);
        }
        Ok(items)
    }

    fn fetch_video(
        &self,
        video: &VideoArchive,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
        manifest: &mut Vec<ManifestEntry>,
    ) -> Result<ArtifactResult, AresError> {
        let videos_dir = self.layout.videos_dir();
        let dest = videos_dir.join(video.dataset());
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; video archive {video}"),
            elapsed: None,
        });
        if options.dry_run {
            return Ok(planned(ArtifactKind::Video, video.remote_path(), &dest));
        }

        let archive_path = self.layout.video_archive_path(video.file_name());
        self.download_atomic(video.remote_path(), &archive_path, sink)?;
        self.extract_and_clean(&archive_path, &videos_dir, options, sink)?;
        manifest.push(manifest_entry(ArtifactKind::Video, video.remote_path(), &dest));
        Ok(ArtifactResult {
            kind: ArtifactKind::Video.to_string(),
            remote_path: video.remote_path().to_string(),
            resolved_path: dest.to_string(),
            action: "download".to_string(),
        })
    }

    fn download_atomic(
        &self,
        remote_path: &str,
        dest: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<(), AresError> {
        let staging = self.layout.staging_file(dest)?;
        sink.event(ProgressEvent {
            message: format!("hub.request {remote_path}"),
            elapsed: None,
        });
        let start = std::time::Instant::now();
        self.hub.download(remote_path, staging.path())?;
        sink.event(ProgressEvent {
            message: format!("hub.response {remote_path}"),
            elapsed: Some(start.elapsed()),
        });
        DataLayout::persist_file_atomic(staging, dest)
    }

    fn extract_and_clean(
        &self,
        archive_path: &Utf8Path,
        target_dir: &Utf8Path,
        options: BootstrapOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(), AresError> {
        sink.event(ProgressEvent {
            message: format!("phase=Extract; {archive_path}"),
            elapsed: None,
        });
        archive::extract_tar_gz(archive_path.as_std_path(), target_dir.as_std_path())?;
        if !options.keep_archives {
            archive::remove_archive(archive_path.as_std_path())?;
        }
        Ok(())
    }
}

fn planned(kind: ArtifactKind, remote_path: &str, resolved: &Utf8Path) -> ArtifactResult {
    ArtifactResult {
        kind: kind.to_string(),
        remote_path: remote_path.to_string(),
        resolved_path: resolved.to_string(),
        action: "planned".to_string(),
    }
}

fn manifest_entry(kind: ArtifactKind, remote_path: &str, resolved: &Utf8Path) -> ManifestEntry {
    ManifestEntry {
        kind: kind.to_string(),
        remote_path: remote_path.to_string(),
        resolved_path: resolved.to_string(),
        downloaded_at: iso_timestamp(),
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
