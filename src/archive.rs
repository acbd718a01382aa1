use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::AresError;

/// Extracts a gzip-compressed tarball into `target_dir`, entry by entry.
/// `unpack_in` refuses entries that would escape the target directory.
pub fn extract_tar_gz(archive_path: &Path, target_dir: &Path) -> Result<(), AresError> {
    let file = File::open(archive_path).map_err(|err| AresError::Archive {
        path: archive_path.display().to_string(),
        message: format!("open: {err}"),
    })?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let entries = archive.entries().map_err(|err| AresError::Archive {
        path: archive_path.display().to_string(),
        message: err.to_string(),
    })?;
    for entry in entries {
        let mut entry = entry.map_err(|err| AresError::Archive {
            path: archive_path.display().to_string(),
            message: err.to_string(),
        })?;
        let unpacked = entry.unpack_in(target_dir).map_err(|err| AresError::Archive {
            path: archive_path.display().to_string(),
            message: err.to_string(),
        })?;
        if !unpacked {
            return Err(AresError::Archive {
                path: archive_path.display().to_string(),
                message: "entry path escapes the target directory".to_string(),
            });
        }
    }
    Ok(())
}

/// Removes the compressed intermediate once its contents are in place.
pub fn remove_archive(archive_path: &Path) -> Result<(), AresError> {
    std::fs::remove_file(archive_path).map_err(|err| AresError::Filesystem(format!(
        "remove {}: {err}",
        archive_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn build_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn extracts_nested_entries() {
        let temp = tempfile::tempdir().unwrap();
        let bytes = build_tar_gz(&[
            ("embedding_data/index.bin", b"index".as_slice()),
            ("embedding_data/meta/ids.json", b"[]".as_slice()),
        ]);
        let archive_path = temp.path().join("embedding_data.tar.gz");
        std::fs::write(&archive_path, &bytes).unwrap();

        extract_tar_gz(&archive_path, temp.path()).unwrap();

        assert!(temp.path().join("embedding_data/index.bin").is_file());
        assert!(temp.path().join("embedding_data/meta/ids.json").is_file());
    }

    #[test]
    fn truncated_archive_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut bytes = build_tar_gz(&[("data/file.txt", b"hello".as_slice())]);
        bytes.truncate(bytes.len() / 2);
        let archive_path = temp.path().join("broken.tar.gz");
        std::fs::write(&archive_path, &bytes).unwrap();

        let result = extract_tar_gz(&archive_path, temp.path());
        assert_matches!(result, Err(AresError::Archive { .. }));
    }

    #[test]
    fn remove_archive_deletes_the_file() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("x.tar.gz");
        std::fs::write(&archive_path, b"gz").unwrap();
        remove_archive(&archive_path).unwrap();
        assert!(!archive_path.exists());
    }
}
