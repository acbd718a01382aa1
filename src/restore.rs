use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::AresError;

pub trait RestoreClient: Send + Sync {
    fn restore(&self, dump_dir: &Path) -> Result<(), AresError>;
}

/// Invokes the system `mongorestore` against a locally reachable MongoDB.
/// The tool's exit status is propagated; nothing else is verified.
#[derive(Clone)]
pub struct SystemMongoRestore {
    mongorestore: Option<PathBuf>,
    mongo_host: String,
}

impl SystemMongoRestore {
    pub fn new(mongo_host: &str) -> Self {
        Self {
            mongorestore: find_in_path("mongorestore"),
            mongo_host: mongo_host.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.mongorestore.is_some()
    }
}

impl RestoreClient for SystemMongoRestore {
    fn restore(&self, dump_dir: &Path) -> Result<(), AresError> {
        let mongorestore = self
            .mongorestore
            .as_ref()
            .ok_or_else(|| AresError::MissingTool("mongorestore".to_string()))?;

        let output = Command::new(mongorestore)
            .arg("--host")
            .arg(&self.mongo_host)
            .arg("--dir")
            .arg(dump_dir)
            .output()
            .map_err(|err| AresError::Restore(err.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("mongorestore exited with {}", output.status)
        } else {
            stderr
        };
        Err(AresError::Restore(message))
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn availability_reflects_tool_discovery() {
        let client = SystemMongoRestore {
            mongorestore: None,
            mongo_host: "localhost:27017".to_string(),
        };
        assert!(!client.is_available());

        let client = SystemMongoRestore {
            mongorestore: Some(PathBuf::from("/usr/bin/mongorestore")),
            mongo_host: "localhost:27017".to_string(),
        };
        assert!(client.is_available());
    }

    #[test]
    fn missing_tool_is_reported_on_restore() {
        let client = SystemMongoRestore {
            mongorestore: None,
            mongo_host: "localhost:27017".to_string(),
        };
        let result = client.restore(Path::new("/tmp/dump"));
        assert_matches!(result, Err(AresError::MissingTool(_)));
    }
}
