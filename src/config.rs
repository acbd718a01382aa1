use camino::Utf8PathBuf;
use directories::BaseDirs;

use crate::error::AresError;

pub const TOKEN_ENV: &str = "HUGGINGFACE_API_KEY";
pub const REPO_ENV: &str = "ARES_DATASET_REPO";
pub const MONGO_HOST_ENV: &str = "ARES_MONGO_HOST";

pub const DEFAULT_REPO: &str = "jacobphillips99/ares-data";
pub const DEFAULT_MONGO_HOST: &str = "localhost:27017";

/// Fully resolved runtime settings. Precedence is CLI flag, then environment,
/// then default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub repo: String,
    pub mongo_host: String,
    pub out_dir: Utf8PathBuf,
}

impl Settings {
    pub fn resolve(
        out_dir: Option<&str>,
        repo: Option<&str>,
        mongo_host: Option<&str>,
    ) -> Result<Self, AresError> {
        let token = resolve_token()?;
        let repo = repo
            .map(str::to_string)
            .or_else(|| non_empty_env(REPO_ENV))
            .unwrap_or_else(|| DEFAULT_REPO.to_string());
        let mongo_host = mongo_host
            .map(str::to_string)
            .or_else(|| non_empty_env(MONGO_HOST_ENV))
            .unwrap_or_else(|| DEFAULT_MONGO_HOST.to_string());
        let out_dir = match out_dir {
            Some(path) => Utf8PathBuf::from(path),
            None => default_out_dir()?,
        };

        Ok(Self {
            token,
            repo,
            mongo_host,
            out_dir,
        })
    }
}

/// The token check is the first thing the binary does; nothing is fetched
/// without it.
pub fn resolve_token() -> Result<String, AresError> {
    non_empty_env(TOKEN_ENV).ok_or(AresError::MissingToken(TOKEN_ENV))
}

pub fn default_out_dir() -> Result<Utf8PathBuf, AresError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join("ares").join("data")).ok()
        })
        .ok_or_else(|| AresError::Filesystem("unable to resolve home directory".to_string()))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_out_dir_is_under_home() {
        let dir = default_out_dir().unwrap();
        assert!(dir.as_str().ends_with("ares/data") || dir.as_str().ends_with("ares\\data"));
    }
}
