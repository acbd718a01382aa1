use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use serde::Deserialize;

use crate::error::AresError;

/// One entry of the dataset repository tree listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.entry_type == "file"
    }
}

pub trait HubClient: Send + Sync {
    fn download(&self, remote_path: &str, destination: &Path) -> Result<(), AresError>;
    fn list_tree(&self, prefix: &str) -> Result<Vec<TreeEntry>, AresError>;
}

#[derive(Clone)]
pub struct HubHttpClient {
    client: Client,
    base_url: String,
    repo: String,
}

impl HubHttpClient {
    pub fn new(token: &str, repo: &str) -> Result<Self, AresError> {
        Self::with_base_url(token, repo, "https://huggingface.co")
    }

    pub fn with_base_url(token: &str, repo: &str, base_url: &str) -> Result<Self, AresError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ares-bootstrap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| AresError::HubHttp(err.to_string()))?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| AresError::HubHttp(err.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| AresError::HubHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
        })
    }

    fn resolve_url(&self, remote_path: &str) -> String {
        format!(
            "{}/datasets/{}/resolve/main/{remote_path}",
            self.base_url, self.repo
        )
    }

    fn tree_url(&self, prefix: &str) -> String {
        format!(
            "{}/api/datasets/{}/tree/main/{prefix}",
            self.base_url, self.repo
        )
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, AresError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(AresError::HubHttp(err.to_string()));
                }
            }
        }
    }

    fn check_status(
        response: reqwest::blocking::Response,
        remote_path: &str,
    ) -> Result<reqwest::blocking::Response, AresError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "hub request failed".to_string());
        Err(AresError::HubStatus {
            status,
            path: remote_path.to_string(),
            message,
        })
    }
}

impl HubClient for HubHttpClient {
    fn download(&self, remote_path: &str, destination: &Path) -> Result<(), AresError> {
        let url = self.resolve_url(remote_path);
        let response = self.send_with_retries(&url)?;
        let mut response = Self::check_status(response, remote_path)?;
        let mut file =
            File::create(destination).map_err(|err| AresError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| AresError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Lists every file under `prefix`, following `Link: rel="next"` pagination
    /// until the listing is exhausted. A failed page request aborts the run
    /// rather than silently yielding a subset.
    fn list_tree(&self, prefix: &str) -> Result<Vec<TreeEntry>, AresError> {
        let mut entries = Vec::new();
        let mut next_url = Some(self.tree_url(prefix));
        while let Some(url) = next_url {
            let response = self.send_with_retries(&url)?;
            let response = Self::check_status(response, prefix)?;
            next_url = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_next_link);
            let page: Vec<TreeEntry> = response
                .json()
                .map_err(|err| AresError::ListingParse(err.to_string()))?;
            entries.extend(page);
        }
        Ok(entries)
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Pulls the `rel="next"` target out of an RFC 5988 Link header.
pub fn parse_next_link(header: &str) -> Option<String> {
    for part in header.split(',') {
        let Some((target, params)) = part.trim().split_once(';') else {
            continue;
        };
        if params.contains("rel=\"next\"") || params.contains("rel=next") {
            let url = target.trim().trim_start_matches('<').trim_end_matches('>');
            return Some(url.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_next_link_extracts_target() {
        let header = "<https://huggingface.co/api/datasets/x/tree/main/videos?cursor=abc>; rel=\"next\"";
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://huggingface.co/api/datasets/x/tree/main/videos?cursor=abc")
        );
    }

    #[test]
    fn parse_next_link_ignores_other_relations() {
        let header = "<https://huggingface.co/page1>; rel=\"prev\"";
        assert_eq!(parse_next_link(header), None);
    }

    #[test]
    fn tree_entry_file_detection() {
        let entry: TreeEntry = serde_json::from_str(
            r#"{"type":"file","path":"videos/cmu_stretch.tar.gz","size":1024}"#,
        )
        .unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.size, Some(1024));
    }

    #[test]
    fn urls_are_shaped_for_the_hub() {
        let client = HubHttpClient::new("hf_test", "jacobphillips99/ares-data").unwrap();
        assert_eq!(
            client.resolve_url("robot_data.db"),
            "https://huggingface.co/datasets/jacobphillips99/ares-data/resolve/main/robot_data.db"
        );
        assert_eq!(
            client.tree_url("videos"),
            "https://huggingface.co/api/datasets/jacobphillips99/ares-data/tree/main/videos"
        );
    }
}
