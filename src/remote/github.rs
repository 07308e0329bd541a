//! GitHub contents-API client
//!
//! Thin adapter implementing [`RepoClient`] over the REST contents endpoint.
//! Responses are mapped onto the scan error taxonomy here so the rest of the
//! pipeline never sees HTTP details.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;

use super::{EntryKind, RepoClient, RepoContent, TreeEntry};
use crate::error::ScanError;

const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("secretscan/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: reqwest::Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentsEntry>),
    Single(ContentsEntry),
}

impl GithubClient {
    pub fn new(token: Option<String>, request_timeout: Duration) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ScanError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, token })
    }

    fn contents_url(owner: &str, repo: &str, path: &str) -> String {
        if path.is_empty() {
            format!("{API_ROOT}/repos/{owner}/{repo}/contents")
        } else {
            format!("{API_ROOT}/repos/{owner}/{repo}/contents/{path}")
        }
    }
}

impl RepoClient for GithubClient {
    async fn list_or_get(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<RepoContent, ScanError> {
        let url = Self::contents_url(owner, repo, path);
        let mut request = self
            .http
            .get(&url)
            .query(&[("ref", reference)])
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if status.as_u16() == 404 {
            return Err(ScanError::RepositoryAccess {
                resource: format!("{owner}/{repo}:{path}"),
                message: "not found".to_string(),
            });
        }
        if status.as_u16() == 429 || (status.as_u16() == 403 && rate_limited(&response)) {
            return Err(ScanError::RateLimit(format!(
                "GitHub API rate limit hit for {owner}/{repo}"
            )));
        }
        if !status.is_success() {
            return Err(ScanError::RemoteApi {
                status: Some(status.as_u16()),
                message: format!("GitHub API returned {status} for {url}"),
            });
        }

        let body: ContentsResponse = response.json().await.map_err(map_transport_error)?;
        match body {
            ContentsResponse::Listing(entries) => Ok(RepoContent::Directory(
                entries.into_iter().map(into_tree_entry).collect(),
            )),
            ContentsResponse::Single(entry) if entry.kind == "file" => {
                Ok(RepoContent::File(decode_content(&entry)?))
            }
            ContentsResponse::Single(entry) => Err(ScanError::RemoteApi {
                status: None,
                message: format!("unexpected entry kind '{}' for {}", entry.kind, entry.path),
            }),
        }
    }
}

fn into_tree_entry(entry: ContentsEntry) -> TreeEntry {
    TreeEntry {
        kind: if entry.kind == "dir" {
            EntryKind::Directory
        } else {
            EntryKind::File
        },
        path: entry.path,
        size: entry.size,
    }
}

/// GitHub serves file content as newline-wrapped base64.
fn decode_content(entry: &ContentsEntry) -> Result<String, ScanError> {
    let Some(raw) = &entry.content else {
        // Files above the API's inline-content limit come back without a
        // content field; they are far beyond our scan size limit anyway.
        return Ok(String::new());
    };
    match entry.encoding.as_deref() {
        Some("base64") | None => {
            let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(stripped)
                .map_err(|e| ScanError::RemoteApi {
                    status: None,
                    message: format!("invalid base64 content for {}: {e}", entry.path),
                })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Some(other) => Err(ScanError::RemoteApi {
            status: None,
            message: format!("unsupported content encoding '{other}' for {}", entry.path),
        }),
    }
}

fn rate_limited(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0")
}

fn map_transport_error(error: reqwest::Error) -> ScanError {
    if error.is_timeout() {
        ScanError::Timeout { seconds: 0 }
    } else {
        ScanError::RemoteApi {
            status: error.status().map(|s| s.as_u16()),
            message: format!("request failed: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_url_handles_root_and_nested_paths() {
        assert_eq!(
            GithubClient::contents_url("acme", "app", ""),
            "https://api.github.com/repos/acme/app/contents"
        );
        assert_eq!(
            GithubClient::contents_url("acme", "app", "src/main.rs"),
            "https://api.github.com/repos/acme/app/contents/src/main.rs"
        );
    }

    #[test]
    fn decodes_wrapped_base64() {
        let entry = ContentsEntry {
            path: "a.txt".into(),
            kind: "file".into(),
            size: Some(11),
            content: Some("aGVsbG8g\nd29ybGQ=\n".into()),
            encoding: Some("base64".into()),
        };
        assert_eq!(decode_content(&entry).unwrap(), "hello world");
    }

    #[test]
    fn missing_content_decodes_to_empty() {
        let entry = ContentsEntry {
            path: "big.bin".into(),
            kind: "file".into(),
            size: Some(10_000_000),
            content: None,
            encoding: None,
        };
        assert_eq!(decode_content(&entry).unwrap(), "");
    }

    #[test]
    fn unknown_encoding_is_an_error() {
        let entry = ContentsEntry {
            path: "a".into(),
            kind: "file".into(),
            size: None,
            content: Some("xx".into()),
            encoding: Some("rot13".into()),
        };
        assert!(decode_content(&entry).is_err());
    }
}
