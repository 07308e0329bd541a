//! Remote repository access
//!
//! The [`RepoClient`] trait is the boundary to the code-hosting API: one call
//! either lists a directory or returns decoded file content. The fetch
//! pipeline is generic over it, so tests run against an in-memory tree and
//! production runs against GitHub.

pub mod fetcher;
pub mod github;

use crate::error::ScanError;

pub use fetcher::RemoteTreeFetcher;
pub use github::GithubClient;

/// Kind of a tree entry as reported by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

/// Result of a contents call: either a listing or decoded text.
#[derive(Debug, Clone)]
pub enum RepoContent {
    Directory(Vec<TreeEntry>),
    File(String),
}

/// A content-bearing file produced by the fetcher. Directories are never
/// retained in fetch output.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub size: usize,
}

/// Boundary to the remote file-tree provider.
pub trait RepoClient: Send + Sync {
    /// List `path` if it is a directory, or return its decoded content if it
    /// is a file. An empty `path` addresses the repository root.
    fn list_or_get(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> impl Future<Output = Result<RepoContent, ScanError>> + Send;
}
