//! Resilient remote tree traversal
//!
//! Fetches a bounded set of text files from a remote repository. Directory
//! listings and content fetches fan out in fixed-size batches; every remote
//! call takes the rate-limiter -> circuit-breaker -> retry path. Admission
//! filters run before any content fetch so excluded paths cost nothing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;
use globset::{Glob, GlobSet, GlobSetBuilder};

use super::{EntryKind, RemoteFile, RepoClient, RepoContent, TreeEntry};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::report::RepoLocator;
use crate::resilience::{CircuitBreaker, RateLimiter, RetryPolicy, retry_with_backoff};

/// All remote calls share one bucket.
const RATE_KEY: &str = "github";
/// Concurrent calls per batch, for listings and content fetches alike.
const BATCH_SIZE: usize = 10;

/// Directory segments never descended into.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "vendor",
    "__pycache__",
];

/// Suffixes of binary, media, archive, and compiled artifacts.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "pdf", "zip", "tar", "gz", "bz2",
    "xz", "7z", "rar", "jar", "war", "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "pyc",
    "wasm", "woff", "woff2", "ttf", "eot", "otf", "mp3", "mp4", "avi", "mov", "mkv", "flac", "ogg",
    "wav",
];

/// Bounded, failure-isolated fetch of a remote file tree.
pub struct RemoteTreeFetcher<C: RepoClient> {
    client: Arc<C>,
    limiter: Arc<RateLimiter>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    token_wait: Duration,
    max_file_size: usize,
    max_files: usize,
    exclude: GlobSet,
}

impl<C: RepoClient> RemoteTreeFetcher<C> {
    pub fn new(
        client: Arc<C>,
        limiter: Arc<RateLimiter>,
        breaker: CircuitBreaker,
        config: &ScanConfig,
    ) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.scanner.exclude_globs {
            let glob = Glob::new(pattern)
                .map_err(|e| ScanError::Config(format!("invalid exclude glob '{pattern}': {e}")))?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|e| ScanError::Config(format!("failed to build exclude globs: {e}")))?;

        Ok(Self {
            client,
            limiter,
            breaker,
            retry: RetryPolicy::from_config(&config.retry),
            token_wait: config.token_wait(),
            max_file_size: config.limits.max_file_size,
            max_files: config.limits.max_files_per_scan,
            exclude,
        })
    }

    /// Fetch content-bearing files for the locator. With an explicit path
    /// the single entry is fetched (or, for a directory, that subtree);
    /// otherwise traversal starts at the repository root.
    ///
    /// Failures at the starting point abort the fetch; failures below it
    /// skip the affected entry or subtree and traversal continues.
    pub async fn fetch(&self, locator: &RepoLocator) -> Result<Vec<RemoteFile>, ScanError> {
        locator.validate()?;

        let start = locator.path.clone().unwrap_or_default();
        let admitted = AtomicUsize::new(0);
        let mut files = Vec::new();

        match self.call(locator, &start).await? {
            RepoContent::File(content) => {
                admitted.fetch_add(1, Ordering::SeqCst);
                if content.len() <= self.max_file_size {
                    files.push(RemoteFile {
                        path: start,
                        size: content.len(),
                        content,
                    });
                } else {
                    tracing::debug!(path = %start, "content exceeds max file size, discarded");
                }
            }
            RepoContent::Directory(entries) => {
                let mut pending = VecDeque::new();
                self.process_listing(locator, entries, &admitted, &mut files, &mut pending)
                    .await;

                while !pending.is_empty() && admitted.load(Ordering::SeqCst) < self.max_files {
                    let batch: Vec<String> = pending
                        .drain(..pending.len().min(BATCH_SIZE))
                        .collect();
                    let listings = join_all(
                        batch
                            .iter()
                            .map(|dir| async move { (dir.clone(), self.call(locator, dir).await) }),
                    )
                    .await;

                    for (dir, result) in listings {
                        match result {
                            Ok(RepoContent::Directory(entries)) => {
                                self.process_listing(
                                    locator, entries, &admitted, &mut files, &mut pending,
                                )
                                .await;
                            }
                            Ok(RepoContent::File(_)) => {
                                tracing::warn!(path = %dir, "directory entry resolved to a file, skipped");
                            }
                            Err(ScanError::RepositoryAccess { .. }) => {
                                tracing::debug!(path = %dir, "subtree not found, skipped");
                            }
                            Err(error) => {
                                tracing::warn!(path = %dir, %error, "subtree fetch failed, skipped");
                            }
                        }
                    }
                }
            }
        }

        tracing::info!(
            repository = %locator.slug(),
            files = files.len(),
            "remote fetch complete"
        );
        Ok(files)
    }

    /// Queue subdirectories and fetch admitted files from one listing.
    async fn process_listing(
        &self,
        locator: &RepoLocator,
        entries: Vec<TreeEntry>,
        admitted: &AtomicUsize,
        files: &mut Vec<RemoteFile>,
        pending: &mut VecDeque<String>,
    ) {
        let mut to_fetch = Vec::new();

        for entry in entries {
            match entry.kind {
                EntryKind::Directory => {
                    if self.admit_directory(&entry.path) {
                        pending.push_back(entry.path);
                    } else {
                        tracing::debug!(path = %entry.path, "directory excluded");
                    }
                }
                EntryKind::File => {
                    if !self.admit_file(&entry.path) {
                        tracing::debug!(path = %entry.path, "file excluded by admission filter");
                        continue;
                    }
                    // Claim a slot before the network fetch; once the cap is
                    // reached no further fetches are initiated.
                    if admitted.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                            (n < self.max_files).then_some(n + 1)
                        })
                        .is_err()
                    {
                        continue;
                    }
                    to_fetch.push(entry.path);
                }
            }
        }

        for chunk in to_fetch.chunks(BATCH_SIZE) {
            let fetched = join_all(
                chunk
                    .iter()
                    .map(|path| async move { (path.clone(), self.call(locator, path).await) }),
            )
            .await;

            for (path, result) in fetched {
                match result {
                    Ok(RepoContent::File(content)) => {
                        if content.len() > self.max_file_size {
                            tracing::debug!(%path, size = content.len(), "oversized content discarded");
                            continue;
                        }
                        files.push(RemoteFile {
                            path,
                            size: content.len(),
                            content,
                        });
                    }
                    Ok(RepoContent::Directory(_)) => {
                        tracing::warn!(%path, "file entry resolved to a directory, skipped");
                    }
                    Err(ScanError::RepositoryAccess { .. }) => {
                        tracing::debug!(%path, "file not found, skipped");
                    }
                    Err(error) => {
                        tracing::warn!(%path, %error, "file fetch failed, skipped");
                    }
                }
            }
        }
    }

    /// One remote call through the full resilience chain: rate-limit token,
    /// then the shared breaker, whose inner operation is the retry-wrapped
    /// API request.
    async fn call(&self, locator: &RepoLocator, path: &str) -> Result<RepoContent, ScanError> {
        self.limiter.wait_for_token(RATE_KEY, self.token_wait).await?;

        let client = Arc::clone(&self.client);
        let owner = locator.owner.clone();
        let repo = locator.repo.clone();
        let branch = locator.branch.clone();
        let path = path.to_string();
        let retry = self.retry.clone();

        self.breaker
            .execute(|| async move {
                retry_with_backoff(&retry, || {
                    client.list_or_get(&owner, &repo, &branch, &path)
                })
                .await
            })
            .await
    }

    fn admit_directory(&self, path: &str) -> bool {
        !has_excluded_segment(path) && !self.exclude.is_match(path)
    }

    fn admit_file(&self, path: &str) -> bool {
        if has_excluded_segment(path) || self.exclude.is_match(path) {
            return false;
        }
        match path.rsplit_once('.') {
            Some((_, ext)) => !EXCLUDED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
            None => true,
        }
    }
}

fn has_excluded_segment(path: &str) -> bool {
    path.split('/')
        .any(|segment| EXCLUDED_DIRS.contains(&segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory tree with optional per-path failure injection.
    struct MockClient {
        tree: HashMap<String, RepoContent>,
        failures: HashMap<String, fn() -> ScanError>,
        calls: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                tree: HashMap::new(),
                failures: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn dir(mut self, path: &str, entries: &[(&str, EntryKind)]) -> Self {
            self.tree.insert(
                path.to_string(),
                RepoContent::Directory(
                    entries
                        .iter()
                        .map(|(p, kind)| TreeEntry {
                            path: p.to_string(),
                            kind: *kind,
                            size: None,
                        })
                        .collect(),
                ),
            );
            self
        }

        fn file(mut self, path: &str, content: &str) -> Self {
            self.tree
                .insert(path.to_string(), RepoContent::File(content.to_string()));
            self
        }

        fn failing(mut self, path: &str, make: fn() -> ScanError) -> Self {
            self.failures.insert(path.to_string(), make);
            self
        }
    }

    impl RepoClient for MockClient {
        async fn list_or_get(
            &self,
            _owner: &str,
            _repo: &str,
            _reference: &str,
            path: &str,
        ) -> Result<RepoContent, ScanError> {
            self.calls.lock().unwrap().push(path.to_string());
            if let Some(make) = self.failures.get(path) {
                return Err(make());
            }
            self.tree.get(path).cloned().ok_or(ScanError::RepositoryAccess {
                resource: path.to_string(),
                message: "not found".to_string(),
            })
        }
    }

    fn fetcher_with(client: MockClient, config: &ScanConfig) -> RemoteTreeFetcher<MockClient> {
        let limiter = Arc::new(RateLimiter::new(10_000, 36_000_000));
        let breaker = CircuitBreaker::new(crate::resilience::BreakerSettings::from_config(
            &config.circuit_breaker,
        ));
        RemoteTreeFetcher::new(Arc::new(client), limiter, breaker, config).unwrap()
    }

    fn locator() -> RepoLocator {
        RepoLocator::new("acme", "app")
    }

    #[tokio::test]
    async fn fetches_files_and_recurses_into_directories() {
        let client = MockClient::new()
            .dir(
                "",
                &[
                    ("README.md", EntryKind::File),
                    ("src", EntryKind::Directory),
                ],
            )
            .dir("src", &[("src/main.rs", EntryKind::File)])
            .file("README.md", "# readme")
            .file("src/main.rs", "fn main() {}");

        let fetcher = fetcher_with(client, &ScanConfig::default());
        let files = fetcher.fetch(&locator()).await.unwrap();

        let mut paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["README.md", "src/main.rs"]);
    }

    #[tokio::test]
    async fn excluded_directories_and_extensions_never_fetched() {
        let client = MockClient::new()
            .dir(
                "",
                &[
                    ("logo.png", EntryKind::File),
                    ("node_modules", EntryKind::Directory),
                    ("app.js", EntryKind::File),
                ],
            )
            .file("app.js", "let x = 1;");

        let fetcher = fetcher_with(client, &ScanConfig::default());
        let files = fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "app.js");
    }

    #[tokio::test]
    async fn file_count_cap_is_never_exceeded() {
        let entries: Vec<(String, EntryKind)> = (0..30)
            .map(|i| (format!("f{i}.txt"), EntryKind::File))
            .collect();
        let entry_refs: Vec<(&str, EntryKind)> =
            entries.iter().map(|(p, k)| (p.as_str(), *k)).collect();

        let mut client = MockClient::new().dir("", &entry_refs);
        for (path, _) in &entries {
            client = client.file(path, "content");
        }

        let mut config = ScanConfig::default();
        config.limits.max_files_per_scan = 5;

        let fetcher = fetcher_with(client, &config);
        let files = fetcher.fetch(&locator()).await.unwrap();
        assert_eq!(files.len(), 5);
    }

    #[tokio::test]
    async fn oversized_content_is_discarded_whole() {
        let client = MockClient::new()
            .dir("", &[("big.txt", EntryKind::File), ("ok.txt", EntryKind::File)])
            .file("big.txt", &"x".repeat(200))
            .file("ok.txt", "small");

        let mut config = ScanConfig::default();
        config.limits.max_file_size = 100;

        let fetcher = fetcher_with(client, &config);
        let files = fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "ok.txt");
    }

    #[tokio::test]
    async fn missing_entry_is_skipped_not_fatal() {
        let client = MockClient::new()
            .dir("", &[("gone.txt", EntryKind::File), ("here.txt", EntryKind::File)])
            .file("here.txt", "data");
        // gone.txt has no tree entry, so the mock returns RepositoryAccess.

        let fetcher = fetcher_with(client, &ScanConfig::default());
        let files = fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "here.txt");
    }

    #[tokio::test]
    async fn failing_subtree_is_skipped_and_traversal_continues() {
        let client = MockClient::new()
            .dir(
                "",
                &[
                    ("broken", EntryKind::Directory),
                    ("good", EntryKind::Directory),
                ],
            )
            .dir("good", &[("good/a.txt", EntryKind::File)])
            .file("good/a.txt", "fine")
            .failing("broken", || ScanError::RemoteApi {
                status: Some(502),
                message: "bad gateway".into(),
            });

        // One retry budget keeps the test fast; the breaker threshold in the
        // default config is high enough not to trip.
        let mut config = ScanConfig::default();
        config.retry.max_retries = 0;

        let fetcher = fetcher_with(client, &config);
        let files = fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "good/a.txt");
    }

    #[tokio::test]
    async fn root_failure_aborts_the_fetch() {
        let client = MockClient::new().failing("", || ScanError::RemoteApi {
            status: Some(500),
            message: "server error".into(),
        });

        let mut config = ScanConfig::default();
        config.retry.max_retries = 0;

        let fetcher = fetcher_with(client, &config);
        let result = fetcher.fetch(&locator()).await;
        assert!(matches!(result, Err(ScanError::RemoteApi { .. })));
    }

    #[tokio::test]
    async fn explicit_path_fetches_single_file() {
        let client = MockClient::new().file("src/config.js", "let a = 1;");

        let fetcher = fetcher_with(client, &ScanConfig::default());
        let mut locator = locator();
        locator.path = Some("src/config.js".to_string());

        let files = fetcher.fetch(&locator).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/config.js");
        assert_eq!(files[0].content, "let a = 1;");
    }

    #[tokio::test]
    async fn custom_exclude_globs_apply() {
        let client = MockClient::new()
            .dir(
                "",
                &[
                    ("secrets.test.js", EntryKind::File),
                    ("app.js", EntryKind::File),
                ],
            )
            .file("app.js", "x")
            .file("secrets.test.js", "y");

        let mut config = ScanConfig::default();
        config.scanner.exclude_globs = vec!["*.test.js".to_string()];

        let fetcher = fetcher_with(client, &config);
        let files = fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "app.js");
    }

    #[tokio::test]
    async fn not_found_entries_are_not_retried() {
        let client = MockClient::new()
            .dir("", &[("gone.txt", EntryKind::File)]);

        let mut config = ScanConfig::default();
        config.retry.max_retries = 3;
        config.retry.base_delay_ms = 1;

        let fetcher = fetcher_with(client, &config);
        let files = fetcher.fetch(&locator()).await.unwrap();
        assert!(files.is_empty());

        let calls = fetcher.client.calls.lock().unwrap();
        let attempts = calls.iter().filter(|p| p.as_str() == "gone.txt").count();
        assert_eq!(attempts, 1);
    }
}
