//! GitHub content fetcher
//!
//! Resolves blob URLs to raw-content URLs, fetches with a size ceiling, and
//! keeps fetched text in the content cache keyed by a fingerprint of the
//! canonicalized raw URL.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::DomainError;
use crate::infrastructure::cache::ContentCache;
use crate::infrastructure::http_client::HttpClientTrait;

static BLOB_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/(?P<owner>[^/]+)/(?P<repo>[^/]+)/blob/(?P<git_ref>[^/]+)/(?P<path>.+)$")
        .expect("blob url regex")
});

static REPO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/(?P<owner>[^/]+)/(?P<repo>[^/#?]+)").expect("repo url regex")
});

/// A blob URL resolved to its raw-content form.
///
/// Canonicalization rule: input is trimmed, query/fragment dropped, a
/// trailing slash stripped, and host/owner/repo lowercased (GitHub treats
/// them case-insensitively). The ref and path are kept verbatim; branch
/// names are not resolved to commit SHAs, so two refs naming the same tree
/// are distinct cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContentUrl {
    pub url: String,
}

impl RawContentUrl {
    /// Rewrite a GitHub blob URL to its raw equivalent.
    pub fn from_blob_url(url: &str) -> Result<Self, DomainError> {
        let trimmed = normalize_input(url);

        let caps = BLOB_URL_RE.captures(&trimmed).ok_or_else(|| {
            DomainError::fetch("Unsupported GitHub URL. Use a direct blob file URL.")
        })?;

        Ok(Self {
            url: format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}",
                caps["owner"].to_ascii_lowercase(),
                caps["repo"].to_ascii_lowercase(),
                &caps["git_ref"],
                &caps["path"],
            ),
        })
    }

    /// Raw URL for a file at the top of a repository.
    pub fn for_repo_file(owner: &str, repo: &str, git_ref: &str, file: &str) -> Self {
        Self {
            url: format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}",
                owner.to_ascii_lowercase(),
                repo.to_ascii_lowercase(),
                git_ref,
                file,
            ),
        }
    }

    /// Cache fingerprint: sha256 hex of the canonical raw URL.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.url.as_bytes());
        hex::encode(digest)
    }
}

fn normalize_input(url: &str) -> String {
    let mut s = url.trim();
    if let Some(idx) = s.find(['?', '#']) {
        s = &s[..idx];
    }
    let s = s.trim_end_matches('/');

    // Lowercase the scheme and host only.
    match s.find("github.com") {
        Some(idx) => {
            let (head, tail) = s.split_at(idx + "github.com".len());
            format!("{}{}", head.to_ascii_lowercase(), tail)
        }
        None => s.to_string(),
    }
}

/// Owner/repo pair parsed from a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn parse(url: &str) -> Result<Self, DomainError> {
        let trimmed = normalize_input(url);
        let caps = REPO_URL_RE
            .captures(&trimmed)
            .ok_or_else(|| DomainError::fetch("Unsupported repository URL"))?;

        Ok(Self {
            owner: caps["owner"].to_ascii_lowercase(),
            repo: caps["repo"].trim_end_matches(".git").to_ascii_lowercase(),
        })
    }
}

/// Fetches GitHub raw content with caching and a hard size ceiling
pub struct ContentFetcher {
    client: Arc<dyn HttpClientTrait>,
    cache: Arc<ContentCache>,
    max_file_bytes: usize,
}

impl ContentFetcher {
    pub fn new(
        client: Arc<dyn HttpClientTrait>,
        cache: Arc<ContentCache>,
        max_file_bytes: usize,
    ) -> Self {
        Self {
            client,
            cache,
            max_file_bytes,
        }
    }

    /// Fetch a single blob URL, cache-first.
    pub async fn fetch_file(&self, blob_url: &str) -> Result<String, DomainError> {
        let raw = RawContentUrl::from_blob_url(blob_url)?;
        self.fetch_raw(&raw).await
    }

    /// Fetch several blob URLs and concatenate them with file-boundary
    /// markers so the model sees distinct files. Any failing URL fails the
    /// whole request.
    pub async fn fetch_files(&self, blob_urls: &[String]) -> Result<String, DomainError> {
        let mut parts = Vec::with_capacity(blob_urls.len());

        for (idx, url) in blob_urls.iter().enumerate() {
            let content = self
                .fetch_file(url)
                .await
                .map_err(|e| DomainError::fetch(format!("File {}: {}: {}", idx + 1, url, e)))?;
            parts.push(format!("// File {}: {}\n{}", idx + 1, url, content));
        }

        Ok(parts.join("\n\n"))
    }

    /// Fetch a repository's top-level README, trying `main` then `master`.
    pub async fn fetch_repo_readme(&self, repository_url: &str) -> Result<String, DomainError> {
        let repo = RepoRef::parse(repository_url)?;

        let mut tried = Vec::new();
        for branch in ["main", "master"] {
            let raw = RawContentUrl::for_repo_file(&repo.owner, &repo.repo, branch, "README.md");
            tried.push(raw.url.clone());
            match self.fetch_raw(&raw).await {
                Ok(content) => return Ok(content),
                Err(DomainError::Fetch { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::fetch(format!(
            "Could not fetch README.md from the repository (tried: {}). \
             Please provide specific file URLs instead.",
            tried.join(", ")
        )))
    }

    async fn fetch_raw(&self, raw: &RawContentUrl) -> Result<String, DomainError> {
        let fingerprint = raw.fingerprint();

        if let Some(cached) = self.cache.get(&fingerprint).await {
            debug!(url = %raw.url, "Content cache hit");
            return Ok(cached);
        }

        let bytes = self.client.get_bytes(&raw.url, self.max_file_bytes).await?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        self.cache.insert(fingerprint, content.clone()).await;
        debug!(url = %raw.url, bytes = bytes.len(), "Fetched and cached content");

        Ok(content)
    }
}
