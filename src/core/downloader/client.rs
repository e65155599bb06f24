use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::build_http_client;

/// Anything that can turn a URL into bytes.
///
/// The cache filler only talks to this trait, so tests can serve
/// artifacts from memory.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> UpdaterResult<Vec<u8>>;
}

/// HTTP downloader used for artifacts and manifests.
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
}

impl Downloader {
    pub fn new() -> UpdaterResult<Self> {
        Ok(Self {
            client: build_http_client()?,
            concurrency: 8,
        })
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// GET `url` and return the body.
    ///
    /// Only `200` and `302` count as success; anything else is
    /// `DownloadFailed`. No retries.
    pub async fn download_bytes(&self, url: &str) -> UpdaterResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !(status.is_success() || status == StatusCode::FOUND) {
            return Err(UpdaterError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Fetcher for Downloader {
    async fn fetch(&self, url: &str) -> UpdaterResult<Vec<u8>> {
        self.download_bytes(url).await
    }
}

/// Hex SHA-1 of `bytes`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Check `bytes` against an expected SHA-1 (case-insensitive hex).
pub fn verify_sha1(url: &str, bytes: &[u8], expected: &str) -> UpdaterResult<()> {
    let actual = sha1_hex(bytes);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(UpdaterError::Sha1Mismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
