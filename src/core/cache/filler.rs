use std::collections::HashSet;
use std::path::PathBuf;

use futures_util::{stream, StreamExt};
use tracing::{info, warn};

use super::store::ArtifactCache;
use crate::core::downloader::{verify_sha1, Fetcher};
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::maven::{AssetQuery, NexusRepository};
use crate::core::pack::Mod;

/// Mods that ship platform companions next to their jar, with the
/// `(classifier, extension)` of each companion.
const COMPANIONS: &[(&str, &[(&str, &str)])] = &[(
    "lwjgl3ify",
    &[("multimc", "zip"), ("forgePatches", "jar")],
)];

fn companions_of(mod_name: &str) -> &'static [(&'static str, &'static str)] {
    COMPANIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(mod_name))
        .map(|(_, companions)| *companions)
        .unwrap_or(&[])
}

/// How one mod fared while filling the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Already cached.
    Present,
    Downloaded,
    /// Not shipped, excluded, or nothing to fetch.
    Skipped,
    Failed,
}

/// Totals for one cache fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub present: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FillReport {
    fn record(&mut self, outcome: FillOutcome) {
        match outcome {
            FillOutcome::Present => self.present += 1,
            FillOutcome::Downloaded => self.downloaded += 1,
            FillOutcome::Skipped => self.skipped += 1,
            FillOutcome::Failed => self.failed += 1,
        }
    }
}

/// Makes sure every shipped mod's target version is in the cache and
/// records where it lives.
pub struct CacheFiller<'a> {
    cache: &'a ArtifactCache,
    fetcher: &'a dyn Fetcher,
    repository: &'a NexusRepository,
    group: String,
    concurrency: usize,
}

impl<'a> CacheFiller<'a> {
    pub fn new(
        cache: &'a ArtifactCache,
        fetcher: &'a dyn Fetcher,
        repository: &'a NexusRepository,
        group: &str,
        concurrency: usize,
    ) -> Self {
        Self {
            cache,
            fetcher,
            repository,
            group: group.to_string(),
            concurrency: concurrency.max(1),
        }
    }

    /// Fill the cache for every mod. Sets `cache_path` (and `extra_assets`)
    /// on each target version that ends up cached.
    pub async fn fill(&self, mods: &mut [Mod], exclusions: &HashSet<String>) -> FillReport {
        info!("Caching mods");
        let outcomes: Vec<FillOutcome> = stream::iter(mods.iter_mut())
            .map(|m| {
                let excluded = exclusions.contains(&m.name);
                self.fill_mod(m, excluded)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = FillReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }
        info!(
            "Cache: {} present, {} downloaded, {} skipped, {} failed",
            report.present, report.downloaded, report.skipped, report.failed
        );
        report
    }

    async fn fill_mod(&self, m: &mut Mod, excluded: bool) -> FillOutcome {
        if m.side.is_none() || m.versions.is_empty() || excluded {
            return FillOutcome::Skipped;
        }

        let Some(version) = m.target_version() else {
            warn!(
                "Unable to find version of {}: {}",
                m.name,
                m.latest_version.as_deref().unwrap_or("<none>")
            );
            return FillOutcome::Failed;
        };
        let version_string = version.version.clone();
        let filename = version.filename.clone();
        let sha1 = version.sha1.clone();
        let urls = self.candidate_urls(m, version.download_url.as_deref(), &version_string);

        if let Err(e) = self.cache.migrate_legacy(&m.name, &filename) {
            warn!("Could not migrate cached {}: {}", filename, e);
        }

        let outcome = if self.cache.has(&m.name, &filename) {
            FillOutcome::Present
        } else {
            match self.download_first(&m.name, &filename, &urls, sha1.as_deref()).await {
                Ok(_) => FillOutcome::Downloaded,
                Err(e) => {
                    warn!("Failed to cache {} {}: {}", m.name, version_string, e);
                    return FillOutcome::Failed;
                }
            }
        };

        let cache_path = self.cache.path_for(&m.name, &filename);
        let extras = self.fill_companions(&m.name, &version_string).await;
        if let Some(target) = m.target_version_mut() {
            target.cache_path = Some(cache_path);
            target.extra_assets = extras;
        }
        outcome
    }

    /// Download URLs for a target version, in the order they are tried.
    fn candidate_urls(&self, m: &Mod, download_url: Option<&str>, version: &str) -> Vec<String> {
        let grouped = self
            .repository
            .download_url(&AssetQuery::jar(&m.name, version).in_group(&self.group));

        let mut urls = Vec::new();
        match (m.private, download_url) {
            (false, Some(url)) => urls.push(url.to_string()),
            _ => match grouped {
                Ok(url) => urls.push(url),
                Err(e) => warn!("{}", e),
            },
        }

        if m.is_primary() {
            match self.repository.download_url(&AssetQuery::jar(&m.name, version)) {
                Ok(expanded) if !urls.contains(&expanded) => urls.push(expanded),
                Ok(_) => {}
                Err(e) => warn!("{}", e),
            }
        }
        urls
    }

    async fn download_first(
        &self,
        mod_name: &str,
        filename: &str,
        urls: &[String],
        sha1: Option<&str>,
    ) -> UpdaterResult<PathBuf> {
        let mut last_error = UpdaterError::Other(format!("No download location for {mod_name}"));
        for url in urls {
            info!("Downloading {} from {}", filename, url);
            let attempt = async {
                let bytes = self.fetcher.fetch(url).await?;
                if let Some(expected) = sha1 {
                    verify_sha1(url, &bytes, expected)?;
                }
                self.cache.store(mod_name, filename, &bytes).await
            };
            match attempt.await {
                Ok(path) => return Ok(path),
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn fill_companions(&self, mod_name: &str, version: &str) -> Vec<PathBuf> {
        let mut extras = Vec::new();
        for (classifier, extension) in companions_of(mod_name) {
            let query = AssetQuery::jar(mod_name, version).with_classifier(classifier, extension);
            let filename = query.filename();
            if let Some(path) = self.cache.resolve(mod_name, &filename) {
                extras.push(path);
                continue;
            }

            let fetched = match self.repository.download_url(&query) {
                Ok(url) => self.download_first(mod_name, &filename, &[url], None).await,
                Err(e) => Err(e),
            };
            match fetched {
                Ok(path) => extras.push(path),
                Err(e) => warn!("Failed to cache companion {}: {}", filename, e),
            }
        }
        extras
    }
}
