use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::artifact::NexusRepository;
use crate::core::error::{UpdaterError, UpdaterResult};

/// One page of the repository's asset search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub download_url: String,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    pub maven2: Maven2,
    #[serde(default)]
    pub checksum: Option<Checksum>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maven2 {
    pub version: String,
    #[serde(default)]
    pub artifact_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Checksum {
    #[serde(default)]
    pub sha1: Option<String>,
}

impl SearchItem {
    /// Last path segment of the download URL, without any query string.
    pub fn published_filename(&self) -> Option<String> {
        let path = self.download_url.split(|c: char| c == '?' || c == '#').next()?;
        path.rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    pub fn sha1(&self) -> Option<&str> {
        self.checksum.as_ref()?.sha1.as_deref()
    }
}

/// Paginated index of published artifacts.
#[async_trait]
pub trait ArtifactIndex: Send + Sync {
    async fn page(&self, name: &str, continuation_token: Option<&str>) -> UpdaterResult<SearchPage>;
}

/// [`ArtifactIndex`] backed by a Nexus search endpoint.
pub struct NexusIndex {
    client: reqwest::Client,
    repository: NexusRepository,
}

impl NexusIndex {
    pub fn new(client: reqwest::Client, repository: NexusRepository) -> Self {
        Self { client, repository }
    }
}

#[async_trait]
impl ArtifactIndex for NexusIndex {
    async fn page(&self, name: &str, continuation_token: Option<&str>) -> UpdaterResult<SearchPage> {
        let url = self.repository.search_url(name, continuation_token)?;
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::DownloadFailed {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Follow the continuation token until the index is exhausted.
pub async fn fetch_all_items(
    index: &dyn ArtifactIndex,
    name: &str,
) -> UpdaterResult<Vec<SearchItem>> {
    let mut page = index.page(name, None).await?;
    let mut items = std::mem::take(&mut page.items);
    let mut seen_tokens = HashSet::new();

    while let Some(token) = page.continuation_token.take() {
        if !seen_tokens.insert(token.clone()) {
            warn!("Repository repeated continuation token for {}; stopping", name);
            break;
        }
        debug!("Fetching next page for {}", name);
        page = index.page(name, Some(&token)).await?;
        items.append(&mut page.items);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves pages keyed by continuation token ("" for the first page).
    struct PagedIndex {
        pages: HashMap<String, String>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ArtifactIndex for PagedIndex {
        async fn page(&self, _name: &str, token: Option<&str>) -> UpdaterResult<SearchPage> {
            *self.calls.lock().unwrap() += 1;
            let body = &self.pages[token.unwrap_or("")];
            Ok(serde_json::from_str(body)?)
        }
    }

    fn item(version: &str) -> String {
        format!(
            r#"{{"downloadUrl": "https://repo/Foo/{version}/Foo-{version}.jar?x=1",
                 "lastModified": "2024-01-0{version}T10:00:00.000+00:00",
                 "maven2": {{"version": "{version}", "artifactId": "Foo"}},
                 "checksum": {{"sha1": "abc"}}}}"#
        )
    }

    #[tokio::test]
    async fn follows_continuation_tokens() {
        let mut pages = HashMap::new();
        pages.insert(
            String::new(),
            format!(r#"{{"items": [{}], "continuationToken": "t1"}}"#, item("1")),
        );
        pages.insert(
            "t1".to_string(),
            format!(r#"{{"items": [{}, {}], "continuationToken": null}}"#, item("2"), item("3")),
        );
        let index = PagedIndex {
            pages,
            calls: Mutex::new(0),
        };

        let items = fetch_all_items(&index, "Foo").await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(*index.calls.lock().unwrap(), 2);
        assert_eq!(items[2].maven2.version, "3");
        assert_eq!(items[0].published_filename().as_deref(), Some("Foo-1.jar"));
        assert_eq!(items[0].sha1(), Some("abc"));
        assert!(items[0].last_modified.is_some());
    }

    #[tokio::test]
    async fn repeated_token_terminates() {
        let mut pages = HashMap::new();
        pages.insert(String::new(), r#"{"items": [], "continuationToken": "loop"}"#.to_string());
        pages.insert("loop".to_string(), r#"{"items": [], "continuationToken": "loop"}"#.to_string());
        let index = PagedIndex {
            pages,
            calls: Mutex::new(0),
        };

        let items = fetch_all_items(&index, "Foo").await.unwrap();
        assert!(items.is_empty());
        assert_eq!(*index.calls.lock().unwrap(), 2);
    }
}
