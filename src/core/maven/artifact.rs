use std::fmt;

use reqwest::Url;

use crate::core::error::{UpdaterError, UpdaterResult};

/// Coordinates of one asset on the primary repository.
///
/// `group` narrows the search to the pack's own group; leaving it out is
/// the "expanded" search used when the narrow one finds nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetQuery {
    pub group: Option<String>,
    pub name: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

impl AssetQuery {
    pub fn jar(name: &str, version: &str) -> Self {
        Self {
            group: None,
            name: name.to_string(),
            version: version.to_string(),
            classifier: None,
            extension: "jar".to_string(),
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_classifier(mut self, classifier: &str, extension: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self.extension = extension.to_string();
        self
    }

    /// `name-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.name, self.version, c, self.extension),
            None => format!("{}-{}.{}", self.name, self.version, self.extension),
        }
    }
}

impl fmt::Display for AssetQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = self.group.as_deref().unwrap_or("*");
        match &self.classifier {
            Some(c) => write!(
                f,
                "{}:{}:{}:{}@{}",
                group, self.name, self.version, c, self.extension
            ),
            None => write!(f, "{}:{}:{}@{}", group, self.name, self.version, self.extension),
        }
    }
}

/// A Nexus repository exposing the REST search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NexusRepository {
    pub base_url: String,
    pub repository: String,
}

impl NexusRepository {
    pub fn new(base_url: &str, repository: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> UpdaterResult<Url> {
        let raw = format!("{}/service/rest/v1/{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| UpdaterError::Other(format!("Invalid repository URL {raw}: {e}")))
    }

    /// Search for every unclassified jar published under `name`.
    ///
    /// Template:
    /// `<base>/service/rest/v1/search/assets?sort=version&repository=<repo>&name=<name>&maven.extension=jar&maven.classifier=[&continuationToken=<token>]`
    pub fn search_url(&self, name: &str, continuation_token: Option<&str>) -> UpdaterResult<String> {
        let mut url = self.endpoint("search/assets")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("sort", "version")
                .append_pair("repository", &self.repository)
                .append_pair("name", name)
                .append_pair("maven.extension", "jar")
                .append_pair("maven.classifier", "");
            if let Some(token) = continuation_token {
                query.append_pair("continuationToken", token);
            }
        }
        Ok(url.into())
    }

    /// Direct download endpoint for a single asset.
    pub fn download_url(&self, asset: &AssetQuery) -> UpdaterResult<String> {
        let mut url = self.endpoint("search/assets/download")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("repository", &self.repository);
            if let Some(group) = &asset.group {
                query.append_pair("group", group);
            }
            query
                .append_pair("name", &asset.name)
                .append_pair("maven.extension", &asset.extension)
                .append_pair("maven.classifier", asset.classifier.as_deref().unwrap_or(""))
                .append_pair("version", &asset.version);
        }
        Ok(url.into())
    }
}
