// ─── Pack Manifests ───
// Fetches the desired state in two phases: the base asset manifest lists
// every mod the pack has ever known with its full history, and the
// per-channel overlay picks which of them ship, on which side, at which
// version. Applying the overlay produces the Mod records the rest of the
// pipeline works with.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::pack::{Mod, Side, Tracking, Version};

pub const DEFAULT_ASSETS_URL: &str =
    "https://raw.githubusercontent.com/GTNewHorizons/DreamAssemblerXXL/refs/heads/master/gtnh-assets.json";
pub const DEFAULT_OVERLAY_URL: &str =
    "https://raw.githubusercontent.com/GTNewHorizons/DreamAssemblerXXL/refs/heads/master/releases/manifests/{channel}.json";

/// Which published overlay to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Nightly,
    Daily,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Nightly => "nightly",
            Channel::Daily => "daily",
        }
    }

    /// Nightlies follow every build, dailies only releases.
    pub fn tracking(&self) -> Tracking {
        match self {
            Channel::Nightly => Tracking::Prereleases,
            Channel::Daily => Tracking::Releases,
        }
    }

    pub fn overlay_url(&self, template: &str) -> String {
        template.replace("{channel}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nightly" => Ok(Channel::Nightly),
            "daily" => Ok(Channel::Daily),
            other => Err(UpdaterError::Other(format!(
                "Unknown channel '{other}' (expected nightly or daily)"
            ))),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base asset manifest (`gtnh-assets.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct BaseManifest {
    pub mods: Vec<BaseMod>,
    #[serde(default)]
    pub latest_nightly: Option<u64>,
    #[serde(default)]
    pub latest_successful_nightly: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseMod {
    pub name: String,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub versions: Vec<BaseVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseVersion {
    pub version_tag: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub browser_download_url: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
}

/// Per-channel overlay (`releases/manifests/<channel>.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayManifest {
    /// Tag of the config repository matching this release.
    pub config: String,
    #[serde(default)]
    pub github_mods: BTreeMap<String, OverlayEntry>,
    #[serde(default)]
    pub external_mods: BTreeMap<String, OverlayEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlayEntry {
    pub version: String,
    #[serde(default)]
    pub side: Option<String>,
}

/// The enriched mod set plus what travels alongside it.
#[derive(Debug, Clone)]
pub struct DesiredState {
    pub mods: Vec<Mod>,
    pub config_tag: String,
}

async fn fetch_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> UpdaterResult<T> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(UpdaterError::ManifestFetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

impl BaseManifest {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> UpdaterResult<Self> {
        info!("Fetching asset manifest...");
        let manifest: BaseManifest = fetch_json(client, url).await?;
        info!(
            "Loaded {} mods (latest nightly {}, last successful {})",
            manifest.mods.len(),
            manifest.latest_nightly.map_or("?".into(), |n| n.to_string()),
            manifest.latest_successful_nightly.map_or("?".into(), |n| n.to_string()),
        );
        Ok(manifest)
    }
}

impl OverlayManifest {
    pub async fn fetch(client: &reqwest::Client, template: &str, channel: Channel) -> UpdaterResult<Self> {
        info!("Fetching {} manifest...", channel);
        let overlay: OverlayManifest = fetch_json(client, &channel.overlay_url(template)).await?;
        info!(
            "{} manifest ships {} pack mods and {} external mods, configs {}",
            channel,
            overlay.github_mods.len(),
            overlay.external_mods.len(),
            overlay.config
        );
        Ok(overlay)
    }
}

fn build_mod(raw: &BaseMod) -> Mod {
    let mut m = Mod::new(raw.name.clone(), Side::none());
    m.source = raw.source.clone();
    m.private = raw.private;
    m.latest_version = raw.latest_version.clone();

    for raw_version in &raw.versions {
        if m.find_version(&raw_version.version_tag).is_some() {
            continue;
        }
        let mut version = Version::new(&raw.name, raw_version.version_tag.clone());
        version.prerelease |= raw_version.prerelease;
        version.alias = raw_version.filename.clone();
        version.download_url = if m.is_primary() {
            raw_version.browser_download_url.clone()
        } else {
            raw_version
                .download_url
                .clone()
                .or_else(|| raw_version.browser_download_url.clone())
        };
        m.versions.push(version);
    }
    m.sort_versions();
    m
}

/// Combine the base manifest with a channel overlay.
///
/// Every mod starts out unshipped (`NONE`); only mods the overlay names get
/// a side and a pinned version. Overlay entries for unknown mods are
/// ignored.
pub fn apply_overlay(base: &BaseManifest, overlay: &OverlayManifest) -> DesiredState {
    let mut mods: Vec<Mod> = Vec::with_capacity(base.mods.len());
    for raw in &base.mods {
        if mods.iter().any(|m| m.name == raw.name) {
            warn!("Duplicate mod {} in asset manifest; keeping the first", raw.name);
            continue;
        }
        mods.push(build_mod(raw));
    }

    for (name, entry) in overlay.github_mods.iter().chain(&overlay.external_mods) {
        let Some(m) = mods.iter_mut().find(|m| &m.name == name) else {
            warn!("Manifest names unknown mod {}", name);
            continue;
        };
        match Side::parse_optional(entry.side.as_deref()) {
            Ok(side) => {
                m.side = side;
                m.latest_version = Some(entry.version.clone());
            }
            Err(e) => warn!("Not shipping {}: {}", name, e),
        }
    }

    DesiredState {
        mods,
        config_tag: overlay.config.clone(),
    }
}
