use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::cache::DEFAULT_KEEP_CACHED_FILES;
use crate::core::maven::{GTNH_GROUP, GTNH_NEXUS, GTNH_REPOSITORY};
use crate::core::version::manifest::{DEFAULT_ASSETS_URL, DEFAULT_OVERLAY_URL};

pub const APP_DIR_NAME: &str = "gtnh-nightly-updater";
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_CONFIG_REPOSITORY: &str = "https://github.com/GTNewHorizons/GT-New-Horizons-Modpack.git";

/// User-tunable settings, read from `settings.json` in the app directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterSettings {
    /// Cached builds kept per mod.
    pub keep_cached_files: usize,
    /// Parallel downloads and repository lookups.
    pub concurrency: usize,
    pub assets_url: String,
    /// Overlay manifest URL; `{channel}` is replaced by the channel name.
    pub overlay_url_template: String,
    pub repository_url: String,
    pub repository_name: String,
    pub repository_group: String,
    pub config_repository_url: String,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            keep_cached_files: DEFAULT_KEEP_CACHED_FILES,
            concurrency: 8,
            assets_url: DEFAULT_ASSETS_URL.to_string(),
            overlay_url_template: DEFAULT_OVERLAY_URL.to_string(),
            repository_url: GTNH_NEXUS.to_string(),
            repository_name: GTNH_REPOSITORY.to_string(),
            repository_group: GTNH_GROUP.to_string(),
            config_repository_url: DEFAULT_CONFIG_REPOSITORY.to_string(),
        }
    }
}

impl UpdaterSettings {
    /// Missing file means defaults; an unreadable one is reported and
    /// ignored.
    pub fn load(path: &Path) -> Self {
        match load_settings_from_disk(path) {
            Ok(Some(settings)) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Ignoring settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

fn load_settings_from_disk(path: &Path) -> Result<Option<UpdaterSettings>, Box<dyn std::error::Error>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Where the updater keeps its own files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// `<platform cache dir>/gtnh-nightly-updater`, unless overridden.
    pub fn new(override_root: Option<PathBuf>) -> Self {
        let root = override_root.unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        });
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact cache root.
    pub fn mods_cache(&self) -> PathBuf {
        self.root.join("mods")
    }

    pub fn local_overrides(&self) -> PathBuf {
        self.root.join("local-assets.txt")
    }

    pub fn exclusions(&self) -> PathBuf {
        self.root.join("mod-exclusions.txt")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
}
