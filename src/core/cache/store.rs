use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::sanitize::{sanitize_component, sanitize_file_name_with_extension};

/// Files kept per mod when no setting overrides it.
pub const DEFAULT_KEEP_CACHED_FILES: usize = 10;

const PART_SUFFIX: &str = ".part";
const NAME_FALLBACK: &str = "";

/// On-disk artifact cache, one subdirectory per mod.
///
/// Layout: `<root>/<sanitized mod>/<sanitized file name>`.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
    keep: usize,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            root: root.into(),
            keep: keep.max(1),
        }
    }

    /// Create the cache root. Failing here is fatal for the run.
    pub fn ensure_root(&self) -> UpdaterResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| UpdaterError::io(&self.root, e))
    }

    pub fn mod_dir(&self, mod_name: &str) -> PathBuf {
        self.root.join(sanitize_component(mod_name, NAME_FALLBACK))
    }

    pub fn path_for(&self, mod_name: &str, filename: &str) -> PathBuf {
        self.mod_dir(mod_name)
            .join(sanitize_file_name_with_extension(filename, NAME_FALLBACK))
    }

    pub fn has(&self, mod_name: &str, filename: &str) -> bool {
        self.path_for(mod_name, filename).is_file()
    }

    pub fn resolve(&self, mod_name: &str, filename: &str) -> Option<PathBuf> {
        let path = self.path_for(mod_name, filename);
        path.is_file().then_some(path)
    }

    /// Move a file cached by older layouts (directly under the root) into
    /// the mod's directory. Returns whether anything moved.
    pub fn migrate_legacy(&self, mod_name: &str, filename: &str) -> UpdaterResult<bool> {
        let legacy = self
            .root
            .join(sanitize_file_name_with_extension(filename, NAME_FALLBACK));
        let target = self.path_for(mod_name, filename);
        if !legacy.is_file() || target.exists() {
            return Ok(false);
        }

        let dir = self.mod_dir(mod_name);
        std::fs::create_dir_all(&dir).map_err(|e| UpdaterError::io(&dir, e))?;
        std::fs::rename(&legacy, &target).map_err(|e| UpdaterError::io(&legacy, e))?;
        info!("Moved legacy cache file {:?} -> {:?}", legacy, target);
        Ok(true)
    }

    /// Write `bytes` as `filename` for `mod_name`, then enforce retention.
    ///
    /// The data lands in a uniquely named `.part` file first and is renamed
    /// into place, so a cached file is always complete.
    pub async fn store(&self, mod_name: &str, filename: &str, bytes: &[u8]) -> UpdaterResult<PathBuf> {
        let dir = self.mod_dir(mod_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| UpdaterError::io(&dir, e))?;

        let target = self.path_for(mod_name, filename);
        let part = dir.join(format!(".{}{}", uuid::Uuid::new_v4(), PART_SUFFIX));

        {
            let mut file = tokio::fs::File::create(&part)
                .await
                .map_err(|e| UpdaterError::io(&part, e))?;
            file.write_all(bytes)
                .await
                .map_err(|e| UpdaterError::io(&part, e))?;
            file.flush().await.map_err(|e| UpdaterError::io(&part, e))?;
        }

        if let Err(e) = tokio::fs::rename(&part, &target).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(UpdaterError::io(&target, e));
        }
        debug!("Cached {:?}", target);

        let cache = self.clone();
        let protect = target.clone();
        tokio::task::spawn_blocking(move || cache.evict(&dir, &protect))
            .await
            .map_err(|e| UpdaterError::Other(format!("cache eviction task failed: {e}")))??;
        Ok(target)
    }

    /// Delete the oldest files in `dir` until at most `keep` remain.
    /// `protect` is never deleted.
    pub fn evict(&self, dir: &Path, protect: &Path) -> UpdaterResult<Vec<PathBuf>> {
        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| UpdaterError::io(dir, e))? {
            let entry = entry.map_err(|e| UpdaterError::io(dir, e))?;
            let path = entry.path();
            let metadata = entry.metadata().map_err(|e| UpdaterError::io(&path, e))?;
            if !metadata.is_file() || path.to_string_lossy().ends_with(PART_SUFFIX) {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path));
        }

        if files.len() <= self.keep {
            return Ok(Vec::new());
        }

        let excess = files.len() - self.keep;
        files.retain(|(_, path)| path != protect);
        files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut evicted = Vec::with_capacity(excess);
        for (_, path) in files.into_iter().take(excess) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!("Cleaning cache: {:?}", path);
                    evicted.push(path);
                }
                Err(e) => warn!("Failed to evict {:?}: {}", path, e),
            }
        }
        Ok(evicted)
    }
}
