// ─── Config Synchronization ───
// Keeps an instance's `config/` directory in step with the pack's config
// repository at the tag named by the channel manifest, while preserving
// the player's own edits where they do not conflict.

mod git;

pub use git::{copy_dir_recursive, GitConfigSync, BACKUP_DIR, WORK_DIR};

use crate::core::error::UpdaterResult;
use crate::core::instance::Instance;

/// Result of synchronizing one instance's configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSyncOutcome {
    /// First run: configs replaced with the pack's, originals backed up.
    Initialized,
    /// Player changes merged with the new tag.
    Merged,
    Skipped(String),
}

/// Brings an instance's configs to a given pack config tag.
pub trait ConfigSynchronizer {
    fn sync(&self, instance: &Instance, tag: &str) -> UpdaterResult<ConfigSyncOutcome>;
}
