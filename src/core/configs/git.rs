use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use super::{ConfigSyncOutcome, ConfigSynchronizer};
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::instance::Instance;

/// Working clone of the config repository, inside the game directory.
pub const WORK_DIR: &str = ".updater_pack_configs";
/// Copy of the player's configs taken before the first replacement.
pub const BACKUP_DIR: &str = "config_backup_updater";

const COMMIT_MESSAGE: &str = "Update configurations from player's config directory";
const IDENTITY: [&str; 4] = [
    "-c",
    "user.name=nightly-updater",
    "-c",
    "user.email=nightly-updater@localhost",
];

/// [`ConfigSynchronizer`] driving the `git` command line.
pub struct GitConfigSync {
    repository_url: String,
    git: PathBuf,
    /// Allow the first run to overwrite the player's configs.
    accept_reset: bool,
}

impl GitConfigSync {
    pub fn new(repository_url: &str, accept_reset: bool) -> Self {
        Self {
            repository_url: repository_url.to_string(),
            git: PathBuf::from("git"),
            accept_reset,
        }
    }

    /// Use a specific git executable.
    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    fn git_available(&self) -> bool {
        Command::new(&self.git)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn run_git<I, S>(&self, args: I) -> UpdaterResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.git);
        cmd.args(IDENTITY).args(args).stdin(Stdio::null());
        let rendered = format!("{:?}", cmd);
        info!("Executing {}", rendered);

        let output = cmd
            .output()
            .map_err(|e| UpdaterError::ConfigSync(format!("failed to start git: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{}", stdout.trim());
        }
        if !output.status.success() {
            return Err(UpdaterError::ConfigSync(format!(
                "{} exited with {}: {}",
                rendered,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn initialize(&self, instance: &Instance, work: &Path, tag: &str) -> UpdaterResult<()> {
        if work.exists() {
            std::fs::remove_dir_all(work).map_err(|e| UpdaterError::io(work, e))?;
        }
        let work_arg = work.as_os_str();
        self.run_git([
            OsStr::new("clone"),
            OsStr::new("--depth"),
            OsStr::new("1"),
            OsStr::new("--branch"),
            OsStr::new(tag),
            OsStr::new(&self.repository_url),
            work_arg,
        ])?;
        self.run_git([OsStr::new("-C"), work_arg, OsStr::new("checkout"), OsStr::new("-b"), OsStr::new("local")])?;

        let backup = instance.minecraft_dir.join(BACKUP_DIR);
        replace_dir(&instance.config_dir(), &backup)?;
        info!("Backed up original config to {:?}", backup);
        Ok(())
    }

    fn merge(&self, instance: &Instance, work: &Path, tag: &str) -> UpdaterResult<()> {
        replace_dir(&instance.config_dir(), &work.join("config"))?;

        let work_arg = work.as_os_str();
        info!("Staging and committing config changes");
        self.run_git([OsStr::new("-C"), work_arg, OsStr::new("add"), OsStr::new(".")])?;
        self.run_git([
            OsStr::new("-C"),
            work_arg,
            OsStr::new("commit"),
            OsStr::new("--allow-empty"),
            OsStr::new("-m"),
            OsStr::new(COMMIT_MESSAGE),
        ])?;

        info!("Merging changes");
        self.run_git([
            OsStr::new("-C"),
            work_arg,
            OsStr::new("fetch"),
            OsStr::new("--no-tags"),
            OsStr::new("origin"),
            OsStr::new("tag"),
            OsStr::new(tag),
        ])?;
        self.run_git([
            OsStr::new("-C"),
            work_arg,
            OsStr::new("merge"),
            OsStr::new("--no-stat"),
            OsStr::new("--no-edit"),
            OsStr::new("-X"),
            OsStr::new("theirs"),
            OsStr::new(tag),
        ])
        .map_err(|e| {
            UpdaterError::ConfigSync(format!(
                "conflicts need to be resolved manually in {:?} ({e})",
                work
            ))
        })
    }
}

impl ConfigSynchronizer for GitConfigSync {
    fn sync(&self, instance: &Instance, tag: &str) -> UpdaterResult<ConfigSyncOutcome> {
        if !self.git_available() {
            warn!("Git is not installed on your system, not handling configs");
            return Ok(ConfigSyncOutcome::Skipped("git not available".to_string()));
        }

        let work = instance.minecraft_dir.join(WORK_DIR);
        info!("Updating configs of {} from tag '{}'", instance, tag);

        let outcome = if work.join(".git").exists() {
            self.merge(instance, &work, tag)?;
            ConfigSyncOutcome::Merged
        } else {
            if !self.accept_reset {
                warn!(
                    "Config tracking for {} starts by replacing your configs with the pack's ({} at {}); \
                     rerun with --accept-config-reset to allow it",
                    instance, self.repository_url, tag
                );
                return Ok(ConfigSyncOutcome::Skipped("config reset not accepted".to_string()));
            }
            self.initialize(instance, &work, tag)?;
            ConfigSyncOutcome::Initialized
        };

        replace_dir(&work.join("config"), &instance.config_dir())?;
        Ok(outcome)
    }
}

/// Make `destination` an exact copy of `source`. A missing source leaves an
/// empty destination.
fn replace_dir(source: &Path, destination: &Path) -> UpdaterResult<()> {
    debug!("Copying from {:?} to {:?}", source, destination);
    if destination.exists() {
        std::fs::remove_dir_all(destination).map_err(|e| UpdaterError::io(destination, e))?;
    }
    std::fs::create_dir_all(destination).map_err(|e| UpdaterError::io(destination, e))?;
    if source.is_dir() {
        copy_dir_recursive(source, destination)?;
    }
    Ok(())
}

pub fn copy_dir_recursive(source: &Path, destination: &Path) -> UpdaterResult<()> {
    for entry in std::fs::read_dir(source).map_err(|e| UpdaterError::io(source, e))? {
        let entry = entry.map_err(|e| UpdaterError::io(source, e))?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| UpdaterError::io(&src_path, e))?;

        if file_type.is_dir() {
            std::fs::create_dir_all(&dst_path).map_err(|e| UpdaterError::io(&dst_path, e))?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            if dst_path.exists() {
                std::fs::remove_file(&dst_path).map_err(|e| UpdaterError::io(&dst_path, e))?;
            }
            std::fs::copy(&src_path, &dst_path).map_err(|e| UpdaterError::io(&dst_path, e))?;
        }
    }

    Ok(())
}
