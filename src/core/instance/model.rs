use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::UpdaterError;

/// Which kind of install an instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceSide {
    Client,
    Server,
}

impl FromStr for InstanceSide {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLIENT" => Ok(Self::Client),
            "SERVER" => Ok(Self::Server),
            _ => Err(UpdaterError::InvalidSide(format!(
                "{s} (instances must be CLIENT or SERVER)"
            ))),
        }
    }
}

impl fmt::Display for InstanceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceSide::Client => write!(f, "CLIENT"),
            InstanceSide::Server => write!(f, "SERVER"),
        }
    }
}

/// A pack installation to reconcile.
///
/// `minecraft_dir` is the game directory (`.minecraft` for clients, the
/// server root for servers) with:
/// - `mods/`: installed mod jars
/// - `config/`: mod configuration, handled by the config synchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub minecraft_dir: PathBuf,
    pub side: InstanceSide,
    /// Link mods to the cache instead of copying them.
    pub use_symlinks: bool,
}

impl Instance {
    pub fn new(minecraft_dir: impl Into<PathBuf>, side: InstanceSide) -> Self {
        Self {
            minecraft_dir: minecraft_dir.into(),
            side,
            use_symlinks: false,
        }
    }

    pub fn with_symlinks(mut self, use_symlinks: bool) -> Self {
        self.use_symlinks = use_symlinks;
        self
    }

    /// Path to the `mods/` directory.
    pub fn mods_dir(&self) -> PathBuf {
        self.minecraft_dir.join("mods")
    }

    /// Path to the `config/` directory.
    pub fn config_dir(&self) -> PathBuf {
        self.minecraft_dir.join("config")
    }

    /// Directory above the game directory (the launcher's instance folder).
    pub fn launcher_dir(&self) -> PathBuf {
        self.minecraft_dir
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.minecraft_dir.clone())
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.side, self.minecraft_dir.display())
    }
}

/// Parses `<side>[+symlink]=<path>`, e.g. `server+symlink=/srv/gtnh`.
impl FromStr for Instance {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descriptor, path) = s.split_once('=').ok_or_else(|| {
            UpdaterError::InvalidInstance(format!("{s}: expected <side>[+symlink]=<path>"))
        })?;

        let (side, flag) = match descriptor.split_once('+') {
            Some((side, flag)) => (side, Some(flag)),
            None => (descriptor, None),
        };
        let use_symlinks = match flag.map(str::trim) {
            None => false,
            Some(flag) if flag.eq_ignore_ascii_case("symlink") => true,
            Some(flag) => {
                return Err(UpdaterError::InvalidInstance(format!(
                    "{s}: unknown flag '{flag}'"
                )))
            }
        };

        let path = path.trim();
        if path.is_empty() {
            return Err(UpdaterError::InvalidInstance(format!("{s}: empty path")));
        }

        Ok(Instance::new(path, side.parse()?).with_symlinks(use_symlinks))
    }
}
