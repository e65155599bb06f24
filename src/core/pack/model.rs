use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::UpdaterError;
use crate::core::instance::InstanceSide;
use crate::core::version::{compare_versions, is_prerelease};

/// Deployment type a mod belongs to, without any variant qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideKind {
    Client,
    Server,
    Both,
    None,
}

/// Side assignment from the manifest, e.g. `BOTH`, `NONE` or `CLIENT_JAVA9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Side {
    pub kind: SideKind,
    /// Text after the first `_`, kept only for display.
    pub qualifier: Option<String>,
}

impl Side {
    pub const fn both() -> Self {
        Self {
            kind: SideKind::Both,
            qualifier: None,
        }
    }

    pub const fn none() -> Self {
        Self {
            kind: SideKind::None,
            qualifier: None,
        }
    }

    /// Absent side values mean `BOTH`.
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, UpdaterError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse(),
            None => Ok(Self::both()),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == SideKind::None
    }

    /// Whether an instance of the given side should carry this mod.
    pub fn applies_to(&self, instance: InstanceSide) -> bool {
        match self.kind {
            SideKind::Both => true,
            SideKind::None => false,
            SideKind::Client => instance == InstanceSide::Client,
            SideKind::Server => instance == InstanceSide::Server,
        }
    }
}

impl FromStr for Side {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, qualifier) = match s.split_once('_') {
            Some((head, rest)) => (head, Some(rest.to_string())),
            None => (s, None),
        };
        let kind = match head.to_ascii_uppercase().as_str() {
            "CLIENT" => SideKind::Client,
            "SERVER" => SideKind::Server,
            "BOTH" => SideKind::Both,
            "NONE" => SideKind::None,
            _ => return Err(UpdaterError::InvalidSide(s.to_string())),
        };
        Ok(Self { kind, qualifier })
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = match self.kind {
            SideKind::Client => "CLIENT",
            SideKind::Server => "SERVER",
            SideKind::Both => "BOTH",
            SideKind::None => "NONE",
        };
        match &self.qualifier {
            Some(q) => write!(f, "{head}_{q}"),
            None => f.write_str(head),
        }
    }
}

/// Which version a mod should track when its history is re-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Highest version without a pre-release marker.
    Releases,
    /// Highest version overall.
    Prereleases,
}

/// File name the pack uses for a mod version.
pub fn canonical_filename(mod_name: &str, version: &str) -> String {
    format!("{mod_name}-{version}.jar")
}

/// One published build of a mod.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    pub version: String,
    /// Canonical `<mod>-<version>.jar` name.
    pub filename: String,
    /// Name the artifact was published under, when it differs.
    pub alias: Option<String>,
    pub download_url: Option<String>,
    pub sha1: Option<String>,
    pub prerelease: bool,
    /// Set once the artifact is materialized in the cache.
    pub cache_path: Option<PathBuf>,
    /// Companion artifacts cached next to the main one.
    pub extra_assets: Vec<PathBuf>,
}

impl Version {
    pub fn new(mod_name: &str, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            filename: canonical_filename(mod_name, &version),
            prerelease: is_prerelease(&version),
            version,
            alias: None,
            download_url: None,
            sha1: None,
            cache_path: None,
            extra_assets: Vec::new(),
        }
    }

    /// Canonical name first, then the alias if it is a different name.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        let alias = self
            .alias
            .as_deref()
            .filter(|alias| !alias.eq_ignore_ascii_case(&self.filename));
        std::iter::once(self.filename.as_str()).chain(alias)
    }
}

/// A mod in the desired state, keyed by `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mod {
    pub name: String,
    pub side: Side,
    /// `None` means the mod lives on the primary repository.
    pub source: Option<String>,
    /// Only downloadable through the primary repository.
    pub private: bool,
    pub latest_version: Option<String>,
    pub versions: Vec<Version>,
}

impl Mod {
    pub fn new(name: impl Into<String>, side: Side) -> Self {
        Self {
            name: name.into(),
            side,
            source: None,
            private: false,
            latest_version: None,
            versions: Vec::new(),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.source.is_none()
    }

    pub fn find_version(&self, version: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.version == version)
    }

    pub fn find_version_mut(&mut self, version: &str) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.version == version)
    }

    /// The version `latest_version` points at, if it is known.
    pub fn target_version(&self) -> Option<&Version> {
        let latest = self.latest_version.as_deref()?;
        self.find_version(latest)
    }

    pub fn target_version_mut(&mut self) -> Option<&mut Version> {
        let latest = self.latest_version.clone()?;
        self.find_version_mut(&latest)
    }

    /// Sort the history ascending by version order.
    pub fn sort_versions(&mut self) {
        self.versions
            .sort_by(|a, b| compare_versions(&a.version, &b.version));
    }

    /// Highest version eligible under `tracking`.
    pub fn tip(&self, tracking: Tracking) -> Option<&Version> {
        self.versions
            .iter()
            .filter(|v| tracking == Tracking::Prereleases || !v.prerelease)
            .max_by(|a, b| compare_versions(&a.version, &b.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_qualified_sides() {
        assert_eq!("BOTH".parse::<Side>().unwrap(), Side::both());
        let side: Side = "CLIENT_JAVA9".parse().unwrap();
        assert_eq!(side.kind, SideKind::Client);
        assert_eq!(side.qualifier.as_deref(), Some("JAVA9"));
        assert_eq!(side.to_string(), "CLIENT_JAVA9");
        assert!("sideways".parse::<Side>().is_err());
    }

    #[test]
    fn missing_side_means_both() {
        assert_eq!(Side::parse_optional(None).unwrap(), Side::both());
        assert_eq!(Side::parse_optional(Some("  ")).unwrap(), Side::both());
    }

    #[test]
    fn side_applicability() {
        let client: Side = "CLIENT_JAVA9".parse().unwrap();
        assert!(client.applies_to(InstanceSide::Client));
        assert!(!client.applies_to(InstanceSide::Server));
        assert!(Side::both().applies_to(InstanceSide::Server));
        assert!(!Side::none().applies_to(InstanceSide::Client));
    }

    #[test]
    fn version_alias_is_deduplicated() {
        let mut v = Version::new("Foo", "1.0");
        v.alias = Some("foo-1.0.jar".into());
        assert_eq!(v.file_names().collect::<Vec<_>>(), vec!["Foo-1.0.jar"]);
        v.alias = Some("Foo-1.0-dev.jar".into());
        assert_eq!(v.file_names().count(), 2);
    }

    #[test]
    fn tip_respects_tracking() {
        let mut m = Mod::new("Foo", Side::both());
        m.versions = vec![
            Version::new("Foo", "1.1.0"),
            Version::new("Foo", "1.2.0-pre"),
            Version::new("Foo", "1.0.0"),
        ];
        assert_eq!(m.tip(Tracking::Releases).unwrap().version, "1.1.0");
        assert_eq!(m.tip(Tracking::Prereleases).unwrap().version, "1.2.0-pre");

        m.sort_versions();
        let order: Vec<_> = m.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(order, vec!["1.0.0", "1.1.0", "1.2.0-pre"]);
    }
}
