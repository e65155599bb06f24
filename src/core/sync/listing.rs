use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{UpdaterError, UpdaterResult};

/// Snapshot of the jars in an instance's `mods/` directory.
///
/// Lookups are case-insensitive, stored names keep their original case.
/// On a case-sensitive filesystem several files can share one key; all of
/// them are kept so none escapes cleanup.
#[derive(Debug, Clone, Default)]
pub struct ModListing {
    entries: BTreeMap<String, Vec<ListedFile>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub name: String,
    pub path: PathBuf,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl ModListing {
    /// Read every `*.jar` in `mods_dir`. Symlinks are listed even when broken.
    pub fn scan(mods_dir: &Path) -> UpdaterResult<Self> {
        debug!("Gathering existing mods in {:?}", mods_dir);
        let mut listing = Self::default();

        let entries = std::fs::read_dir(mods_dir).map_err(|e| UpdaterError::io(mods_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| UpdaterError::io(mods_dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.to_lowercase().ends_with(".jar") {
                continue;
            }
            let file_type = entry.file_type().map_err(|e| UpdaterError::io(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }
            listing.insert(name, entry.path());
        }

        Ok(listing)
    }

    /// Add a file. A file with the exact same name replaces the old entry.
    pub fn insert(&mut self, name: impl Into<String>, path: PathBuf) {
        let name = name.into();
        let variants = self.entries.entry(key(&name)).or_default();
        variants.retain(|file| file.name != name);
        variants.push(ListedFile { name, path });
        variants.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    /// Remove every file whose name matches `name` ignoring case.
    pub fn remove(&mut self, name: &str) -> Vec<ListedFile> {
        self.entries.remove(&key(name)).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListedFile> {
        self.entries.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Names confirmed correct during one pass; later mods must not delete them.
#[derive(Debug, Clone, Default)]
pub struct KeptMods(BTreeSet<String>);

impl KeptMods {
    pub fn insert(&mut self, name: &str) {
        self.0.insert(key(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_but_names_keep_it() {
        let mut listing = ModListing::default();
        listing.insert("Botania-r1.1.jar", PathBuf::from("/mods/Botania-r1.1.jar"));

        assert!(listing.contains("botania-R1.1.JAR"));
        let removed = listing.remove("BOTANIA-r1.1.jar");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].name, "Botania-r1.1.jar");
        assert!(listing.is_empty());
        assert!(listing.remove("botania-r1.1.jar").is_empty());
    }

    #[test]
    fn case_variants_are_all_kept() {
        let mut listing = ModListing::default();
        listing.insert("Foo-1.0.jar", PathBuf::from("/mods/Foo-1.0.jar"));
        listing.insert("FOO-1.0.jar", PathBuf::from("/mods/FOO-1.0.jar"));
        listing.insert("Foo-1.0.jar", PathBuf::from("/mods/Foo-1.0.jar"));

        let mut names: Vec<_> = listing.iter().map(|f| f.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["FOO-1.0.jar", "Foo-1.0.jar"]);

        let removed: Vec<_> = listing.remove("foo-1.0.jar").into_iter().map(|f| f.name).collect();
        assert_eq!(removed, vec!["FOO-1.0.jar", "Foo-1.0.jar"]);
        assert!(listing.is_empty());
    }

    #[test]
    fn scan_keeps_names_that_differ_only_by_case() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("Foo-1.0.jar"), b"a").unwrap();
        if std::fs::write(temp.path().join("FOO-1.0.jar"), b"b").is_err()
            || std::fs::read_dir(temp.path()).unwrap().count() < 2
        {
            // Case-insensitive filesystem; only one file can exist.
            return;
        }

        let listing = ModListing::scan(temp.path()).unwrap();
        assert_eq!(listing.iter().count(), 2);
    }

    #[test]
    fn scan_only_lists_jars() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("A-1.0.jar"), b"a").unwrap();
        std::fs::write(temp.path().join("B-1.0.JAR"), b"b").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"n").unwrap();
        std::fs::create_dir(temp.path().join("folder.jar")).unwrap();

        let listing = ModListing::scan(temp.path()).unwrap();
        let mut names: Vec<_> = listing.iter().map(|f| f.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["A-1.0.jar", "B-1.0.JAR"]);
    }

    #[test]
    fn kept_mods_ignore_case() {
        let mut kept = KeptMods::default();
        kept.insert("Foo-1.0.jar");
        assert!(kept.contains("foo-1.0.JAR"));
        assert!(!kept.contains("Foo-1.1.jar"));
    }
}
