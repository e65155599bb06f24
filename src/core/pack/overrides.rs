use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::model::{Mod, Side};
use crate::core::error::{UpdaterError, UpdaterResult};

/// One `name|SIDE` line from the local override file.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalOverride {
    pub name: String,
    pub side: Side,
}

/// Meaningful lines of a list file: trimmed, without blanks and `#` comments.
fn list_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn read_optional(path: &Path) -> UpdaterResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(UpdaterError::io(path, e)),
    }
}

pub fn parse_local_overrides(text: &str) -> Vec<LocalOverride> {
    let mut overrides = Vec::new();
    for line in list_lines(text) {
        let (name, side) = match line.split_once('|') {
            Some((name, side)) => (name.trim(), Some(side.trim())),
            None => (line, None),
        };
        if name.is_empty() {
            continue;
        }
        match Side::parse_optional(side) {
            Ok(side) => overrides.push(LocalOverride {
                name: name.to_string(),
                side,
            }),
            Err(e) => warn!("Ignoring local override '{}': {}", line, e),
        }
    }
    overrides
}

/// Read the local override file. A missing file means no overrides.
pub fn load_local_overrides(path: &Path) -> UpdaterResult<Vec<LocalOverride>> {
    let Some(text) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    let overrides = parse_local_overrides(&text);
    info!("Loaded {} local overrides from {:?}", overrides.len(), path);
    Ok(overrides)
}

/// Fold overrides into the mod list.
///
/// A name already in the list only has its side replaced; new names are
/// added without any history and must be resolved against the repository.
pub fn apply_local_overrides(mods: &mut Vec<Mod>, overrides: Vec<LocalOverride>) {
    for local in overrides {
        match mods.iter_mut().find(|m| m.name == local.name) {
            Some(existing) => {
                debug!("Local override sets {} to {}", existing.name, local.side);
                existing.side = local.side;
            }
            None => {
                debug!("Adding local mod {} ({})", local.name, local.side);
                mods.push(Mod::new(local.name, local.side));
            }
        }
    }
}

/// Read the exclusion file. A missing file means nothing is excluded.
pub fn load_exclusions(path: &Path) -> UpdaterResult<HashSet<String>> {
    let Some(text) = read_optional(path)? else {
        return Ok(HashSet::new());
    };
    let exclusions: HashSet<String> = list_lines(&text).map(str::to_string).collect();
    info!("Loaded {} mod exclusions from {:?}", exclusions.len(), path);
    Ok(exclusions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pack::SideKind;

    #[test]
    fn parses_override_lines() {
        let parsed = parse_local_overrides(
            "# my extra mods\n\n  JourneyMap | client \nNEI-Addons\nBroken|sideways\n|SERVER\n",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "JourneyMap");
        assert_eq!(parsed[0].side.kind, SideKind::Client);
        assert_eq!(parsed[1].name, "NEI-Addons");
        assert_eq!(parsed[1].side, Side::both());
    }

    #[test]
    fn overrides_do_not_duplicate_manifest_mods() {
        let mut mods = vec![Mod::new("Botania", Side::none())];
        apply_local_overrides(
            &mut mods,
            vec![
                LocalOverride {
                    name: "Botania".into(),
                    side: Side::both(),
                },
                LocalOverride {
                    name: "Extra".into(),
                    side: Side::both(),
                },
            ],
        );
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].side, Side::both());
        assert!(mods[1].versions.is_empty());
    }

    #[test]
    fn missing_files_are_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(load_local_overrides(&temp.path().join("local-assets.txt"))
            .unwrap()
            .is_empty());
        assert!(load_exclusions(&temp.path().join("mod-exclusions.txt"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn exclusions_are_trimmed() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mod-exclusions.txt");
        std::fs::write(&path, "OptiFine  \n#Botania\n\n  FastCraft\n").unwrap();
        let exclusions = load_exclusions(&path).unwrap();
        assert_eq!(exclusions.len(), 2);
        assert!(exclusions.contains("OptiFine"));
        assert!(exclusions.contains("FastCraft"));
    }
}
