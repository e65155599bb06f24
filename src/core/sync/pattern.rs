// ─── Stale build matching ───
// Recognizes "the same mod, a different build string" among installed jars.
//
// The pattern is the target file name with every non-word character
// escaped and the version string replaced by `.*`, matched against the
// whole candidate name, case-insensitively. Only the last occurrence of the
// version is replaced: it is the one following the mod name, and earlier
// occurrences belong to the mod name itself (e.g. `GT5u` with version `5`).

use regex::{Regex, RegexBuilder};

use crate::core::error::UpdaterResult;

/// Regex source for `target_filename` with `version` wildcarded.
pub fn stale_pattern_source(target_filename: &str, version: &str) -> String {
    let body = match target_filename.rfind(version).filter(|_| !version.is_empty()) {
        Some(idx) => format!(
            "{}.*{}",
            escape_non_word(&target_filename[..idx]),
            escape_non_word(&target_filename[idx + version.len()..])
        ),
        None => escape_non_word(target_filename),
    };
    format!("^(?:{body})$")
}

/// Escapes every character that has a meaning in a pattern.
fn escape_non_word(text: &str) -> String {
    regex::escape(text)
}

/// Compiled matcher for builds of one mod.
#[derive(Debug, Clone)]
pub struct StalePattern {
    regex: Regex,
}

impl StalePattern {
    pub fn new(target_filename: &str, version: &str) -> UpdaterResult<Self> {
        let regex = RegexBuilder::new(&stale_pattern_source(target_filename, version))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(target: &str, version: &str) -> StalePattern {
        StalePattern::new(target, version).unwrap()
    }

    #[test]
    fn matches_other_builds_of_the_same_mod() {
        let p = pattern("Foo-1.2.4.jar", "1.2.4");
        assert!(p.matches("Foo-1.2.3-pre.jar"));
        assert!(p.matches("foo-1.2.4-local+build7.JAR"));
        assert!(p.matches("Foo-1.2.4.jar"));
    }

    #[test]
    fn never_matches_unrelated_mods() {
        let p = pattern("Foo-1.2.4.jar", "1.2.4");
        assert!(!p.matches("Bar-1.2.3-pre.jar"));
        assert!(!p.matches("SomeFoo-1.2.3.jar"));
        assert!(!p.matches("Foo-1.2.3.zip"));
    }

    #[test]
    fn version_inside_the_mod_name_is_not_wildcarded() {
        let p = pattern("GT5u-5.jar", "5");
        assert_eq!(stale_pattern_source("GT5u-5.jar", "5"), r"^(?:GT5u\-.*\.jar)$");
        assert!(p.matches("GT5u-5.09.jar"));
        assert!(!p.matches("GTNHu-5.jar"));
    }

    #[test]
    fn missing_version_degrades_to_an_exact_match() {
        let p = pattern("Foo-latest.jar", "1.0");
        assert!(p.matches("foo-LATEST.jar"));
        assert!(!p.matches("Foo-1.0.jar"));
        assert!(!p.matches("Foo-latest-1.jar"));

        let p = pattern("Foo-1.0.jar", "");
        assert!(!p.matches("Foo-2.0.jar"));
    }

    #[test]
    fn metacharacters_in_names_are_literal() {
        let p = pattern("Mod(+)[x]-1.0.jar", "1.0");
        assert!(p.matches("Mod(+)[x]-0.9.jar"));
        assert!(!p.matches("Mod+x-0.9.jar"));
        assert!(!p.matches("ModA-1.0Xjar"));
    }
}
