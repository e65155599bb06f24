// ─── Reconciliation Engine ───
// Converges one instance's `mods/` directory toward the desired mod set.
//
// Each mod is planned against an in-memory listing of the directory and
// the set of file names already confirmed this pass; planning updates both
// as if the plan had been applied. The installer then applies the plan.
// Mods are visited in reverse case-insensitive name order so a mod whose
// file was confirmed earlier in the pass is never purged by a later mod's
// fuzzy cleanup.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::listing::{KeptMods, ListedFile, ModListing};
use super::pattern::StalePattern;
use crate::core::error::UpdaterResult;
use crate::core::instance::{Instance, InstanceInstaller, InstanceSide};
use crate::core::pack::Mod;

/// Why a file is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// The mod is no longer shipped (side `NONE`).
    Retired,
    Excluded,
    /// Another build of a mod that is being kept current.
    Stale,
}

/// One filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Delete {
        name: String,
        path: PathBuf,
        reason: DeleteReason,
    },
    Install {
        name: String,
        source: PathBuf,
    },
    /// Server-side companion jar placed at the game directory root.
    InstallCompanion { source: PathBuf },
    /// Client-side companion archive unpacked above the game directory.
    ExtractCompanion { archive: PathBuf },
}

/// What reconciliation decided for a mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    New,
    Upgraded { from: String },
    UpToDate,
    Purged,
    Excluded,
    /// Could not be reconciled this run.
    Skipped(String),
    /// Deliberately left alone (no history, or not for this side).
    Untouched,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::New => f.write_str("new"),
            Outcome::Upgraded { from } => write!(f, "upgraded from {from}"),
            Outcome::UpToDate => f.write_str("up to date"),
            Outcome::Purged => f.write_str("purged"),
            Outcome::Excluded => f.write_str("excluded"),
            Outcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            Outcome::Untouched => f.write_str("untouched"),
        }
    }
}

/// Planned changes for one mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModPlan {
    pub mod_name: String,
    /// File name the mod should end up installed as.
    pub target: Option<String>,
    pub actions: Vec<Action>,
    pub outcome: Outcome,
}

impl ModPlan {
    fn new(mod_name: &str) -> Self {
        Self {
            mod_name: mod_name.to_string(),
            target: None,
            actions: Vec::new(),
            outcome: Outcome::Untouched,
        }
    }

    fn finish(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Delete every listed file matching `name` in any case. Returns the
    /// last name deleted.
    fn delete(&mut self, listing: &mut ModListing, name: &str, reason: DeleteReason) -> Option<String> {
        let mut deleted = None;
        for listed in listing.remove(name) {
            self.push_delete(listed, reason, &mut deleted);
        }
        deleted
    }

    fn push_delete(&mut self, listed: ListedFile, reason: DeleteReason, deleted: &mut Option<String>) {
        self.actions.push(Action::Delete {
            name: listed.name.clone(),
            path: listed.path,
            reason,
        });
        *deleted = Some(listed.name);
    }
}

/// Counts for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub new: usize,
    pub upgraded: usize,
    pub up_to_date: usize,
    pub purged: usize,
    pub excluded: usize,
    pub skipped: usize,
    pub untouched: usize,
    pub failed_actions: usize,
    pub actions_applied: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::New => self.new += 1,
            Outcome::Upgraded { .. } => self.upgraded += 1,
            Outcome::UpToDate => self.up_to_date += 1,
            Outcome::Purged => self.purged += 1,
            Outcome::Excluded => self.excluded += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Untouched => self.untouched += 1,
        }
    }

    /// Whether every mod converged and every action succeeded.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.failed_actions == 0
    }

    pub fn merge(&mut self, other: &SyncReport) {
        self.new += other.new;
        self.upgraded += other.upgraded;
        self.up_to_date += other.up_to_date;
        self.purged += other.purged;
        self.excluded += other.excluded;
        self.skipped += other.skipped;
        self.untouched += other.untouched;
        self.failed_actions += other.failed_actions;
        self.actions_applied += other.actions_applied;
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} upgraded, {} up to date, {} purged, {} excluded, {} skipped, {} failed actions",
            self.new,
            self.upgraded,
            self.up_to_date,
            self.purged,
            self.excluded,
            self.skipped,
            self.failed_actions
        )
    }
}

/// Plan one mod against the current listing.
///
/// `listing` and `kept` are updated as if the returned plan had been
/// applied, so consecutive calls see each other's effects.
pub fn plan_mod(
    m: &Mod,
    side: InstanceSide,
    exclusions: &HashSet<String>,
    mods_dir: &Path,
    listing: &mut ModListing,
    kept: &mut KeptMods,
) -> ModPlan {
    let mut plan = ModPlan::new(&m.name);

    if m.versions.is_empty() {
        return plan;
    }

    if m.side.is_none() {
        for version in &m.versions {
            for name in version.file_names() {
                if kept.contains(name) {
                    continue;
                }
                plan.delete(listing, name, DeleteReason::Retired);
            }
        }
        let outcome = if plan.actions.is_empty() {
            Outcome::Untouched
        } else {
            Outcome::Purged
        };
        return plan.finish(outcome);
    }

    if !m.side.applies_to(side) {
        return plan;
    }

    if exclusions.contains(&m.name) {
        let installed = m
            .versions
            .iter()
            .flat_map(|v| v.file_names())
            .find(|name| listing.contains(name) && !kept.contains(name))
            .map(str::to_string);
        if let Some(name) = installed {
            plan.delete(listing, &name, DeleteReason::Excluded);
        }
        return plan.finish(Outcome::Excluded);
    }

    let Some(target) = m.target_version() else {
        return plan.finish(Outcome::Skipped(format!(
            "unable to determine mod version {}",
            m.latest_version.as_deref().unwrap_or("<none>")
        )));
    };
    let Some(cache_path) = target.cache_path.as_ref() else {
        return plan.finish(Outcome::Skipped("not in the cache".to_string()));
    };
    if !cache_path.is_file() {
        return plan.finish(Outcome::Skipped(format!("file not found: {:?}", cache_path)));
    }
    let Some(new_name) = cache_path.file_name().map(|n| n.to_string_lossy().to_string()) else {
        return plan.finish(Outcome::Skipped(format!("bad cache path {:?}", cache_path)));
    };
    let is_target = |name: &str| name.eq_ignore_ascii_case(&new_name);
    plan.target = Some(new_name.clone());

    let mut old_name = None;

    // Exact names of every other tracked version.
    for version in m.versions.iter().filter(|v| v.version != target.version) {
        for name in version.file_names() {
            if is_target(name) || kept.contains(name) {
                continue;
            }
            if let Some(deleted) = plan.delete(listing, name, DeleteReason::Stale) {
                old_name = Some(deleted);
            }
        }
    }

    // Builds that are not tracked as versions, matched by name shape.
    let patterns: Vec<StalePattern> = std::iter::once(new_name.as_str())
        .chain(target.file_names())
        .filter_map(|name| match StalePattern::new(name, &target.version) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Skipping stale pattern for {}: {}", name, e);
                None
            }
        })
        .collect();
    let stale: Vec<String> = listing
        .iter()
        .map(|file| file.name.clone())
        .filter(|name| !is_target(name) && !kept.contains(name))
        .filter(|name| patterns.iter().any(|p| p.matches(name)))
        .collect();
    for name in stale {
        if let Some(deleted) = plan.delete(listing, &name, DeleteReason::Stale) {
            old_name = Some(deleted);
        }
    }

    kept.insert(&new_name);

    // Only one case variant of the target may stay, preferring the exact name.
    let mut variants = listing.remove(&new_name);
    if !variants.is_empty() {
        let keep = variants
            .iter()
            .position(|file| file.name == new_name)
            .unwrap_or(0);
        let kept_file = variants.remove(keep);
        for extra in variants {
            plan.push_delete(extra, DeleteReason::Stale, &mut old_name);
        }
        listing.insert(kept_file.name, kept_file.path);
        return plan.finish(Outcome::UpToDate);
    }

    plan.actions.push(Action::Install {
        name: new_name.clone(),
        source: cache_path.clone(),
    });
    listing.insert(new_name.clone(), mods_dir.join(&new_name));

    match side {
        InstanceSide::Server => {
            if let Some(patches) = find_extra(&target.extra_assets, "-forgePatches.jar") {
                plan.actions.push(Action::InstallCompanion { source: patches });
            }
        }
        InstanceSide::Client => {
            if let Some(archive) = find_extra(&target.extra_assets, "-multimc.zip") {
                plan.actions.push(Action::ExtractCompanion { archive });
            }
        }
    }

    let outcome = match old_name {
        Some(from) => Outcome::Upgraded { from },
        None => Outcome::New,
    };
    plan.finish(outcome)
}

fn find_extra(extras: &[PathBuf], suffix: &str) -> Option<PathBuf> {
    extras
        .iter()
        .find(|path| {
            path.file_name()
                .is_some_and(|n| n.to_string_lossy().to_lowercase().ends_with(&suffix.to_lowercase()))
        })
        .cloned()
}

fn log_plan(plan: &ModPlan) {
    for action in &plan.actions {
        match action {
            Action::Delete {
                name,
                reason: DeleteReason::Retired,
                ..
            } => info!("Deleting mod with side of NONE: {} - {}", plan.mod_name, name),
            Action::Delete {
                name,
                reason: DeleteReason::Excluded,
                ..
            } => info!("Deleting excluded mod: {} - {}", plan.mod_name, name),
            Action::Delete {
                name,
                reason: DeleteReason::Stale,
                ..
            } => debug!("Removing stale build of {}: {}", plan.mod_name, name),
            Action::Install { name, .. } => match &plan.outcome {
                Outcome::Upgraded { from } => {
                    info!("Upgrading {} - {} -> {}", plan.mod_name, from, name)
                }
                _ => info!("New mod {} - {}", plan.mod_name, name),
            },
            Action::InstallCompanion { source } => {
                info!("Installing companion for {}: {:?}", plan.mod_name, source)
            }
            Action::ExtractCompanion { archive } => {
                info!("Extracting companion for {}: {:?}", plan.mod_name, archive)
            }
        }
    }
    if let Outcome::Skipped(reason) = &plan.outcome {
        warn!("Skipping {} - {}", plan.mod_name, reason);
    }
}

/// Runs reconciliation passes for one instance.
pub struct Reconciler<'a> {
    instance: &'a Instance,
    exclusions: &'a HashSet<String>,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(instance: &'a Instance, exclusions: &'a HashSet<String>) -> Self {
        Self {
            instance,
            exclusions,
            dry_run: false,
        }
    }

    /// Plan and log, but leave the filesystem alone.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// One pass over every mod. Only a failure to read `mods/` is an error;
    /// everything per mod is logged and counted.
    pub fn run(&self, mods: &[Mod]) -> UpdaterResult<SyncReport> {
        let mods_dir = self.instance.mods_dir();
        info!("Updating modpack jars in {}", self.instance);

        let mut listing = ModListing::scan(&mods_dir)?;
        let mut kept = KeptMods::default();
        let installer = InstanceInstaller::new(self.instance);
        let mut report = SyncReport::default();

        let mut ordered: Vec<&Mod> = mods.iter().collect();
        ordered.sort_by_cached_key(|m| m.name.to_lowercase());
        ordered.reverse();

        for m in ordered {
            let plan = plan_mod(
                m,
                self.instance.side,
                self.exclusions,
                &mods_dir,
                &mut listing,
                &mut kept,
            );
            log_plan(&plan);
            report.record(&plan.outcome);
            if !self.dry_run {
                self.apply(&installer, &plan, &mut report);
            }
        }

        info!("{}: {}", self.instance, report);
        Ok(report)
    }

    fn apply(&self, installer: &InstanceInstaller<'_>, plan: &ModPlan, report: &mut SyncReport) {
        for action in &plan.actions {
            let result = match action {
                Action::Delete { path, .. } => installer.delete(path),
                Action::Install { name, source } => installer.install_mod(source, name).map(|_| ()),
                Action::InstallCompanion { source } => {
                    installer.install_forge_patches(source).map(|_| ())
                }
                Action::ExtractCompanion { archive } => {
                    installer.extract_companion(archive).map(|_| ())
                }
            };
            match result {
                Ok(()) => report.actions_applied += 1,
                Err(e) => {
                    warn!("{}: {:?} failed: {}", plan.mod_name, action, e);
                    report.failed_actions += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::core::pack::{Side, Version};

    struct Fixture {
        _temp: tempfile::TempDir,
        cache: PathBuf,
        instance: Instance,
    }

    impl Fixture {
        fn new(side: InstanceSide) -> Self {
            let temp = tempfile::tempdir().unwrap();
            let cache = temp.path().join("cache");
            let minecraft = temp.path().join("instance/.minecraft");
            std::fs::create_dir_all(&cache).unwrap();
            std::fs::create_dir_all(minecraft.join("mods")).unwrap();
            Self {
                _temp: temp,
                cache,
                instance: Instance::new(minecraft, side),
            }
        }

        fn installed(&self, name: &str) {
            std::fs::write(self.instance.mods_dir().join(name), name.as_bytes()).unwrap();
        }

        fn cached(&self, name: &str) -> PathBuf {
            let path = self.cache.join(name);
            std::fs::write(&path, format!("cached {name}")).unwrap();
            path
        }

        /// Mod shipping `versions`, targeting the last one, which is cached.
        fn shipped(&self, name: &str, versions: &[&str]) -> Mod {
            let mut m = Mod::new(name, Side::both());
            for v in versions {
                m.versions.push(Version::new(name, *v));
            }
            let target = m.versions.last_mut().unwrap();
            target.cache_path = Some(self.cached(&target.filename.clone()));
            m.latest_version = Some(target.version.clone());
            m
        }

        /// Whether two names differing only by case can coexist here.
        fn case_sensitive(&self) -> bool {
            let marker = self.instance.minecraft_dir.join("case-check");
            std::fs::write(&marker, b"").unwrap();
            let distinct = !self.instance.minecraft_dir.join("CASE-CHECK").exists();
            std::fs::remove_file(marker).unwrap();
            distinct
        }

        fn files(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(self.instance.mods_dir())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            names
        }

        fn run(&self, mods: &[Mod], exclusions: &HashSet<String>) -> SyncReport {
            Reconciler::new(&self.instance, exclusions).run(mods).unwrap()
        }
    }

    #[test]
    fn upgrades_an_installed_mod() {
        let fx = Fixture::new(InstanceSide::Client);
        fx.installed("Botania-r1.1.jar");
        let botania = fx.shipped("Botania", &["r1.1", "r1.2"]);

        let report = fx.run(&[botania], &HashSet::new());

        assert_eq!(report.upgraded, 1);
        assert_eq!(fx.files(), vec!["Botania-r1.2.jar"]);
        assert_eq!(
            std::fs::read(fx.instance.mods_dir().join("Botania-r1.2.jar")).unwrap(),
            b"cached Botania-r1.2.jar"
        );
    }

    #[test]
    fn retired_mods_are_purged() {
        let fx = Fixture::new(InstanceSide::Server);
        fx.installed("ExamplePlugin-3.0.jar");
        let mut plugin = fx.shipped("ExamplePlugin", &["3.0", "3.1"]);
        plugin.side = Side::none();

        let report = fx.run(&[plugin], &HashSet::new());

        assert_eq!(report.purged, 1);
        assert_eq!(report.new, 0);
        assert!(fx.files().is_empty());
    }

    #[test]
    fn exclusion_wins_over_a_matching_side() {
        let fx = Fixture::new(InstanceSide::Client);
        fx.installed("OptiFine-H4.jar");
        let optifine = fx.shipped("OptiFine", &["H4"]);
        let exclusions = HashSet::from(["OptiFine".to_string()]);

        let report = fx.run(&[optifine], &exclusions);

        assert_eq!(report.excluded, 1);
        assert!(fx.files().is_empty());
    }

    #[test]
    fn other_side_mods_are_left_alone() {
        let fx = Fixture::new(InstanceSide::Server);
        fx.installed("Shaders-1.0.jar");
        let mut shaders = fx.shipped("Shaders", &["1.0", "2.0"]);
        shaders.side = "CLIENT_JAVA9".parse().unwrap();

        let report = fx.run(&[shaders], &HashSet::new());

        assert_eq!(report.untouched, 1);
        assert_eq!(fx.files(), vec!["Shaders-1.0.jar"]);
    }

    #[test]
    fn fuzzy_cleanup_stays_within_the_mod() {
        let fx = Fixture::new(InstanceSide::Client);
        fx.installed("Foo-1.2.3-pre.jar");
        fx.installed("Bar-1.2.3-pre.jar");
        let foo = fx.shipped("Foo", &["1.2.4"]);

        let report = fx.run(&[foo], &HashSet::new());

        assert_eq!(
            report.upgraded, 1,
            "an untracked build of the same mod counts as an upgrade"
        );
        assert_eq!(fx.files(), vec!["Bar-1.2.3-pre.jar", "Foo-1.2.4.jar"]);
    }

    #[test]
    fn confirmed_files_survive_later_mods() {
        let fx = Fixture::new(InstanceSide::Client);
        // "Foo-Bar" sorts after "Foo", so it is confirmed first; "Foo"'s
        // pattern `Foo-.*\.jar` would otherwise match it.
        let foo_bar = fx.shipped("Foo-Bar", &["1.0"]);
        fx.installed("Foo-Bar-1.0.jar");
        let foo = fx.shipped("Foo", &["2.0"]);

        fx.run(&[foo, foo_bar], &HashSet::new());

        assert_eq!(fx.files(), vec!["Foo-2.0.jar", "Foo-Bar-1.0.jar"]);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let fx = Fixture::new(InstanceSide::Client);
        fx.installed("Botania-r1.1.jar");
        fx.installed("Retired-1.0.jar");
        let mut retired = fx.shipped("Retired", &["1.0"]);
        retired.side = Side::none();
        let mods = vec![fx.shipped("Botania", &["r1.1", "r1.2"]), fx.shipped("Baubles", &["1.0"]), retired];

        let first = fx.run(&mods, &HashSet::new());
        assert!(first.actions_applied > 0);
        let after_first = fx.files();

        let second = fx.run(&mods, &HashSet::new());
        assert_eq!(second.actions_applied, 0);
        assert_eq!(second.up_to_date, 2);
        assert_eq!(fx.files(), after_first);
        assert_eq!(after_first, vec!["Baubles-1.0.jar", "Botania-r1.2.jar"]);
    }

    #[test]
    fn exactly_one_file_per_mod_after_a_pass() {
        let fx = Fixture::new(InstanceSide::Client);
        for name in ["Foo-1.0.jar", "Foo-1.1.jar", "foo-1.2-dev.jar"] {
            fx.installed(name);
        }
        let mut foo = fx.shipped("Foo", &["1.0", "1.1", "1.3"]);
        foo.versions[1].alias = Some("Foo-1.1-renamed.jar".into());

        fx.run(&[foo], &HashSet::new());

        assert_eq!(fx.files(), vec!["Foo-1.3.jar"]);
    }

    #[test]
    fn missing_cache_skips_only_that_mod() {
        let fx = Fixture::new(InstanceSide::Client);
        fx.installed("Broken-1.0.jar");
        let mut broken = fx.shipped("Broken", &["1.0", "1.1"]);
        broken.versions[1].cache_path = Some(fx.cache.join("missing.jar"));
        let fine = fx.shipped("Fine", &["1.0"]);

        let report = fx.run(&[broken, fine], &HashSet::new());

        assert_eq!(report.skipped, 1);
        assert_eq!(report.new, 1);
        assert!(!report.is_clean());
        assert_eq!(fx.files(), vec!["Broken-1.0.jar", "Fine-1.0.jar"]);
    }

    #[test]
    fn dry_run_plans_without_touching_files() {
        let fx = Fixture::new(InstanceSide::Client);
        fx.installed("Botania-r1.1.jar");
        let botania = fx.shipped("Botania", &["r1.1", "r1.2"]);
        let exclusions = HashSet::new();

        let report = Reconciler::new(&fx.instance, &exclusions)
            .dry_run(true)
            .run(&[botania])
            .unwrap();

        assert_eq!(report.upgraded, 1);
        assert_eq!(report.actions_applied, 0);
        assert_eq!(fx.files(), vec!["Botania-r1.1.jar"]);
    }

    #[test]
    fn server_installs_companion_jar_on_fresh_install() {
        let fx = Fixture::new(InstanceSide::Server);
        let mut lwjgl = fx.shipped("lwjgl3ify", &["2.1"]);
        let patches = fx.cached("lwjgl3ify-2.1-forgePatches.jar");
        lwjgl.versions[0].extra_assets = vec![fx.cached("lwjgl3ify-2.1-multimc.zip"), patches];

        let report = fx.run(&[lwjgl], &HashSet::new());

        assert_eq!(report.new, 1);
        assert_eq!(report.failed_actions, 0);
        assert!(fx
            .instance
            .minecraft_dir
            .join(crate::core::instance::FORGE_PATCHES_FILE)
            .exists());
    }

    #[test]
    fn upgrade_removes_every_case_variant_of_the_old_build() {
        let fx = Fixture::new(InstanceSide::Client);
        if !fx.case_sensitive() {
            return;
        }
        fx.installed("Foo-1.0.jar");
        fx.installed("FOO-1.0.jar");
        let foo = fx.shipped("Foo", &["1.0", "1.1"]);

        let report = fx.run(&[foo], &HashSet::new());

        assert_eq!(report.upgraded, 1);
        assert_eq!(report.failed_actions, 0);
        assert_eq!(fx.files(), vec!["Foo-1.1.jar"]);
    }

    #[test]
    fn retired_mod_is_purged_in_every_case_variant() {
        let fx = Fixture::new(InstanceSide::Server);
        if !fx.case_sensitive() {
            return;
        }
        fx.installed("ExamplePlugin-3.0.jar");
        fx.installed("exampleplugin-3.0.jar");
        let mut plugin = fx.shipped("ExamplePlugin", &["3.0"]);
        plugin.side = Side::none();

        let report = fx.run(&[plugin], &HashSet::new());

        assert_eq!(report.purged, 1);
        assert!(fx.files().is_empty());
    }

    #[test]
    fn duplicate_case_variants_of_the_target_collapse_to_one() {
        let fx = Fixture::new(InstanceSide::Client);
        if !fx.case_sensitive() {
            return;
        }
        fx.installed("Foo-1.1.jar");
        fx.installed("foo-1.1.JAR");
        let foo = fx.shipped("Foo", &["1.1"]);

        let report = fx.run(&[foo], &HashSet::new());

        assert_eq!(report.up_to_date, 1);
        assert_eq!(fx.files(), vec!["Foo-1.1.jar"]);
        assert_eq!(fx.run(&[fx.shipped("Foo", &["1.1"])], &HashSet::new()).actions_applied, 0);
    }

    #[test]
    fn client_extracts_companion_archive_on_fresh_install() {
        let fx = Fixture::new(InstanceSide::Client);
        let mut lwjgl = fx.shipped("lwjgl3ify", &["2.1"]);
        let archive = fx.cache.join("lwjgl3ify-2.1-multimc.zip");
        {
            let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
            writer.start_file("patches/net.minecraft.json", SimpleFileOptions::default()).unwrap();
            writer.write_all(b"{}").unwrap();
            writer.finish().unwrap();
        }
        let patches = fx.cached("lwjgl3ify-2.1-forgePatches.jar");
        lwjgl.versions[0].extra_assets = vec![patches, archive];

        let report = fx.run(&[lwjgl], &HashSet::new());

        assert_eq!(report.new, 1);
        assert_eq!(report.failed_actions, 0);
        let launcher_dir = fx.instance.launcher_dir();
        assert!(launcher_dir.join("patches/net.minecraft.json").exists());
        assert!(!fx
            .instance
            .minecraft_dir
            .join(crate::core::instance::FORGE_PATCHES_FILE)
            .exists());
    }

    #[test]
    fn installed_mod_plans_no_companion() {
        let fx = Fixture::new(InstanceSide::Client);
        let mut lwjgl = fx.shipped("lwjgl3ify", &["2.1"]);
        lwjgl.versions[0].extra_assets = vec![
            fx.cached("lwjgl3ify-2.1-multimc.zip"),
            fx.cached("lwjgl3ify-2.1-forgePatches.jar"),
        ];
        let mods_dir = fx.instance.mods_dir();
        let mut listing = ModListing::default();
        listing.insert("lwjgl3ify-2.1.jar", mods_dir.join("lwjgl3ify-2.1.jar"));

        for side in [InstanceSide::Client, InstanceSide::Server] {
            let plan = plan_mod(
                &lwjgl,
                side,
                &HashSet::new(),
                &mods_dir,
                &mut listing.clone(),
                &mut KeptMods::default(),
            );
            assert_eq!(plan.outcome, Outcome::UpToDate);
            assert!(plan.actions.is_empty(), "{side:?}: {:?}", plan.actions);
        }
    }
}
