use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use crate::core::cache::{ArtifactCache, CacheFiller, FillReport};
use crate::core::configs::{ConfigSyncOutcome, ConfigSynchronizer, GitConfigSync};
use crate::core::downloader::Downloader;
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::build_http_client;
use crate::core::instance::{Instance, InstanceSide};
use crate::core::maven::{NexusIndex, NexusRepository, VersionResolver};
use crate::core::pack::{apply_local_overrides, load_exclusions, load_local_overrides, Mod};
use crate::core::state::{AppPaths, UpdaterSettings};
use crate::core::sync::{Reconciler, SyncReport};
use crate::core::version::{apply_overlay, BaseManifest, Channel, OverlayManifest};

/// Keep GT New Horizons instances in sync with the published pack
#[derive(Debug, Parser)]
#[command(name = "nightly-updater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Instance to update, as `<side>[+symlink]=<path>` (repeatable)
    #[arg(long = "instance", value_name = "SIDE[+symlink]=PATH")]
    pub instances: Vec<Instance>,

    /// Game directory of a single instance
    #[arg(short = 'm', long = "minecraft", requires = "side")]
    pub minecraft: Option<PathBuf>,

    /// Side of the single instance: CLIENT or SERVER
    #[arg(short = 's', long = "side", requires = "minecraft")]
    pub side: Option<InstanceSide>,

    /// Link mods to the cache instead of copying them
    #[arg(short = 'S', long = "symlinks", requires = "minecraft")]
    pub symlinks: bool,

    /// Manifest channel to follow: nightly or daily
    #[arg(long, default_value = "nightly")]
    pub channel: Channel,

    /// Re-resolve every mod against the repository instead of using the
    /// manifest's pins
    #[arg(short, long)]
    pub latest: bool,

    /// Only update configs
    #[arg(long, conflicts_with = "skip_configs")]
    pub configs_only: bool,

    /// Leave configs alone
    #[arg(long)]
    pub skip_configs: bool,

    /// Log what would change without touching any instance
    #[arg(long)]
    pub dry_run: bool,

    /// Allow the first config sync to replace existing configs (a backup is kept)
    #[arg(long)]
    pub accept_config_reset: bool,

    /// Directory for the artifact cache and updater files
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub instances: Vec<Instance>,
    pub channel: Channel,
    pub latest: bool,
    pub configs_only: bool,
    pub skip_configs: bool,
    pub dry_run: bool,
    pub accept_config_reset: bool,
    pub cache_dir: Option<PathBuf>,
}

impl Cli {
    /// Validate the arguments into [`RunOptions`].
    ///
    /// Every instance must already have a `mods/` directory.
    pub fn into_options(self) -> UpdaterResult<RunOptions> {
        let mut instances = self.instances;
        if let (Some(minecraft), Some(side)) = (self.minecraft, self.side) {
            instances.push(Instance::new(minecraft, side).with_symlinks(self.symlinks));
        }
        if instances.is_empty() {
            return Err(UpdaterError::InvalidInstance(
                "no instance given; use --instance or -m/-s".to_string(),
            ));
        }
        for instance in &instances {
            if !instance.mods_dir().is_dir() {
                return Err(UpdaterError::InvalidInstance(format!(
                    "{}: mods directory {:?} does not exist",
                    instance,
                    instance.mods_dir()
                )));
            }
        }

        Ok(RunOptions {
            instances,
            channel: self.channel,
            latest: self.latest,
            configs_only: self.configs_only,
            skip_configs: self.skip_configs,
            dry_run: self.dry_run,
            accept_config_reset: self.accept_config_reset,
            cache_dir: self.cache_dir,
        })
    }
}

/// What a whole run did, across instances.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub mods: SyncReport,
    pub cache: Option<FillReport>,
    pub failed_instances: usize,
    pub failed_configs: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.mods.is_clean()
            && self.cache.as_ref().map_or(true, |c| c.failed == 0)
            && self.failed_instances == 0
            && self.failed_configs == 0
    }
}

/// Fetch the desired state and bring every instance to it.
pub async fn run_update(options: &RunOptions) -> UpdaterResult<RunSummary> {
    let paths = AppPaths::new(options.cache_dir.clone());
    let settings = UpdaterSettings::load(&paths.settings_file());
    info!("Using {:?} for updater files", paths.root());

    let client = build_http_client()?;
    let base = BaseManifest::fetch(&client, &settings.assets_url).await?;
    let overlay = OverlayManifest::fetch(&client, &settings.overlay_url_template, options.channel).await?;
    let desired = apply_overlay(&base, &overlay);

    let mut summary = RunSummary::default();

    if options.configs_only {
        info!("Configs only; skipping mods");
    } else {
        update_mods(options, &settings, &paths, client, desired.mods, &mut summary).await?;
    }

    if options.skip_configs {
        info!("Skipping configs");
    } else if options.dry_run {
        info!("Dry run; not touching configs (tag {})", desired.config_tag);
    } else {
        update_configs(options, &settings, &desired.config_tag, &mut summary).await;
    }

    Ok(summary)
}

async fn update_mods(
    options: &RunOptions,
    settings: &UpdaterSettings,
    paths: &AppPaths,
    client: reqwest::Client,
    mut mods: Vec<Mod>,
    summary: &mut RunSummary,
) -> UpdaterResult<()> {
    let cache = ArtifactCache::new(paths.mods_cache(), settings.keep_cached_files);
    cache.ensure_root()?;

    let exclusions = load_exclusions(&paths.exclusions())?;
    apply_local_overrides(&mut mods, load_local_overrides(&paths.local_overrides())?);

    let repository = NexusRepository::new(&settings.repository_url, &settings.repository_name);
    let resolver = VersionResolver::new(
        Arc::new(NexusIndex::new(client, repository.clone())),
        options.channel.tracking(),
        settings.concurrency,
    );
    // Mods without any history (local additions) always need a lookup.
    let (pending, mut mods): (Vec<Mod>, Vec<Mod>) = mods
        .into_iter()
        .partition(|m| options.latest || m.versions.is_empty());
    mods.extend(resolver.resolve_all(pending).await);

    let downloader = Downloader::new()?.with_concurrency(settings.concurrency);
    let filler = CacheFiller::new(
        &cache,
        &downloader,
        &repository,
        &settings.repository_group,
        downloader.concurrency(),
    );
    summary.cache = Some(filler.fill(&mut mods, &exclusions).await);

    let mods = Arc::new(mods);
    let exclusions = Arc::new(exclusions);
    for instance in &options.instances {
        let instance = instance.clone();
        let mods = Arc::clone(&mods);
        let exclusions: Arc<HashSet<String>> = Arc::clone(&exclusions);
        let dry_run = options.dry_run;

        let label = instance.to_string();
        let pass = tokio::task::spawn_blocking(move || {
            Reconciler::new(&instance, &exclusions)
                .dry_run(dry_run)
                .run(&mods)
        })
        .await
        .map_err(|e| UpdaterError::Other(format!("reconciliation task failed: {e}")))?;

        match pass {
            Ok(report) => summary.mods.merge(&report),
            Err(e) => {
                error!("Failed to update {}: {}", label, e);
                summary.failed_instances += 1;
            }
        }
    }
    Ok(())
}

async fn update_configs(
    options: &RunOptions,
    settings: &UpdaterSettings,
    tag: &str,
    summary: &mut RunSummary,
) {
    for instance in &options.instances {
        let sync = GitConfigSync::new(&settings.config_repository_url, options.accept_config_reset);
        let instance = instance.clone();
        let tag = tag.to_string();

        let label = instance.to_string();
        let result = tokio::task::spawn_blocking(move || sync.sync(&instance, &tag)).await;
        match result {
            Ok(Ok(ConfigSyncOutcome::Skipped(reason))) => {
                info!("Configs of {} not updated: {}", label, reason)
            }
            Ok(Ok(outcome)) => info!("Configs of {}: {:?}", label, outcome),
            Ok(Err(e)) => {
                warn!("Config update failed for {}: {}", label, e);
                summary.failed_configs += 1;
            }
            Err(e) => {
                warn!("Config task for {} failed: {}", label, e);
                summary.failed_configs += 1;
            }
        }
    }
}

/// Process exit code for a run: 0 clean, 1 fatal, 2 partial failure.
pub async fn execute(cli: Cli) -> i32 {
    let options = match cli.into_options() {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    match run_update(&options).await {
        Ok(summary) if summary.is_success() => {
            info!("Done: {}", summary.mods);
            0
        }
        Ok(summary) => {
            warn!(
                "Finished with problems: {} ({} instances failed, {} config updates failed)",
                summary.mods, summary.failed_instances, summary.failed_configs
            );
            2
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}
