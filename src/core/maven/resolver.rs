use std::sync::Arc;

use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use super::search::{fetch_all_items, ArtifactIndex, SearchItem};
use crate::core::pack::{Mod, Tracking, Version};

/// Published builds that must never be offered for a given mod.
struct HistoryCorrection {
    mod_name: &'static str,
    reject: fn(&SearchItem) -> bool,
}

/// BlockLimiter once published a 0.55 build and a set of 1.7.10-tagged
/// builds that sort above the real line.
const HISTORY_CORRECTIONS: &[HistoryCorrection] = &[HistoryCorrection {
    mod_name: "BlockLimiter",
    reject: |item| {
        item.maven2.version == "0.55"
            || item
                .published_filename()
                .is_some_and(|name| name.contains("-1.7.10-"))
    },
}];

fn is_rejected(mod_name: &str, item: &SearchItem) -> bool {
    HISTORY_CORRECTIONS
        .iter()
        .any(|c| c.mod_name.eq_ignore_ascii_case(mod_name) && (c.reject)(item))
}

/// Re-resolves mod histories against the primary repository.
pub struct VersionResolver {
    index: Arc<dyn ArtifactIndex>,
    tracking: Tracking,
    concurrency: usize,
}

impl VersionResolver {
    pub fn new(index: Arc<dyn ArtifactIndex>, tracking: Tracking, concurrency: usize) -> Self {
        Self {
            index,
            tracking,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve every mod, preserving input order.
    pub async fn resolve_all(&self, mods: Vec<Mod>) -> Vec<Mod> {
        info!("Resolving latest versions for {} mods", mods.len());
        stream::iter(mods)
            .map(|m| self.resolve(m))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Refresh one mod's history and move its `latest_version` to the tip.
    ///
    /// Mods outside the primary repository and mods the pack does not ship
    /// are returned as-is. Lookup failures leave the mod unchanged.
    pub async fn resolve(&self, mut m: Mod) -> Mod {
        if !m.is_primary() || m.side.is_none() {
            return m;
        }

        match fetch_all_items(self.index.as_ref(), &m.name).await {
            Ok(items) if items.is_empty() => {
                warn!("No published builds found for {}", m.name);
            }
            Ok(items) => merge_items(&mut m, items, self.tracking),
            Err(e) => {
                warn!("Failed to resolve versions for {}: {}", m.name, e);
            }
        }
        m
    }
}

/// Fold repository search results into a mod's history.
///
/// Items are applied oldest first, so a version republished later wins.
/// Known versions keep their canonical filename; the published name is
/// recorded as an alias.
pub fn merge_items(m: &mut Mod, mut items: Vec<SearchItem>, tracking: Tracking) {
    items.sort_by_key(|item| item.last_modified);

    for item in items {
        if is_rejected(&m.name, &item) {
            debug!("Skipping rejected build {} of {}", item.maven2.version, m.name);
            continue;
        }

        let version = item.maven2.version.clone();
        let alias = item.published_filename();
        let sha1 = item.sha1().map(str::to_string);

        let index = match m.versions.iter().position(|v| v.version == version) {
            Some(index) => index,
            None => {
                m.versions.push(Version::new(&m.name, version));
                m.versions.len() - 1
            }
        };
        let entry = &mut m.versions[index];
        entry.alias = alias;
        entry.download_url = Some(item.download_url);
        if sha1.is_some() {
            entry.sha1 = sha1;
        }
    }

    m.sort_versions();

    match m.tip(tracking).map(|v| v.version.clone()) {
        Some(tip) => {
            if m.latest_version.as_deref() != Some(tip.as_str()) {
                debug!(
                    "{}: {} -> {}",
                    m.name,
                    m.latest_version.as_deref().unwrap_or("<none>"),
                    tip
                );
            }
            m.latest_version = Some(tip);
        }
        None => warn!("No eligible version of {} under {:?}", m.name, tracking),
    }
}
