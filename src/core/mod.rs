// ─── Nightly Updater Core ───
// Keeps mod-pack instances converged on the published desired state.
//
// Architecture:
//   core/
//     version/    Pack manifests (base + channel overlay) and version ordering
//     pack/       Mod/Version/Side model, local overrides and exclusions
//     maven/      Repository search and latest-version resolution
//     downloader/ HTTP fetching with SHA-1 validation
//     cache/      Per-mod artifact cache with retention, cache filling
//     sync/       Reconciliation engine: listing, stale matching, plans
//     instance/   Instance model and the installer applying plans
//     configs/    Config repository synchronization through git
//     state/      Settings and application paths
//     archive.rs  Traversal-safe zip extraction
//     sanitize.rs Safe path components

pub mod archive;
pub mod cache;
pub mod configs;
pub mod downloader;
pub mod error;
pub mod http;
pub mod instance;
pub mod maven;
pub mod pack;
pub mod sanitize;
pub mod state;
pub mod sync;
pub mod version;
