mod artifact;
mod resolver;
pub mod search;

pub use artifact::{AssetQuery, NexusRepository};
pub use resolver::{merge_items, VersionResolver};
pub use search::{fetch_all_items, ArtifactIndex, NexusIndex, SearchItem};

/// Public GTNH Nexus instance.
pub const GTNH_NEXUS: &str = "https://nexus.gtnewhorizons.com";
/// Repository searched for published mod builds.
pub const GTNH_REPOSITORY: &str = "public";
/// Group the pack's own mods are published under.
pub const GTNH_GROUP: &str = "com.github.GTNewHorizons";
