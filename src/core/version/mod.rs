pub mod manifest;
mod ordering;

pub use manifest::{apply_overlay, BaseManifest, Channel, DesiredState, OverlayManifest};
pub use ordering::{compare_versions, is_prerelease};
