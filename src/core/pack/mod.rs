mod model;
mod overrides;

pub use model::{canonical_filename, Mod, Side, SideKind, Tracking, Version};
pub use overrides::{
    apply_local_overrides, load_exclusions, load_local_overrides, parse_local_overrides, LocalOverride,
};
