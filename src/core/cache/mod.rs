mod filler;
mod store;

pub use filler::{CacheFiller, FillOutcome, FillReport};
pub use store::{ArtifactCache, DEFAULT_KEEP_CACHED_FILES};
