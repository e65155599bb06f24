mod engine;
mod listing;
mod pattern;

pub use engine::{plan_mod, Action, DeleteReason, ModPlan, Outcome, Reconciler, SyncReport};
pub use listing::{KeptMods, ListedFile, ModListing};
pub use pattern::{stale_pattern_source, StalePattern};
