mod installer;
mod model;

pub use installer::{InstanceInstaller, FORGE_PATCHES_FILE};
pub use model::{Instance, InstanceSide};
