mod settings;

pub use settings::{AppPaths, UpdaterSettings, APP_DIR_NAME};
