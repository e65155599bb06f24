mod commands;
pub mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use commands::{run_update, Cli, RunOptions, RunSummary};

/// Parse the command line, run the updater and return the exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize structured logging
    let default_filter = if cli.verbose {
        "info,nightly_updater_lib=debug"
    } else {
        "info,nightly_updater_lib=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("nightly-updater {} starting...", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return 1;
        }
    };
    runtime.block_on(commands::execute(cli))
}
