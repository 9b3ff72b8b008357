//! Log output for the CLI

use std::io;
use tracing_subscriber::EnvFilter;

/// Variable holding the log filter, e.g. `EMBER_LOG=em_lower=debug`
const LOG_ENV: &str = "EMBER_LOG";

/// Install the stderr subscriber; only warnings are shown unless `EMBER_LOG`
/// says otherwise
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
