#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

use crate::constants::LOG_FILE_PREFIX;

/// Path of the log file for a run stamped `stamp`.
pub fn log_path(dir: &Path, stamp: &str) -> PathBuf {
    dir.join(format!("{LOG_FILE_PREFIX}_{stamp}.log"))
}

/// Installs the global subscriber: INFO and above go to the console and to a
/// fresh log file in `dir`. Returns the log file path.
pub fn init(dir: &Path, stamp: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;
    let path = log_path(dir, stamp);
    let file = fs::File::create(&path)
        .with_context(|| format!("Could not create log file {}", path.display()))?;

    let console = fmt::layer()
        .without_time()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);
    let logfile = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Arc::new(file));
    let filter_layer = LevelFilter::from_level(Level::INFO);

    tracing_subscriber::registry()
        .with(console)
        .with(logfile)
        .with(filter_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_named_after_the_run() {
        assert_eq!(
            log_path(Path::new("out"), "20250311_143016"),
            Path::new("out/role_check_20250311_143016.log")
        );
    }
}
