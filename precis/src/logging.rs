//! File logging. The terminal belongs to the UI, so logs go to
//! `precis.log` in the data directory.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::project_dirs;

pub fn log_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("precis.log"))
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
/// Returns where logs are written, or `None` if logging is off.
pub fn init() -> Result<Option<PathBuf>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("precis=info"));

    let Some(path) = log_path() else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .init();
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(Some(path))
}
