//! Process-wide log output.
//!
//! Installs a `tracing` fmt subscriber. `RUST_LOG` overrides the level unless
//! `debug` is set, which always logs at debug.

use irelia_core::{IreliaError, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log output settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when neither `debug` nor `RUST_LOG` is set.
    pub level: Level,
    pub debug: bool,
    /// One JSON object per event instead of compact text.
    pub json: bool,
    /// Append to this file instead of writing to stdout.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            debug: false,
            json: false,
            file: None,
        }
    }
}

impl LogConfig {
    fn filter(&self) -> EnvFilter {
        if self.debug {
            return EnvFilter::new(Level::DEBUG.as_str());
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_env_filter(config.filter())
        .with_target(false);

    let installed = match (&config.file, config.json) {
        (Some(path), true) => builder
            .json()
            .with_writer(open_log_file(path)?)
            .try_init(),
        (Some(path), false) => builder
            .compact()
            .with_ansi(false)
            .with_writer(open_log_file(path)?)
            .try_init(),
        (None, true) => builder.json().try_init(),
        (None, false) => builder.compact().try_init(),
    };

    installed.map_err(|e| IreliaError::Config {
        message: format!("Failed to install log subscriber: {}", e),
    })
}

fn open_log_file(path: &Path) -> Result<Mutex<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IreliaError::io_with_path(e, parent))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| IreliaError::io_with_path(e, path))?;
    Ok(Mutex::new(file))
}
