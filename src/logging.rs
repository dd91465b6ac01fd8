//! Log output for the terminal UI.
//!
//! The terminal belongs to ratatui while the app runs, so logs go to a file.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file name inside the data directory.
pub const LOG_FILE: &str = "gametome.log";

/// Installs a global subscriber appending to `dir/gametome.log`.
///
/// `RUST_LOG` takes precedence over `default_level`.
///
/// # Errors
///
/// If the log file cannot be opened or a subscriber is already installed.
pub fn init(dir: &Path, default_level: &str) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(io::Error::other)
}
