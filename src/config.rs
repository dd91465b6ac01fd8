//! Configuration to acknowledge operator preferences as well as set defaults.
//!
//! Specifically, we try to find a gametome.toml, and if present we load settings from there.
//! This provides storage locations, the admin secret, wrapping width and log level.

use facet::Facet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "gametome.toml";

#[derive(Facet, Clone, Debug, PartialEq, Eq)]
/// Operator preferences loaded from gametome.toml or falling back to defaults.
pub struct Config {
    #[facet(default = "data".to_string())]
    /// Directory holding the game store and log file.
    pub data_dir: String,
    #[facet(default = "data/blobs".to_string())]
    /// Directory uploaded images are written to.
    pub blob_dir: String,
    #[facet(default = "file://data/blobs".to_string())]
    /// Prefix of the URLs handed out for uploaded images.
    pub blob_base_url: String,
    #[facet(default = String::new())]
    /// Secret an editing session must present; empty disables editing.
    pub admin_token: String,
    #[facet(default = 100)]
    /// Maximum line width for editor text wrapping.
    pub wrap_width: usize,
    #[facet(default = "info".to_string())]
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            blob_dir: "data/blobs".to_string(),
            blob_base_url: "file://data/blobs".to_string(),
            admin_token: String::new(),
            wrap_width: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    #[must_use]
    /// Load configuration from gametome.toml if present.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    #[must_use]
    /// Load configuration from `path`, falling back to defaults if it is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        if let Ok(config) = facet_toml::from_str::<Self>(&contents) {
            return config;
        }
        warn!(path = %path.display(), "Ignoring malformed config");
        Self::default()
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
