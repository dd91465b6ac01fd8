//! Blob storage for uploaded images.
//!
//! Uploads hand back a URL that is stored verbatim in sections and games.
//! Deletion is best-effort: the object may already be gone, so failures are
//! logged and swallowed.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Folder for images attached to sections.
pub const SECTIONS_FOLDER: &str = "sections";
/// Folder for game cover images.
pub const GAMES_FOLDER: &str = "games";

#[derive(Error, Debug)]
/// Blob store failures that abort the enclosing operation.
pub enum BlobError {
    /// Writing the object failed.
    #[error("upload of {name} failed: {source}")]
    UploadFailed {
        /// Original file name of the upload.
        name: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Byte storage addressed by URL.
pub trait BlobStore {
    /// Stores `bytes` under `folder` and returns the URL to reference them by.
    ///
    /// # Errors
    ///
    /// [`BlobError::UploadFailed`] if the object could not be written.
    fn upload(&self, name: &str, bytes: &[u8], folder: &str) -> Result<String, BlobError>;

    /// Removes the object behind `url`, ignoring (but logging) failures.
    fn delete(&self, url: &str);
}

/// Replaces every character outside `[A-Za-z0-9.]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

#[derive(Clone, Debug)]
/// Blob store backed by a local directory.
///
/// Objects live at `<root>/<folder>/<millis>-<tag>-<name>` and are exposed as
/// `<base_url>/<folder>/<file>`.
pub struct DirBlobStore {
    root: PathBuf,
    base_url: String,
}

impl DirBlobStore {
    #[must_use]
    /// Store rooted at `root`, publishing URLs under `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    /// Directory objects are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local file behind a URL this store issued, if it is one.
    #[must_use]
    pub fn local_path(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        plain.then(|| self.root.join(relative))
    }
}

impl BlobStore for DirBlobStore {
    fn upload(&self, name: &str, bytes: &[u8], folder: &str) -> Result<String, BlobError> {
        let failed = |source| BlobError::UploadFailed {
            name: name.to_string(),
            source,
        };
        let dir = self.root.join(sanitize_file_name(folder));
        fs::create_dir_all(&dir).map_err(failed)?;

        let tag = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            &tag[..8],
            sanitize_file_name(name)
        );
        fs::write(dir.join(&file_name), bytes).map_err(failed)?;

        let url = format!(
            "{}/{}/{file_name}",
            self.base_url,
            sanitize_file_name(folder)
        );
        debug!(%url, size = bytes.len(), "Stored blob");
        Ok(url)
    }

    fn delete(&self, url: &str) {
        let Some(path) = self.local_path(url) else {
            warn!(%url, "Not a blob URL issued by this store, skipping delete");
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => debug!(%url, "Deleted blob"),
            Err(e) => warn!(%url, error = %e, "Failed to delete blob"),
        }
    }
}

#[cfg(test)]
#[path = "tests/blob.rs"]
mod tests;
