//! Add, edit and delete sections as all-or-nothing operations.
//!
//! Each operation follows the same protocol: upload any new images, compute
//! the new forest with [`crate::tree`], persist the whole game, then adopt the
//! store's canonical copy. Nothing is persisted unless every upload succeeded,
//! and the in-memory game only changes once the store has accepted the write.
//!
//! Operations are sequential. A [`SectionEditor`] holds the snapshot every
//! path is resolved against, so a second operation must not start before the
//! first has returned.

use crate::blob::{BlobError, BlobStore, SECTIONS_FOLDER};
use crate::game::Game;
use crate::path::SectionPath;
use crate::section::{Callout, Section, SectionImage};
use crate::store::{Store, StoreError};
use crate::tree::{self, TreeError};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
/// Why an editing operation was abandoned. Prior state is always intact.
pub enum WorkflowError {
    /// Sections need a title.
    #[error("section title must not be empty")]
    EmptyTitle,

    /// The path is stale or malformed for the current tree.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// An image could not be uploaded.
    #[error(transparent)]
    Upload(#[from] BlobError),

    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// An image chosen for upload but not yet stored.
pub struct PendingImage {
    /// Original file name.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl PendingImage {
    /// Reads an image from disk.
    ///
    /// # Errors
    ///
    /// If the file cannot be read.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Editor input for one section.
///
/// New images take the marker numbers following the retained ones, in the
/// order listed here, so `[resim:N]` markers typed before upload stay valid.
pub struct SectionDraft {
    /// Heading text.
    pub title: String,
    /// Body text with markers.
    pub content: String,
    /// Already-stored images to keep, in order.
    pub retained_images: Vec<SectionImage>,
    /// Images to upload and append after the retained ones.
    pub pending_images: Vec<PendingImage>,
    /// Callouts, in marker order.
    pub callouts: Vec<Callout>,
}

impl SectionDraft {
    #[must_use]
    /// Draft pre-filled from an existing section.
    pub fn from_section(section: &Section) -> Self {
        Self {
            title: section.title.clone(),
            content: section.content.clone(),
            retained_images: section.images.clone(),
            pending_images: Vec::new(),
            callouts: section.callouts.clone(),
        }
    }

    #[must_use]
    /// Number of images the section will have once saved.
    pub fn image_count(&self) -> usize {
        self.retained_images.len() + self.pending_images.len()
    }

    /// Removes the `number`-th (1-based) image across retained then pending.
    ///
    /// Later images move down one number; markers are not rewritten.
    pub fn remove_image(&mut self, number: usize) -> bool {
        let Some(index) = number.checked_sub(1) else {
            return false;
        };
        if index < self.retained_images.len() {
            self.retained_images.remove(index);
            true
        } else if index - self.retained_images.len() < self.pending_images.len() {
            self.pending_images.remove(index - self.retained_images.len());
            true
        } else {
            false
        }
    }

    /// Removes the `number`-th (1-based) callout.
    pub fn remove_callout(&mut self, number: usize) -> bool {
        match number.checked_sub(1) {
            Some(index) if index < self.callouts.len() => {
                self.callouts.remove(index);
                true
            }
            _ => false,
        }
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        if self.title.trim().is_empty() {
            Err(WorkflowError::EmptyTitle)
        } else {
            Ok(())
        }
    }
}

/// Uploads every pending image in order.
///
/// On failure the images already uploaded by this call are deleted again.
pub(crate) fn upload_all<B: BlobStore>(
    blobs: &B,
    pending: &[PendingImage],
    folder: &str,
) -> Result<Vec<SectionImage>, BlobError> {
    let mut uploaded: Vec<SectionImage> = Vec::with_capacity(pending.len());
    for image in pending {
        match blobs.upload(&image.name, &image.bytes, folder) {
            Ok(url) => uploaded.push(SectionImage { url }),
            Err(e) => {
                warn!(
                    name = %image.name,
                    discarded = uploaded.len(),
                    "Upload failed, discarding earlier uploads"
                );
                discard(blobs, &uploaded);
                return Err(e);
            }
        }
    }
    Ok(uploaded)
}

fn discard<B: BlobStore>(blobs: &B, images: &[SectionImage]) {
    for image in images {
        blobs.delete(&image.url);
    }
}

#[derive(Clone, Debug)]
/// Editing session over one game's section tree.
pub struct SectionEditor {
    game: Game,
}

impl SectionEditor {
    #[must_use]
    /// Starts a session on `game`.
    pub fn new(game: Game) -> Self {
        Self { game }
    }

    #[must_use]
    /// The current canonical game.
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[must_use]
    /// The current forest, against which paths are resolved.
    pub fn sections(&self) -> &[Section] {
        &self.game.sections
    }

    #[must_use]
    /// Ends the session, returning the last canonical game.
    pub fn into_game(self) -> Game {
        self.game
    }

    /// Draft pre-filled with the section at `path`.
    ///
    /// # Errors
    ///
    /// If `path` does not resolve.
    pub fn draft_for(&self, path: &SectionPath) -> Result<SectionDraft, TreeError> {
        tree::get(&self.game.sections, path).map(SectionDraft::from_section)
    }

    /// Replaces the session snapshot with the store's current copy.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the game is gone.
    pub fn reload<S: Store>(&mut self, store: &S) -> Result<&Game, StoreError> {
        self.game = store.load_one(&self.game.id)?;
        Ok(&self.game)
    }

    /// Appends a new section built from `draft` under `parent`.
    ///
    /// The root path adds a top-level section.
    ///
    /// # Errors
    ///
    /// See [`WorkflowError`]; on error nothing was persisted and no uploaded
    /// image is left behind.
    pub fn add_subsection<S: Store, B: BlobStore>(
        &mut self,
        store: &mut S,
        blobs: &B,
        parent: &SectionPath,
        draft: SectionDraft,
    ) -> Result<&Game, WorkflowError> {
        draft.validate()?;
        if !parent.is_root() {
            tree::get(&self.game.sections, parent)?;
        }

        let uploaded = upload_all(blobs, &draft.pending_images, SECTIONS_FOLDER)?;
        let mut images = draft.retained_images;
        images.extend(uploaded.iter().cloned());
        let section = Section {
            title: draft.title,
            content: draft.content,
            images,
            callouts: draft.callouts,
            subsections: Vec::new(),
        };

        let result = tree::insert_child(&self.game.sections, parent, section)
            .map_err(WorkflowError::from)
            .and_then(|sections| self.persist(store, sections));
        if let Err(e) = result {
            discard(blobs, &uploaded);
            return Err(e);
        }
        info!(game = %self.game.id, %parent, "Added section");
        Ok(&self.game)
    }

    /// Overwrites the section at `path` with `draft`, keeping its subsections.
    ///
    /// Stored images missing from `draft.retained_images` are deleted from the
    /// blob store once the new tree has been persisted.
    ///
    /// # Errors
    ///
    /// See [`WorkflowError`]; on error nothing was persisted and no stored
    /// image was deleted.
    pub fn edit_section<S: Store, B: BlobStore>(
        &mut self,
        store: &mut S,
        blobs: &B,
        path: &SectionPath,
        draft: SectionDraft,
    ) -> Result<&Game, WorkflowError> {
        draft.validate()?;
        let existing = tree::get(&self.game.sections, path)?;
        let dropped: Vec<SectionImage> = existing
            .images
            .iter()
            .filter(|image| !draft.retained_images.iter().any(|kept| kept.url == image.url))
            .cloned()
            .collect();
        let subsections = existing.subsections.clone();

        let uploaded = upload_all(blobs, &draft.pending_images, SECTIONS_FOLDER)?;
        let mut images = draft.retained_images;
        images.extend(uploaded.iter().cloned());
        let replacement = Section {
            title: draft.title,
            content: draft.content,
            images,
            callouts: draft.callouts,
            subsections,
        };

        let result = tree::replace(&self.game.sections, path, replacement)
            .map_err(WorkflowError::from)
            .and_then(|sections| self.persist(store, sections));
        if let Err(e) = result {
            discard(blobs, &uploaded);
            return Err(e);
        }
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Deleting images dropped from section");
            discard(blobs, &dropped);
        }
        info!(game = %self.game.id, %path, "Edited section");
        Ok(&self.game)
    }

    /// Removes the section at `path` and its whole subtree.
    ///
    /// Images owned by the removed sections stay in the blob store.
    ///
    /// # Errors
    ///
    /// See [`WorkflowError`].
    pub fn delete_section<S: Store>(
        &mut self,
        store: &mut S,
        path: &SectionPath,
    ) -> Result<&Game, WorkflowError> {
        let sections = tree::remove_at(&self.game.sections, path)?;
        self.persist(store, sections)?;
        info!(game = %self.game.id, %path, "Deleted section");
        Ok(&self.game)
    }

    fn persist<S: Store>(
        &mut self,
        store: &mut S,
        sections: Vec<Section>,
    ) -> Result<(), WorkflowError> {
        let mut next = self.game.clone();
        next.sections = sections;
        self.game = store.replace(&next.id, &next)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/workflow.rs"]
mod tests;
