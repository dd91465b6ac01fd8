//! Game-level create, update and delete, including cover image handling.

use crate::blob::{BlobStore, GAMES_FOLDER};
use crate::game::{Game, GameDetails};
use crate::store::Store;
use crate::workflow::{upload_all, PendingImage, WorkflowError};
use chrono::Utc;
use tracing::info;

/// Uploads the cover image, returning its URL, if there is one.
fn upload_cover<B: BlobStore>(
    blobs: &B,
    cover: Option<&PendingImage>,
) -> Result<Option<String>, WorkflowError> {
    let Some(cover) = cover else {
        return Ok(None);
    };
    let mut uploaded = upload_all(blobs, std::slice::from_ref(cover), GAMES_FOLDER)?;
    Ok(uploaded.pop().map(|image| image.url))
}

fn discard_url<B: BlobStore>(blobs: &B, url: Option<&String>) {
    if let Some(url) = url {
        blobs.delete(url);
    }
}

/// Creates a game with no sections.
///
/// # Errors
///
/// Upload or store failure; an uploaded cover is deleted again on failure.
pub fn create_game<S: Store, B: BlobStore>(
    store: &mut S,
    blobs: &B,
    details: GameDetails,
    cover: Option<&PendingImage>,
) -> Result<Game, WorkflowError> {
    if details.name.trim().is_empty() {
        return Err(WorkflowError::EmptyTitle);
    }
    let image_url = upload_cover(blobs, cover)?;
    let game = Game::new(details, image_url.clone(), Utc::now());
    store.create(game).map_err(|e| {
        discard_url(blobs, image_url.as_ref());
        WorkflowError::from(e)
    })
}

/// Updates a game's metadata, optionally replacing its cover image.
///
/// The previous cover is deleted only after the new one is stored and the
/// game persisted. Sections are written back as they are in `game`.
///
/// # Errors
///
/// Upload or store failure; an uploaded cover is deleted again on failure.
pub fn update_game_details<S: Store, B: BlobStore>(
    store: &mut S,
    blobs: &B,
    game: &Game,
    details: GameDetails,
    cover: Option<&PendingImage>,
) -> Result<Game, WorkflowError> {
    if details.name.trim().is_empty() {
        return Err(WorkflowError::EmptyTitle);
    }
    let new_cover = upload_cover(blobs, cover)?;

    let mut next = game.clone();
    let icon = details.icon.trim();
    next.icon = (!icon.is_empty()).then(|| icon.to_string()).or(next.icon);
    next.name = details.name;
    next.desc = details.desc;
    if let Some(url) = &new_cover {
        next.image_url = Some(url.clone());
    }

    let canonical = store.replace(&game.id, &next).map_err(|e| {
        discard_url(blobs, new_cover.as_ref());
        WorkflowError::from(e)
    })?;
    if new_cover.is_some() {
        discard_url(blobs, game.image_url.as_ref());
    }
    info!(id = %canonical.id, "Updated game details");
    Ok(canonical)
}

/// Deletes a game and then its cover image.
///
/// Images attached to the game's sections are left in the blob store.
///
/// # Errors
///
/// Store failure; the cover image is kept in that case.
pub fn delete_game<S: Store, B: BlobStore>(
    store: &mut S,
    blobs: &B,
    game: &Game,
) -> Result<(), WorkflowError> {
    store.delete(&game.id)?;
    discard_url(blobs, game.image_url.as_ref());
    Ok(())
}

/// Returns the stored copy after removing a cover image without replacing it.
///
/// # Errors
///
/// Store failure; the image is kept in that case.
pub fn remove_cover<S: Store, B: BlobStore>(
    store: &mut S,
    blobs: &B,
    game: &Game,
) -> Result<Game, WorkflowError> {
    let mut next = game.clone();
    next.image_url = None;
    let canonical = store.replace(&game.id, &next)?;
    discard_url(blobs, game.image_url.as_ref());
    Ok(canonical)
}

#[cfg(test)]
#[path = "tests/games.rs"]
mod tests;
