//! Persistence of games and their section trees.
//!
//! The editor treats the store as opaque: it sends whole games and adopts
//! whatever canonical game comes back. Writes are gated by an [`Auth`] check
//! inside the store, so callers never repeat it.

use crate::game::Game;
use crate::section::normalize_empty_content;
use crate::views::{register_view, ViewOutcome};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File holding every game, inside the store directory.
pub const GAMES_FILE: &str = "games.json";

#[derive(Error, Debug)]
/// Store failures surfaced to callers.
pub enum StoreError {
    /// No game has this id (any more).
    #[error("game not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The caller is not allowed to write.
    #[error("not authorised to modify games")]
    Unauthorized,

    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The backing file is not valid game JSON.
    #[error("storage data is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

/// Decides whether the current session may write.
pub trait Auth {
    /// Whether writes should be accepted.
    fn is_authenticated(&self) -> bool;
}

#[derive(Clone, Debug, Default)]
/// Single shared admin secret compared against the token the session presents.
pub struct AdminToken {
    expected: String,
    presented: Option<String>,
}

impl AdminToken {
    #[must_use]
    /// Checks `presented` against `expected`; an empty `expected` admits nobody.
    pub fn new(expected: impl Into<String>, presented: Option<String>) -> Self {
        Self {
            expected: expected.into(),
            presented,
        }
    }
}

impl Auth for AdminToken {
    fn is_authenticated(&self) -> bool {
        !self.expected.is_empty() && self.presented.as_deref() == Some(self.expected.as_str())
    }
}

impl Auth for bool {
    fn is_authenticated(&self) -> bool {
        *self
    }
}

/// Game persistence contract.
pub trait Store {
    /// Every game, newest first.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn load_all(&self) -> Result<Vec<Game>, StoreError>;

    /// The game with `id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if there is none.
    fn load_one(&self, id: &str) -> Result<Game, StoreError>;

    /// Overwrites the editable parts of game `id` and returns the stored game.
    ///
    /// Visit counters and creation time are owned by the store and are not
    /// taken from `game`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unauthorized`] or [`StoreError::NotFound`].
    fn replace(&mut self, id: &str, game: &Game) -> Result<Game, StoreError>;

    /// Adds a new game and returns the stored game.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unauthorized`].
    fn create(&mut self, game: Game) -> Result<Game, StoreError>;

    /// Removes game `id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unauthorized`] or [`StoreError::NotFound`].
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// Counts a visit to game `id` from `ip`. Needs no authorisation.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`].
    fn record_view(
        &mut self,
        id: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<ViewOutcome, StoreError>;
}

#[derive(Debug)]
/// Store keeping every game in one JSON document on disk.
///
/// Each write rewrites the document through a temporary file and a rename,
/// so a crash never leaves a half-written file behind.
pub struct JsonStore<A> {
    dir: PathBuf,
    auth: A,
}

impl<A: Auth> JsonStore<A> {
    /// Opens (creating if needed) a store in `dir`.
    ///
    /// # Errors
    ///
    /// If the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>, auth: A) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "Opened game store");
        Ok(Self { dir, auth })
    }

    #[must_use]
    /// Directory holding the store files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    /// Whether writes will be accepted.
    pub fn can_write(&self) -> bool {
        self.auth.is_authenticated()
    }

    fn games_path(&self) -> PathBuf {
        self.dir.join(GAMES_FILE)
    }

    fn read(&self) -> Result<Vec<Game>, StoreError> {
        match fs::read_to_string(self.games_path()) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, games: &[Game]) -> Result<(), StoreError> {
        let path = self.games_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(games)?)?;
        fs::rename(&tmp, &path)?;
        debug!(count = games.len(), "Wrote games");
        Ok(())
    }

    fn require_auth(&self) -> Result<(), StoreError> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(StoreError::Unauthorized)
        }
    }
}

impl<A: Auth> Store for JsonStore<A> {
    fn load_all(&self) -> Result<Vec<Game>, StoreError> {
        let mut games = self.read()?;
        games.sort_by_key(|game| Reverse(game.created_at));
        Ok(games)
    }

    fn load_one(&self, id: &str) -> Result<Game, StoreError> {
        self.read()?
            .into_iter()
            .find(|game| game.id == id)
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn replace(&mut self, id: &str, game: &Game) -> Result<Game, StoreError> {
        self.require_auth()?;
        let mut games = self.read()?;
        let stored = games
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;

        stored.icon.clone_from(&game.icon);
        stored.image_url.clone_from(&game.image_url);
        stored.name.clone_from(&game.name);
        stored.desc.clone_from(&game.desc);
        stored.sections.clone_from(&game.sections);
        normalize_empty_content(&mut stored.sections);
        stored.updated_at = Utc::now();
        let canonical = stored.clone();

        self.write(&games)?;
        info!(%id, sections = canonical.sections.len(), "Replaced game");
        Ok(canonical)
    }

    fn create(&mut self, mut game: Game) -> Result<Game, StoreError> {
        self.require_auth()?;
        let mut games = self.read()?;
        normalize_empty_content(&mut game.sections);
        game.click_count = 0;
        game.viewed_ips.clear();
        games.push(game.clone());
        self.write(&games)?;
        info!(id = %game.id, name = %game.name, "Created game");
        Ok(game)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.require_auth()?;
        let mut games = self.read()?;
        let before = games.len();
        games.retain(|game| game.id != id);
        if games.len() == before {
            return Err(StoreError::not_found(id));
        }
        self.write(&games)?;
        info!(%id, "Deleted game");
        Ok(())
    }

    fn record_view(
        &mut self,
        id: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<ViewOutcome, StoreError> {
        let mut games = self.read()?;
        let game = games
            .iter_mut()
            .find(|game| game.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        let outcome = register_view(game, ip, now);
        if outcome.counted {
            normalize_empty_content(&mut game.sections);
            self.write(&games)?;
        }
        debug!(%id, counted = outcome.counted, clicks = outcome.click_count, "Recorded view");
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod tests;
