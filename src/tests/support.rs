//! In-memory collaborators with switchable failures.

use crate::blob::{BlobError, BlobStore};
use crate::game::{Game, GameDetails};
use crate::section::{normalize_empty_content, Section};
use crate::store::{Store, StoreError};
use crate::views::{register_view, ViewOutcome};
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io;

#[derive(Default)]
pub(crate) struct MemStore {
    pub games: Vec<Game>,
    pub writable: bool,
    pub fail_writes: bool,
    pub writes: usize,
}

impl MemStore {
    /// Writable store holding one game with the given sections.
    pub fn with_sections(sections: Vec<Section>) -> (Self, Game) {
        let details = GameDetails {
            name: "Test Game".to_string(),
            ..GameDetails::default()
        };
        let mut game = Game::new(details, None, Utc::now());
        game.sections = sections;
        let store = Self {
            games: vec![game.clone()],
            writable: true,
            ..Self::default()
        };
        (store, game)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::Unauthorized);
        }
        if self.fail_writes {
            return Err(StoreError::Io(io::Error::other("disk full")));
        }
        Ok(())
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Game, StoreError> {
        self.games
            .iter_mut()
            .find(|game| game.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}

impl Store for MemStore {
    fn load_all(&self) -> Result<Vec<Game>, StoreError> {
        let mut games = self.games.clone();
        games.sort_by_key(|game| Reverse(game.created_at));
        Ok(games)
    }

    fn load_one(&self, id: &str) -> Result<Game, StoreError> {
        self.games
            .iter()
            .find(|game| game.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn replace(&mut self, id: &str, game: &Game) -> Result<Game, StoreError> {
        self.check_write()?;
        let stored = self.find_mut(id)?;
        stored.icon.clone_from(&game.icon);
        stored.image_url.clone_from(&game.image_url);
        stored.name.clone_from(&game.name);
        stored.desc.clone_from(&game.desc);
        stored.sections.clone_from(&game.sections);
        normalize_empty_content(&mut stored.sections);
        let canonical = stored.clone();
        self.writes += 1;
        Ok(canonical)
    }

    fn create(&mut self, game: Game) -> Result<Game, StoreError> {
        self.check_write()?;
        self.games.push(game.clone());
        self.writes += 1;
        Ok(game)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.find_mut(id)?;
        self.games.retain(|game| game.id != id);
        self.writes += 1;
        Ok(())
    }

    fn record_view(
        &mut self,
        id: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<ViewOutcome, StoreError> {
        let game = self.find_mut(id)?;
        Ok(register_view(game, ip, now))
    }
}

#[derive(Default)]
pub(crate) struct MemBlobs {
    pub objects: RefCell<BTreeMap<String, Vec<u8>>>,
    pub deleted: RefCell<Vec<String>>,
    /// Uploads of this file name fail.
    pub fail_on: Option<String>,
    counter: Cell<usize>,
}

impl MemBlobs {
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn seed(&self, url: &str) {
        self.objects
            .borrow_mut()
            .insert(url.to_string(), b"seed".to_vec());
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.borrow().contains_key(url)
    }

    pub fn stored_count(&self) -> usize {
        self.objects.borrow().len()
    }
}

impl BlobStore for MemBlobs {
    fn upload(&self, name: &str, bytes: &[u8], folder: &str) -> Result<String, BlobError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(BlobError::UploadFailed {
                name: name.to_string(),
                source: io::Error::other("network down"),
            });
        }
        let n = self.counter.get() + 1;
        self.counter.set(n);
        let url = format!("mem://{folder}/{n}-{name}");
        self.objects.borrow_mut().insert(url.clone(), bytes.to_vec());
        Ok(url)
    }

    fn delete(&self, url: &str) {
        self.objects.borrow_mut().remove(url);
        self.deleted.borrow_mut().push(url.to_string());
    }
}
