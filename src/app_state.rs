//! The core state machine bridging the guide store and the interactive editor.
//!
//! A TUI needs a single source of truth that can be interrogated and mutated as the user navigates
//! and edits. The open game lives in a [`SectionEditor`] session whose snapshot every path is
//! resolved against; expansion and selection are view state layered on top of it and are
//! re-derived after every committed change.

use crate::blob::BlobStore;
use crate::game::{Game, GameDetails};
use crate::games;
use crate::markers;
use crate::path::SectionPath;
use crate::section::{Callout, CalloutKind};
use crate::store::{Store, StoreError};
use crate::tree;
use crate::tree_view::{self, ExpandState, Row};
use crate::workflow::{PendingImage, SectionDraft, SectionEditor, WorkflowError};
use chrono::Utc;
use edtui::{EditorState, Lines};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// Determines which UI screen renders and how input is interpreted.
pub enum View {
    /// Lists the games in the store.
    GameList,
    /// Shows the open game's section tree with the selected section's body.
    Tree,
    /// Typing a search query over the open tree.
    Search,
    /// Vim-like editor for a section's body, with its assets listed above.
    Editor,
    /// Captures vim-style command input after ':' keystroke.
    Command,
    /// Waiting for a y/n answer to a destructive action.
    Confirm,
}

#[derive(Clone, PartialEq, Eq, Debug)]
/// Where a section form will be committed.
pub enum FormTarget {
    /// Append a new child under this parent (the root adds a top-level section).
    Add {
        /// Parent of the new section.
        parent: SectionPath,
    },
    /// Overwrite the section at this path.
    Edit {
        /// Section being edited.
        path: SectionPath,
    },
}

/// Section being composed in the editor view.
pub struct SectionForm {
    /// Commit destination.
    pub target: FormTarget,
    /// Title, assets and pending uploads; the body lives in `editor_state`.
    pub draft: SectionDraft,
    /// Body text buffer.
    pub editor_state: EditorState,
}

impl SectionForm {
    fn new(target: FormTarget, draft: SectionDraft) -> Self {
        let editor_state = EditorState::new(Lines::from(draft.content.as_str()));
        Self {
            target,
            draft,
            editor_state,
        }
    }

    #[must_use]
    /// Current body text from the editor buffer.
    pub fn content(&self) -> String {
        self.editor_state
            .lines
            .iter_row()
            .map(|line| line.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
/// Destructive action awaiting confirmation.
pub enum PendingConfirm {
    /// Delete the section (and subtree) at this path.
    Section(SectionPath),
    /// Delete the game at this index of the game list.
    Game(usize),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// Whether the main loop should keep running after a command.
pub enum Flow {
    /// Keep going.
    Continue,
    /// Leave the application.
    Quit,
}

/// Bridges the store, the editing session and the terminal views.
pub struct AppState<S, B> {
    /// Game persistence.
    pub store: S,
    /// Image storage.
    pub blobs: B,
    /// Whether this session may edit; only used to tailor hints.
    pub can_write: bool,
    /// All games, newest first.
    pub games: Vec<Game>,
    /// Selected game in the game list.
    pub current_game_index: usize,
    /// Editing session for the open game.
    pub session: Option<SectionEditor>,
    /// Expanded/collapsed flags for the open tree.
    pub expand: ExpandState,
    /// Selected row among the visible rows.
    pub current_row: usize,
    /// Active search query; blank shows the whole tree.
    pub query: String,
    /// Active UI screen determining input handling.
    pub current_view: View,
    /// Screen to return to after a command or confirmation.
    pub previous_view: View,
    /// Accumulates vim-style command input after ':' is pressed.
    pub command_buffer: String,
    /// Status feedback displayed in the help bar.
    pub message: Option<String>,
    /// Section form while the editor view is active.
    pub form: Option<SectionForm>,
    /// Action the confirm view is asking about.
    pub pending_confirm: Option<PendingConfirm>,
    /// Maximum line width for text wrapping in the editor.
    pub wrap_width: usize,
    /// Client identity used for visit counting.
    pub client_ip: String,
}

impl<S: Store, B: BlobStore> AppState<S, B> {
    /// Initialises application state with the games currently in the store.
    ///
    /// # Errors
    ///
    /// If the store cannot be read.
    pub fn new(
        store: S,
        blobs: B,
        can_write: bool,
        wrap_width: usize,
        client_ip: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let games = store.load_all()?;
        Ok(Self {
            store,
            blobs,
            can_write,
            games,
            current_game_index: 0,
            session: None,
            expand: ExpandState::with_first_open(),
            current_row: 0,
            query: String::new(),
            current_view: View::GameList,
            previous_view: View::GameList,
            command_buffer: String::new(),
            message: None,
            form: None,
            pending_confirm: None,
            wrap_width,
            client_ip: client_ip.into(),
        })
    }

    /// Reloads the game list, keeping the selection on the same game if it still exists.
    ///
    /// # Errors
    ///
    /// If the store cannot be read.
    pub fn refresh_games(&mut self) -> Result<(), StoreError> {
        let selected_id = self.current_game().map(|game| game.id.clone());
        self.games = self.store.load_all()?;
        self.current_game_index = selected_id
            .and_then(|id| self.games.iter().position(|game| game.id == id))
            .unwrap_or(0)
            .min(self.games.len().saturating_sub(1));
        Ok(())
    }

    #[must_use]
    /// Game selected in the game list.
    pub fn current_game(&self) -> Option<&Game> {
        self.games.get(self.current_game_index)
    }

    /// Selects the game whose id or name matches `needle`.
    pub fn select_game(&mut self, needle: &str) -> bool {
        let found = self
            .games
            .iter()
            .position(|game| game.id == needle || game.name.eq_ignore_ascii_case(needle));
        if let Some(index) = found {
            self.current_game_index = index;
        }
        found.is_some()
    }

    /// Opens the selected game, counting the visit.
    ///
    /// # Errors
    ///
    /// If the game vanished from the store.
    pub fn open_game(&mut self) -> Result<(), StoreError> {
        let Some(id) = self.current_game().map(|game| game.id.clone()) else {
            return Ok(());
        };
        let outcome = self.store.record_view(&id, &self.client_ip, Utc::now())?;
        debug!(%id, counted = outcome.counted, "Opened game");
        let game = self.store.load_one(&id)?;
        if let Some(listed) = self.games.get_mut(self.current_game_index) {
            listed.click_count = game.click_count;
        }
        self.session = Some(SectionEditor::new(game));
        self.expand = ExpandState::with_first_open();
        self.query.clear();
        self.current_row = 0;
        self.current_view = View::Tree;
        Ok(())
    }

    /// Closes the open game and returns to the list.
    pub fn close_game(&mut self) {
        self.session = None;
        self.form = None;
        self.query.clear();
        self.current_view = View::GameList;
        if let Err(e) = self.refresh_games() {
            self.message = Some(format!("Error reloading games: {e}"));
        }
    }

    #[must_use]
    /// Visible rows of the open tree under the current expansion and query.
    pub fn rows(&self) -> Vec<Row<'_>> {
        self.session.as_ref().map_or_else(Vec::new, |session| {
            tree_view::visible_rows(session.sections(), &self.expand, &self.query)
        })
    }

    #[must_use]
    /// Path of the selected row, in the unfiltered tree.
    pub fn selected_path(&self) -> Option<SectionPath> {
        self.rows()
            .get(self.current_row)
            .map(|row| row.path.clone())
    }

    /// Keeps the selection inside the visible rows.
    pub fn clamp_selection(&mut self) {
        let count = self.rows().len();
        self.current_row = self.current_row.min(count.saturating_sub(1));
    }

    /// Moves the selection to the row showing `path`, if visible.
    pub fn select_path(&mut self, path: &SectionPath) {
        if let Some(index) = self.rows().iter().position(|row| &row.path == path) {
            self.current_row = index;
        }
    }

    /// Selects the next visible row.
    pub fn select_next(&mut self) {
        if self.current_row + 1 < self.rows().len() {
            self.current_row += 1;
        }
    }

    /// Selects the previous visible row.
    pub fn select_prev(&mut self) {
        self.current_row = self.current_row.saturating_sub(1);
    }

    /// Expands or collapses the selected section.
    pub fn toggle_selected(&mut self) {
        if let Some(path) = self.selected_path() {
            self.expand.toggle(&path);
            self.clamp_selection();
        }
    }

    /// Owned facts about the selected row: path, expanded, has children.
    fn selected_row(&self) -> Option<(SectionPath, bool, bool)> {
        self.rows()
            .get(self.current_row)
            .map(|row| (row.path.clone(), row.expanded, row.has_children))
    }

    /// Expands the selected section, or steps into its first child if already expanded.
    pub fn expand_or_descend(&mut self) {
        let Some((path, expanded, has_children)) = self.selected_row() else {
            return;
        };
        if !has_children {
            return;
        }
        if expanded {
            self.select_next();
        } else {
            self.expand.set(&path, true);
        }
    }

    /// Collapses the selected section, or moves to its parent if already collapsed.
    pub fn collapse_or_ascend(&mut self) {
        let Some((path, expanded, _)) = self.selected_row() else {
            return;
        };
        if expanded && self.query.trim().is_empty() {
            self.expand.set(&path, false);
        } else if let Some(parent) = path.parent().filter(|p| !p.is_root()) {
            self.select_path(&parent);
        }
    }

    // --- Search ---

    /// Starts typing a query.
    pub fn start_search(&mut self) {
        self.current_view = View::Search;
    }

    /// Appends to the query and keeps the selection in range.
    pub fn push_search_char(&mut self, c: char) {
        self.query.push(c);
        self.current_row = 0;
    }

    /// Removes the last query character.
    pub fn pop_search_char(&mut self) {
        self.query.pop();
        self.current_row = 0;
    }

    /// Stops typing, keeping the query active.
    pub fn finish_search(&mut self) {
        self.current_view = View::Tree;
        self.clamp_selection();
    }

    /// Drops the query, keeping the selected section selected.
    pub fn clear_search(&mut self) {
        let selected = self.selected_path();
        self.query.clear();
        self.current_view = View::Tree;
        if let Some(path) = selected {
            self.expand.reveal(&path);
            self.select_path(&path);
        }
        self.clamp_selection();
    }

    // --- Section forms ---

    /// Opens an empty form for a new section.
    ///
    /// With `top_level` the section is added to the root, otherwise under the
    /// selected section.
    pub fn begin_add(&mut self, top_level: bool) {
        if self.session.is_none() {
            return;
        }
        let parent = if top_level {
            SectionPath::root()
        } else {
            self.selected_path().unwrap_or_default()
        };
        self.form = Some(SectionForm::new(
            FormTarget::Add { parent },
            SectionDraft::default(),
        ));
        self.current_view = View::Editor;
        self.message = Some("Set the title with :title <text>".to_string());
    }

    /// Opens a form pre-filled with the selected section.
    pub fn begin_edit(&mut self) {
        let (Some(session), Some(path)) = (&self.session, self.selected_path()) else {
            return;
        };
        match session.draft_for(&path) {
            Ok(draft) => {
                self.form = Some(SectionForm::new(FormTarget::Edit { path }, draft));
                self.current_view = View::Editor;
                self.message = None;
            }
            Err(e) => self.message = Some(format!("Error: {e}")),
        }
    }

    /// Abandons the form without saving.
    pub fn cancel_form(&mut self) {
        self.form = None;
        self.current_view = View::Tree;
    }

    /// Commits the form through the editing session.
    ///
    /// On failure the form stays open with its input intact.
    ///
    /// # Errors
    ///
    /// Any [`WorkflowError`] from the session.
    pub fn save_form(&mut self) -> Result<(), WorkflowError> {
        let (Some(session), Some(form)) = (self.session.as_mut(), self.form.as_ref()) else {
            return Ok(());
        };
        let mut draft = form.draft.clone();
        draft.content = form.content();

        let focus = match &form.target {
            FormTarget::Add { parent } => {
                let child = tree::next_child_path(session.sections(), parent);
                session.add_subsection(&mut self.store, &self.blobs, parent, draft)?;
                child
            }
            FormTarget::Edit { path } => {
                session.edit_section(&mut self.store, &self.blobs, path, draft)?;
                Some(path.clone())
            }
        };

        let dangling = focus
            .as_ref()
            .and_then(|path| tree::get(session.sections(), path).ok())
            .map(markers::unresolved)
            .unwrap_or_default();
        self.message = Some(if dangling.is_empty() {
            "Saved".to_string()
        } else {
            format!("Saved; unresolved markers: {}", dangling.join(", "))
        });

        self.form = None;
        self.current_view = View::Tree;
        if let Some(path) = focus {
            self.expand.reveal(&path);
            self.select_path(&path);
        }
        self.clamp_selection();
        Ok(())
    }

    /// Adds an image file to the form's pending uploads.
    ///
    /// Returns the marker number the image will have.
    ///
    /// # Errors
    ///
    /// If the file cannot be read.
    pub fn attach_image(&mut self, path: &Path) -> std::io::Result<Option<usize>> {
        let Some(form) = self.form.as_mut() else {
            return Ok(None);
        };
        form.draft.pending_images.push(PendingImage::from_file(path)?);
        Ok(Some(form.draft.image_count()))
    }

    // --- Deletion ---

    /// Asks to delete the selected section.
    pub fn request_delete_section(&mut self) {
        let Some((path, title, descendants)) = self.rows().get(self.current_row).map(|row| {
            (
                row.path.clone(),
                row.section.title.clone(),
                row.section.subtree_len() - 1,
            )
        }) else {
            return;
        };
        self.message = Some(format!(
            "Delete \"{title}\" and {descendants} subsection(s)? (y/n)"
        ));
        self.pending_confirm = Some(PendingConfirm::Section(path));
        self.previous_view = View::Tree;
        self.current_view = View::Confirm;
    }

    /// Asks to delete the selected game.
    pub fn request_delete_game(&mut self) {
        let Some(game) = self.current_game() else {
            return;
        };
        self.message = Some(format!("Delete game \"{}\"? (y/n)", game.name));
        self.pending_confirm = Some(PendingConfirm::Game(self.current_game_index));
        self.previous_view = View::GameList;
        self.current_view = View::Confirm;
    }

    /// Answers the pending confirmation.
    pub fn confirm(&mut self, yes: bool) {
        self.current_view = self.previous_view;
        let Some(pending) = self.pending_confirm.take() else {
            return;
        };
        if !yes {
            self.message = None;
            return;
        }
        let result = match pending {
            PendingConfirm::Section(path) => self.delete_section(&path),
            PendingConfirm::Game(index) => self.delete_game(index),
        };
        self.message = Some(match result {
            Ok(()) => "Deleted".to_string(),
            Err(e) => format!("Error deleting: {e}"),
        });
    }

    fn delete_section(&mut self, path: &SectionPath) -> Result<(), WorkflowError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.delete_section(&mut self.store, path)?;
        self.expand.forget(path);
        self.clamp_selection();
        Ok(())
    }

    fn delete_game(&mut self, index: usize) -> Result<(), WorkflowError> {
        let Some(game) = self.games.get(index).cloned() else {
            return Ok(());
        };
        games::delete_game(&mut self.store, &self.blobs, &game)?;
        self.refresh_games()?;
        Ok(())
    }

    // --- Game metadata ---

    fn update_current_game(
        &mut self,
        edit: impl FnOnce(&mut GameDetails),
        cover: Option<&PendingImage>,
    ) -> Result<(), WorkflowError> {
        let Some(game) = self.current_game().cloned() else {
            return Ok(());
        };
        let mut details = game.details();
        edit(&mut details);
        games::update_game_details(&mut self.store, &self.blobs, &game, details, cover)?;
        self.refresh_games()?;
        Ok(())
    }

    fn create_game(&mut self, name: &str) -> Result<(), WorkflowError> {
        let details = GameDetails {
            name: name.to_string(),
            ..GameDetails::default()
        };
        let game = games::create_game(&mut self.store, &self.blobs, details, None)?;
        self.refresh_games()?;
        self.select_game(&game.id);
        Ok(())
    }

    // --- Commands ---

    /// Runs a `:` command typed in the view the command line was opened from.
    pub fn execute_command(&mut self, command: &str) -> Flow {
        let command = command.trim();
        let (name, arg) = command
            .split_once(' ')
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));
        let origin = self.previous_view;
        self.current_view = origin;

        let result: Result<Option<String>, String> = match (origin, name) {
            (View::GameList, "q" | "q!") => return Flow::Quit,
            (View::GameList, "new") if !arg.is_empty() => self
                .create_game(arg)
                .map(|()| Some("Game created".to_string()))
                .map_err(|e| e.to_string()),
            (View::GameList, "rename") if !arg.is_empty() => self
                .update_current_game(|d| d.name = arg.to_string(), None)
                .map(|()| Some("Renamed".to_string()))
                .map_err(|e| e.to_string()),
            (View::GameList, "desc") => self
                .update_current_game(|d| d.desc = arg.to_string(), None)
                .map(|()| Some("Description updated".to_string()))
                .map_err(|e| e.to_string()),
            (View::GameList, "icon") if !arg.is_empty() => self
                .update_current_game(|d| d.icon = arg.to_string(), None)
                .map(|()| Some("Icon updated".to_string()))
                .map_err(|e| e.to_string()),
            (View::GameList, "cover") if !arg.is_empty() => {
                match PendingImage::from_file(Path::new(arg)) {
                    Ok(cover) => self
                        .update_current_game(|_| {}, Some(&cover))
                        .map(|()| Some("Cover updated".to_string()))
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(format!("cannot read {arg}: {e}")),
                }
            }
            (View::GameList, "nocover") => self.remove_cover(),
            (View::GameList, "delete") => {
                self.request_delete_game();
                Ok(None)
            }
            (View::Tree | View::Search, "q" | "q!") => {
                self.close_game();
                Ok(None)
            }
            (View::Tree | View::Search, "add") => {
                self.begin_add(arg == "top");
                Ok(None)
            }
            (View::Tree | View::Search, "edit") => {
                self.begin_edit();
                Ok(None)
            }
            (View::Tree | View::Search, "delete") => {
                self.request_delete_section();
                Ok(None)
            }
            (View::Tree | View::Search, "expand") => {
                if let Some(session) = &self.session {
                    self.expand.expand_all(session.sections());
                }
                Ok(None)
            }
            (View::Tree | View::Search, "collapse") => {
                self.expand.collapse_all();
                self.current_row = 0;
                Ok(None)
            }
            (View::Tree | View::Search, "reload") => self.reload_session(),
            (View::Editor, _) => self.execute_form_command(name, arg),
            _ => Err(format!("Unknown command: {command}")),
        };

        match result {
            Ok(Some(message)) => self.message = Some(message),
            Ok(None) => {}
            Err(e) => {
                warn!(command, error = %e, "Command failed");
                self.message = Some(format!("Error: {e}"));
            }
        }
        Flow::Continue
    }

    fn remove_cover(&mut self) -> Result<Option<String>, String> {
        let Some(game) = self.current_game().cloned() else {
            return Ok(None);
        };
        games::remove_cover(&mut self.store, &self.blobs, &game).map_err(|e| e.to_string())?;
        self.refresh_games().map_err(|e| e.to_string())?;
        Ok(Some("Cover removed".to_string()))
    }

    fn reload_session(&mut self) -> Result<Option<String>, String> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        session.reload(&self.store).map_err(|e| e.to_string())?;
        self.clamp_selection();
        Ok(Some("Reloaded".to_string()))
    }

    fn execute_form_command(&mut self, name: &str, arg: &str) -> Result<Option<String>, String> {
        match name {
            "w" | "x" | "wq" => self
                .save_form()
                .map(|()| Some("Saved".to_string()))
                .map_err(|e| e.to_string()),
            "q" | "q!" => {
                self.cancel_form();
                Ok(None)
            }
            "img" => {
                let number = self
                    .attach_image(Path::new(arg))
                    .map_err(|e| format!("cannot read {arg}: {e}"))?;
                Ok(number.map(|n| format!("Image added as [resim:{n}]")))
            }
            _ => {
                let Some(form) = self.form.as_mut() else {
                    return Ok(None);
                };
                apply_form_edit(&mut form.draft, name, arg)
            }
        }
    }
}

/// Applies a metadata command to a draft.
fn apply_form_edit(
    draft: &mut SectionDraft,
    name: &str,
    arg: &str,
) -> Result<Option<String>, String> {
    let number = || arg.parse::<usize>().map_err(|_| format!("not a number: {arg}"));
    match name {
        "title" => {
            draft.title = arg.to_string();
            Ok(None)
        }
        "rmimg" => {
            if draft.remove_image(number()?) {
                Ok(Some(
                    "Image removed; later image markers now point one lower".to_string(),
                ))
            } else {
                Err(format!("no image {arg}"))
            }
        }
        "callout" => {
            let callout = parse_callout(arg)?;
            draft.callouts.push(callout);
            Ok(Some(format!("Callout added as [kutu:{}]", draft.callouts.len())))
        }
        "rmcallout" => {
            if draft.remove_callout(number()?) {
                Ok(Some(
                    "Callout removed; later callout markers now point one lower".to_string(),
                ))
            } else {
                Err(format!("no callout {arg}"))
            }
        }
        _ => Err(format!("Unknown command: {name}")),
    }
}

/// Parses `<kind> <title> | <text>`.
fn parse_callout(arg: &str) -> Result<Callout, String> {
    let (kind, rest) = arg.split_once(' ').unwrap_or((arg, ""));
    let kind = CalloutKind::parse(kind)
        .ok_or_else(|| format!("callout kind must be info, warn or note, not {kind}"))?;
    let (title, text) = rest.split_once('|').unwrap_or((rest, ""));
    Ok(Callout {
        kind,
        title: title.trim().to_string(),
        text: text.trim().to_string(),
    })
}

#[cfg(test)]
#[path = "tests/app_state.rs"]
mod tests;
