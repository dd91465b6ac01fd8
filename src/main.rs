//! gametome: tree-structured game guides in the terminal.
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use edtui::{EditorEventHandler, EditorMode};
use gametome::app_state::{AppState, Flow, View};
use gametome::blob::DirBlobStore;
use gametome::config::Config;
use gametome::store::{AdminToken, JsonStore, Store};
use gametome::{logging, tree_view, ui, Error};
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing::{error, info};

type App = AppState<JsonStore<AdminToken>, DirBlobStore>;

#[derive(Parser)]
#[command(name = "gametome")]
#[command(about = "Browse and edit tree-structured game guides", long_about = None)]
struct Args {
    /// Directory holding the game store (overrides the config file)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Admin token enabling edits
    #[arg(long)]
    token: Option<String>,

    /// Open this game (id or name) directly
    #[arg(long, short = 'g')]
    game: Option<String>,

    /// Print the game's outline instead of starting the editor
    #[arg(long, requires = "game")]
    print: bool,

    /// Search query applied to the printed outline
    #[arg(long, short = 'q', default_value = "")]
    query: String,

    /// Identity used for visit counting
    #[arg(long, default_value = "local")]
    client_ip: String,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let mut cfg = Config::load();

    // Override config with command line args
    if let Some(dir) = args.data_dir {
        cfg.data_dir = dir.display().to_string();
    }

    let data_dir = PathBuf::from(&cfg.data_dir);
    logging::init(&data_dir, &cfg.log_level)?;

    let auth = AdminToken::new(cfg.admin_token.clone(), args.token);
    let store = JsonStore::open(&data_dir, auth)?;
    let blobs = DirBlobStore::new(&cfg.blob_dir, cfg.blob_base_url.clone());
    let can_write = store.can_write();
    info!(data_dir = %data_dir.display(), can_write, "Starting");

    if args.print {
        let needle = args.game.unwrap_or_default();
        let game = store
            .load_all()?
            .into_iter()
            .find(|game| game.id == needle || game.name.eq_ignore_ascii_case(&needle))
            .ok_or(Error::UnknownGame(needle))?;
        print!("{}", tree_view::outline(&game.sections, &args.query));
        return Ok(());
    }

    let mut state = AppState::new(store, blobs, can_write, cfg.wrap_width, args.client_ip)?;
    if let Some(needle) = args.game {
        if !state.select_game(&needle) {
            return Err(Error::UnknownGame(needle));
        }
        state.open_game()?;
    }

    run_tui(state)
}

fn run_tui(mut app: App) -> Result<(), Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut editor_handler = EditorEventHandler::default();

    let result = run_app(&mut terminal, &mut app, &mut editor_handler);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!(error = %e, "Terminal loop failed");
    }
    result.map_err(Error::from)
}

fn run_app<T: ratatui::backend::Backend>(
    terminal: &mut Terminal<T>,
    app: &mut App,
    editor_handler: &mut EditorEventHandler,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let flow = match app.current_view {
            View::GameList => on_game_list_key(app, key),
            View::Tree => on_tree_key(app, key),
            View::Search => {
                on_search_key(app, key);
                Flow::Continue
            }
            View::Editor => {
                on_editor_key(app, key, editor_handler);
                Flow::Continue
            }
            View::Command => on_command_key(app, key),
            View::Confirm => {
                match key.code {
                    KeyCode::Char('y' | 'Y') => app.confirm(true),
                    KeyCode::Char('n' | 'N') | KeyCode::Esc => app.confirm(false),
                    _ => {}
                }
                Flow::Continue
            }
        };
        if flow == Flow::Quit {
            return Ok(());
        }
    }
}

fn enter_command(app: &mut App) {
    app.previous_view = app.current_view;
    app.current_view = View::Command;
    app.command_buffer.clear();
    app.message = None;
}

fn on_game_list_key(app: &mut App, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            app.current_game_index = app.current_game_index.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.current_game_index + 1 < app.games.len() {
                app.current_game_index += 1;
            }
        }
        KeyCode::Enter => {
            if let Err(e) = app.open_game() {
                app.message = Some(format!("Error opening game: {e}"));
            }
        }
        KeyCode::Char('r') => {
            if let Err(e) = app.refresh_games() {
                app.message = Some(format!("Error reloading games: {e}"));
            }
        }
        KeyCode::Char('d') => app.request_delete_game(),
        KeyCode::Char(':') => enter_command(app),
        _ => {}
    }
    Flow::Continue
}

fn on_tree_key(app: &mut App, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Char('q') => app.close_game(),
        KeyCode::Esc => {
            if app.query.is_empty() {
                app.close_game();
            } else {
                app.clear_search();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.collapse_or_ascend(),
        KeyCode::Right | KeyCode::Char('l') => app.expand_or_descend(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('a') => app.begin_add(false),
        KeyCode::Char('A') => app.begin_add(true),
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char('d') => app.request_delete_section(),
        KeyCode::Char(':') => enter_command(app),
        _ => {}
    }
    Flow::Continue
}

fn on_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => app.push_search_char(c),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Enter => app.finish_search(),
        KeyCode::Esc => app.clear_search(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        _ => {}
    }
}

fn on_editor_key(app: &mut App, key: KeyEvent, editor_handler: &mut EditorEventHandler) {
    let Some(form) = app.form.as_mut() else {
        app.current_view = View::Tree;
        return;
    };
    let normal = form.editor_state.mode == EditorMode::Normal;
    match key.code {
        KeyCode::Char(':') if normal => enter_command(app),
        KeyCode::Esc if normal => app.cancel_form(),
        _ => editor_handler.on_key_event(key, &mut form.editor_state),
    }
}

fn on_command_key(app: &mut App, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Char(c) => app.command_buffer.push(c),
        KeyCode::Backspace => {
            app.command_buffer.pop();
        }
        KeyCode::Enter => {
            let cmd = std::mem::take(&mut app.command_buffer);
            return app.execute_command(&cmd);
        }
        KeyCode::Esc => {
            app.current_view = app.previous_view;
            app.command_buffer.clear();
        }
        _ => {}
    }
    Flow::Continue
}
