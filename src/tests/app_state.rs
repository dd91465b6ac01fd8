use super::{AppState, Flow, FormTarget, PendingConfirm, View};
use crate::blob::DirBlobStore;
use crate::game::{Game, GameDetails};
use crate::path::SectionPath;
use crate::section::{CalloutKind, Section};
use crate::store::{JsonStore, Store};
use chrono::Utc;
use std::fs;
use tempfile::{tempdir, TempDir};

type App = AppState<JsonStore<bool>, DirBlobStore>;

/// App over a temporary store holding one game with the given sections.
fn app_with(sections: Vec<Section>) -> (TempDir, App) {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path().join("data"), true).unwrap();
    let details = GameDetails {
        name: "Hollow Knight".to_string(),
        ..GameDetails::default()
    };
    let mut game = Game::new(details, None, Utc::now());
    game.sections = sections;
    store.create(game).unwrap();
    let blobs = DirBlobStore::new(dir.path().join("blobs"), "file://blobs");
    let app = AppState::new(store, blobs, true, 100, "127.0.0.1").unwrap();
    (dir, app)
}

fn sample() -> Vec<Section> {
    vec![
        Section::new("Bosses", "All bosses").with_subsections(vec![
            Section::new("Hornet", "Needle").with_subsections(vec![Section::new("Phase 2", "")]),
            Section::new("Mantis Lords", "Three of them"),
        ]),
        Section::new("Charms", "Equip them"),
    ]
}

fn stored_sections(app: &App) -> Vec<Section> {
    let id = &app.session.as_ref().unwrap().game().id;
    app.store.load_one(id).unwrap().sections
}

fn run(app: &mut App, command: &str) -> Flow {
    app.previous_view = app.current_view;
    app.current_view = View::Command;
    app.execute_command(command)
}

#[test]
fn test_open_game_counts_visit_once() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();
    assert_eq!(app.current_view, View::Tree);
    assert_eq!(app.games[0].click_count, 1);

    app.close_game();
    app.open_game().unwrap();
    assert_eq!(app.games[0].click_count, 1);
}

#[test]
fn test_navigation_expands_and_descends() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();
    // First section starts expanded: Bosses, Hornet, Mantis Lords, Charms
    assert_eq!(app.rows().len(), 4);

    app.select_next();
    assert_eq!(app.selected_path(), Some(SectionPath::from([0, 0])));
    app.expand_or_descend();
    assert_eq!(app.rows().len(), 5);
    app.expand_or_descend();
    assert_eq!(app.selected_path(), Some(SectionPath::from([0, 0, 0])));

    app.collapse_or_ascend();
    assert_eq!(app.selected_path(), Some(SectionPath::from([0, 0])));
    app.collapse_or_ascend();
    assert_eq!(app.rows().len(), 4);
}

#[test]
fn test_search_rows_edit_the_right_section() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();

    app.start_search();
    for c in "three".chars() {
        app.push_search_char(c);
    }
    app.finish_search();
    assert_eq!(app.rows().len(), 2);
    app.select_next();
    assert_eq!(app.selected_path(), Some(SectionPath::from([0, 1])));

    app.begin_edit();
    assert_eq!(app.current_view, View::Editor);
    run(&mut app, "title Mantis Lords (Sisters)");
    app.save_form().unwrap();

    let sections = stored_sections(&app);
    assert_eq!(sections[0].subsections[1].title, "Mantis Lords (Sisters)");
    assert_eq!(sections[0].subsections[0].title, "Hornet");
}

#[test]
fn test_clear_search_keeps_selection() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();
    app.start_search();
    for c in "phase".chars() {
        app.push_search_char(c);
    }
    app.finish_search();
    app.current_row = 2;
    app.clear_search();

    assert!(app.query.is_empty());
    assert_eq!(app.selected_path(), Some(SectionPath::from([0, 0, 0])));
}

#[test]
fn test_add_subsection_through_editor_form() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();
    app.current_row = 3; // Charms

    app.begin_add(false);
    let form = app.form.as_mut().unwrap();
    assert_eq!(
        form.target,
        FormTarget::Add {
            parent: SectionPath::from([1])
        }
    );
    form.editor_state.lines = edtui::Lines::from("Wayward Compass\n[kutu:1]");
    run(&mut app, "title Essentials");
    run(&mut app, "callout warn Costly | Uses a notch");
    assert_eq!(run(&mut app, "w"), Flow::Continue);

    assert_eq!(app.current_view, View::Tree);
    assert_eq!(app.selected_path(), Some(SectionPath::from([1, 0])));
    let added = &stored_sections(&app)[1].subsections[0];
    assert_eq!(added.title, "Essentials");
    assert_eq!(added.content, "Wayward Compass\n[kutu:1]");
    assert_eq!(added.callouts[0].kind, CalloutKind::Warn);
    assert_eq!(added.callouts[0].title, "Costly");
    assert_eq!(added.callouts[0].text, "Uses a notch");
}

#[test]
fn test_save_without_title_keeps_form_open() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();
    app.begin_add(true);
    run(&mut app, "w");

    assert_eq!(app.current_view, View::Editor);
    assert!(app.form.is_some());
    assert!(app.message.as_deref().unwrap_or("").starts_with("Error"));
    assert_eq!(stored_sections(&app).len(), 2);
}

#[test]
fn test_attach_image_uploads_on_save() {
    let (dir, mut app) = app_with(sample());
    let image = dir.path().join("map.png");
    fs::write(&image, b"PNG").unwrap();
    app.open_game().unwrap();

    app.begin_edit();
    run(&mut app, &format!("img {}", image.display()));
    assert_eq!(app.form.as_ref().unwrap().draft.image_count(), 1);
    run(&mut app, "w");

    let section = &stored_sections(&app)[0];
    assert_eq!(section.images.len(), 1);
    assert!(section.images[0].url.starts_with("file://blobs/sections/"));
    let local = app.blobs.local_path(&section.images[0].url).unwrap();
    assert_eq!(fs::read(local).unwrap(), b"PNG");
}

#[test]
fn test_delete_section_needs_confirmation() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();

    app.request_delete_section();
    assert_eq!(app.current_view, View::Confirm);
    assert_eq!(
        app.pending_confirm,
        Some(PendingConfirm::Section(SectionPath::from([0])))
    );
    app.confirm(false);
    assert_eq!(stored_sections(&app).len(), 2);

    app.request_delete_section();
    app.confirm(true);
    assert_eq!(app.current_view, View::Tree);
    let sections = stored_sections(&app);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Charms");
}

#[test]
fn test_deleted_section_does_not_pass_expansion_on() {
    let mut sections = sample();
    sections[1] =
        Section::new("Charms", "").with_subsections(vec![Section::new("Grubsong", "")]);
    let (_dir, mut app) = app_with(sections);
    app.open_game().unwrap();
    assert!(app.expand.is_expanded(&SectionPath::from([0])));

    app.current_row = 0;
    app.request_delete_section();
    app.confirm(true);

    let rows = app.rows();
    let titles: Vec<&str> = rows.iter().map(|row| row.section.title.as_str()).collect();
    assert_eq!(titles, vec!["Charms"]);
}

#[test]
fn test_save_reports_unresolved_markers() {
    let (_dir, mut app) = app_with(sample());
    app.open_game().unwrap();

    app.begin_edit();
    let form = app.form.as_mut().unwrap();
    form.editor_state.lines = edtui::Lines::from("See [resim:1] and [kutu:2]");
    run(&mut app, "w");

    assert_eq!(app.current_view, View::Tree);
    assert_eq!(
        app.message.as_deref(),
        Some("Saved; unresolved markers: [resim:1], [kutu:2]")
    );
    assert_eq!(stored_sections(&app)[0].content, "See [resim:1] and [kutu:2]");
}

#[test]
fn test_game_commands() {
    let (_dir, mut app) = app_with(Vec::new());

    run(&mut app, "new Silksong");
    assert_eq!(app.games.len(), 2);
    assert_eq!(app.current_game().unwrap().name, "Silksong");

    run(&mut app, "desc Pharloom awaits");
    run(&mut app, "icon 🕷");
    let game = app.current_game().unwrap();
    assert_eq!(game.desc, "Pharloom awaits");
    assert_eq!(game.icon.as_deref(), Some("🕷"));

    run(&mut app, "delete");
    assert_eq!(app.current_view, View::Confirm);
    app.confirm(true);
    assert_eq!(app.games.len(), 1);
    assert_eq!(app.games[0].name, "Hollow Knight");

    assert_eq!(run(&mut app, "q"), Flow::Quit);
}

#[test]
fn test_unknown_command_reports_error() {
    let (_dir, mut app) = app_with(sample());
    assert_eq!(run(&mut app, "frobnicate"), Flow::Continue);
    assert_eq!(app.current_view, View::GameList);
    assert_eq!(
        app.message.as_deref(),
        Some("Error: Unknown command: frobnicate")
    );
}

#[test]
fn test_read_only_session_cannot_save() {
    let dir = tempdir().unwrap();
    let mut admin = JsonStore::open(dir.path(), true).unwrap();
    let mut game = Game::new(GameDetails::default(), None, Utc::now());
    game.name = "Locked".to_string();
    game.sections = sample();
    admin.create(game).unwrap();

    let guest = JsonStore::open(dir.path(), false).unwrap();
    let blobs = DirBlobStore::new(dir.path().join("blobs"), "file://blobs");
    let mut app = AppState::new(guest, blobs, false, 100, "local").unwrap();
    app.open_game().unwrap();
    app.begin_edit();
    run(&mut app, "title Vandalised");
    run(&mut app, "w");

    assert!(app
        .message
        .as_deref()
        .unwrap_or("")
        .contains("not authorised"));
    assert_eq!(stored_sections(&app)[0].title, "Bosses");
}
