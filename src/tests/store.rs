use super::{AdminToken, Auth, JsonStore, Store, StoreError, GAMES_FILE};
use crate::game::{Game, GameDetails};
use crate::section::Section;
use chrono::{Duration, TimeZone, Utc};
use std::fs;
use tempfile::tempdir;

fn new_game(name: &str, days: i64) -> Game {
    let details = GameDetails {
        name: name.to_string(),
        ..GameDetails::default()
    };
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(days);
    Game::new(details, None, created)
}

#[test]
fn test_admin_token() {
    assert!(AdminToken::new("s3cret", Some("s3cret".to_string())).is_authenticated());
    assert!(!AdminToken::new("s3cret", Some("guess".to_string())).is_authenticated());
    assert!(!AdminToken::new("s3cret", None).is_authenticated());
    // No configured secret means nobody can write
    assert!(!AdminToken::new("", Some(String::new())).is_authenticated());
}

#[test]
fn test_empty_store_loads_nothing() {
    let dir = tempdir().unwrap();
    let store = JsonStore::open(dir.path(), true).unwrap();
    assert!(store.load_all().unwrap().is_empty());
    assert!(matches!(
        store.load_one("missing"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_create_and_list_newest_first() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    store.create(new_game("Older", 0)).unwrap();
    store.create(new_game("Newer", 5)).unwrap();

    let names: Vec<String> = store
        .load_all()
        .unwrap()
        .into_iter()
        .map(|game| game.name)
        .collect();
    assert_eq!(names, vec!["Newer", "Older"]);
    assert!(dir.path().join(GAMES_FILE).exists());
}

#[test]
fn test_create_resets_visit_counters() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    let mut game = new_game("Celeste", 0);
    game.click_count = 99;

    let stored = store.create(game).unwrap();
    assert_eq!(stored.click_count, 0);
}

#[test]
fn test_writes_require_auth() {
    let dir = tempdir().unwrap();
    let mut admin = JsonStore::open(dir.path(), true).unwrap();
    let game = admin.create(new_game("Celeste", 0)).unwrap();

    let mut guest = JsonStore::open(dir.path(), false).unwrap();
    assert!(!guest.can_write());
    assert!(matches!(
        guest.create(new_game("Other", 1)),
        Err(StoreError::Unauthorized)
    ));
    assert!(matches!(
        guest.replace(&game.id, &game),
        Err(StoreError::Unauthorized)
    ));
    assert!(matches!(guest.delete(&game.id), Err(StoreError::Unauthorized)));
    // Reading and counting visits need no token
    assert_eq!(guest.load_all().unwrap().len(), 1);
    assert!(guest.record_view(&game.id, "1.2.3.4", Utc::now()).unwrap().counted);
}

#[test]
fn test_replace_normalizes_and_keeps_counters() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    let game = store.create(new_game("Celeste", 0)).unwrap();
    store.record_view(&game.id, "1.2.3.4", Utc::now()).unwrap();

    let mut edited = game.clone();
    edited.name = "Celeste Classic".to_string();
    edited.click_count = 0;
    edited.sections = vec![Section::new("Empty", "").with_subsections(vec![Section::new("Also", "")])];

    let stored = store.replace(&game.id, &edited).unwrap();

    assert_eq!(stored.name, "Celeste Classic");
    assert_eq!(stored.click_count, 1);
    assert_eq!(stored.sections[0].content, " ");
    assert_eq!(stored.sections[0].subsections[0].content, " ");
    assert_eq!(stored.created_at, game.created_at);
    assert_eq!(store.load_one(&game.id).unwrap(), stored);
}

#[test]
fn test_replace_and_delete_missing_game() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    let ghost = new_game("Ghost", 0);
    assert!(matches!(
        store.replace(&ghost.id, &ghost),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete(&ghost.id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_delete_removes_game() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    let keep = store.create(new_game("Keep", 0)).unwrap();
    let drop = store.create(new_game("Drop", 1)).unwrap();

    store.delete(&drop.id).unwrap();

    let games = store.load_all().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].id, keep.id);
}

#[test]
fn test_record_view_dedups_per_client() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    let game = store.create(new_game("Celeste", 0)).unwrap();
    let now = Utc::now();

    assert!(store.record_view(&game.id, "a", now).unwrap().counted);
    let repeat = store.record_view(&game.id, "a", now).unwrap();
    assert!(!repeat.counted);
    assert_eq!(repeat.click_count, 1);
    assert_eq!(store.load_one(&game.id).unwrap().click_count, 1);
}

#[test]
fn test_malformed_file_is_a_serde_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(GAMES_FILE), "not json").unwrap();
    let store = JsonStore::open(dir.path(), true).unwrap();
    assert!(matches!(store.load_all(), Err(StoreError::Serde(_))));
}

#[test]
fn test_wire_format_field_names() {
    let dir = tempdir().unwrap();
    let mut store = JsonStore::open(dir.path(), true).unwrap();
    let game = store.create(new_game("Celeste", 0)).unwrap();
    store.record_view(&game.id, "a", Utc::now()).unwrap();

    let raw = fs::read_to_string(dir.path().join(GAMES_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let stored = &json[0];

    assert_eq!(stored["clickCount"], 1);
    assert_eq!(stored["viewedIPs"][0]["ip"], "a");
    assert!(stored.get("createdAt").is_some());
    assert!(stored.get("imageUrl").is_none());
}
