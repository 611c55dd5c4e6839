use std::fs;
use std::io::Cursor;

use dialogue_skipper::config::{ConfigStore, FileConfigStore, Settings};
use dialogue_skipper::console::Console;
use dialogue_skipper::input::MockClickerFactory;
use dialogue_skipper::menu::{Menu, MenuOutcome};

#[test]
fn settings_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));

    let settings = Settings {
        start_stop_key: "f9".into(),
        pause_key: "space".into(),
        emergency_stop_key: "esc".into(),
        click_interval: 0.25,
        auto_stop_time: 300.0,
        click_x: 960,
        click_y: 540,
        show_click_counter: false,
        show_elapsed_time: true,
    };
    store.save(&settings).unwrap();

    assert_eq!(store.load(), settings);
}

#[test]
fn file_uses_flat_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let store = FileConfigStore::with_path(&path);
    store.save(&Settings::default()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let obj = value.as_object().unwrap();
    for field in [
        "start_stop_key",
        "pause_key",
        "emergency_stop_key",
        "click_interval",
        "auto_stop_time",
        "click_x",
        "click_y",
        "show_click_counter",
        "show_elapsed_time",
    ] {
        assert!(obj.contains_key(field), "missing {field}");
    }
    assert_eq!(obj.len(), 9);
    assert_eq!(obj["start_stop_key"], "f6");
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "click_x": 100, "pause_key": "f10" }"#).unwrap();

    let settings = FileConfigStore::with_path(&path).load();
    assert_eq!(settings.click_x, 100);
    assert_eq!(settings.pause_key, "f10");
    assert_eq!(settings.click_y, Settings::default().click_y);
    assert_eq!(settings.click_interval, Settings::default().click_interval);
}

#[test]
fn corrupt_file_is_replaced_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let store = FileConfigStore::with_path(&path);
    assert_eq!(store.load(), Settings::default());

    let rewritten: Settings = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(rewritten, Settings::default());
}

#[test]
fn menu_edits_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let store = FileConfigStore::with_path(&path);
    let factory = MockClickerFactory::new();

    let mut settings = store.load();
    let mut console = Console::new(Vec::new());
    // preset 1280x720, then exit
    let outcome = Menu::new(Cursor::new("2\n1\n6\n"), &mut console, &store, &factory)
        .run(&mut settings)
        .unwrap();
    assert_eq!(outcome, MenuOutcome::Exit);

    let reloaded = FileConfigStore::with_path(&path).load();
    assert_eq!((reloaded.click_x, reloaded.click_y), (960, 540));
    assert_eq!(reloaded, settings);
}
