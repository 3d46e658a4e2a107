use std::{fs, sync::Arc};

use tempfile::TempDir;
use tomidoro::{
    alarm::AlarmSource,
    config::{AlarmId, Settings, SettingsStore, MAX_ALARM_BYTES},
    error::ImportError,
};

fn store_in(dir: &TempDir) -> SettingsStore {
    SettingsStore::open(dir.path().join("nested").join("settings.toml"))
}

#[test]
fn missing_file_loads_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.settings(), &Settings::default());
}

#[test]
fn malformed_file_loads_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "selected_alarm = [[[ nope").unwrap();
    assert_eq!(Settings::load(&path), Settings::default());
    assert!(Settings::try_load(&path).is_err());

    fs::write(&path, "[[custom_alarms]]\nid = \"1\"\nname = \"x\"\ndata = \"not base64!\"\n").unwrap();
    assert_eq!(Settings::load(&path), Settings::default());
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    let mut settings = Settings::new();
    let id = settings
        .add_custom_alarm("rooster.mp3".to_string(), (0..=255).collect())
        .unwrap();
    settings
        .add_custom_alarm("gong.wav".to_string(), vec![7; 1000])
        .unwrap();
    assert!(settings.select_alarm(id));

    settings.save(&path).unwrap();
    assert_eq!(Settings::load(&path), settings);
}

#[test]
fn every_change_is_persisted() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    let id = store
        .add_custom_alarm("bell.ogg".to_string(), vec![1, 2, 3])
        .unwrap();
    assert!(store.select_alarm(id.clone()));

    let reopened = SettingsStore::open(store.path().to_path_buf());
    assert_eq!(reopened.settings().selected_alarm, id);
    assert_eq!(reopened.settings().custom_alarms.len(), 1);
    assert_eq!(
        reopened.selected_source(),
        AlarmSource::Custom {
            name: "bell.ogg".to_string(),
            data: Arc::from(vec![1_u8, 2, 3]),
        }
    );
}

#[test]
fn oversized_import_is_rejected_without_changes() {
    let dir = TempDir::new().unwrap();
    let sound = dir.path().join("huge.wav");
    fs::write(&sound, vec![0_u8; 3 * 1024 * 1024]).unwrap();

    let mut store = store_in(&dir);
    let err = store.import_file(&sound).unwrap_err();
    assert!(matches!(
        err,
        ImportError::TooLarge { size, limit: MAX_ALARM_BYTES } if size == 3 * 1024 * 1024
    ));
    assert!(store.settings().custom_alarms.is_empty());
    assert!(!store.path().exists());
}

#[test]
fn import_names_alarm_after_file() {
    let dir = TempDir::new().unwrap();
    let sound = dir.path().join("morning birds.mp3");
    fs::write(&sound, b"ID3fake").unwrap();

    let mut store = store_in(&dir);
    let id = store.import_file(&sound).unwrap();
    let alarm = store.settings().custom_alarm(&id).unwrap();
    assert_eq!(alarm.name, "morning birds.mp3");
    assert_eq!(&alarm.data[..], b"ID3fake");
}

#[test]
fn import_of_missing_file_reports_read_error() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    let err = store.import_file(&dir.path().join("gone.mp3")).unwrap_err();
    assert!(matches!(err, ImportError::Read { .. }));
}

#[test]
fn deleting_selected_alarm_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    let kept = store.add_custom_alarm("a.mp3".to_string(), vec![1]).unwrap();
    let selected = store.add_custom_alarm("b.mp3".to_string(), vec![2]).unwrap();
    store.select_alarm(selected.clone());

    store.remove_custom_alarm(&kept);
    assert_eq!(store.settings().selected_alarm, selected);

    store.remove_custom_alarm(&selected);
    assert!(store.settings().selected_alarm.is_default());
    assert_eq!(store.selected_source(), AlarmSource::Builtin);

    let reopened = SettingsStore::open(store.path().to_path_buf());
    assert_eq!(reopened.settings().selected_alarm, AlarmId::default());
    assert!(reopened.settings().custom_alarms.is_empty());
}
