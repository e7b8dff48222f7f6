//! Integration tests for group files and settings files on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;
use zkanji_groups::{GroupError, GroupSettings, Groups};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sample() -> Groups {
    let mut groups = Groups::new();
    let words = groups.words_mut();
    let root = words.root();
    let n5 = words.group_from_encoded_name(root, "JLPT/N5", true).unwrap();
    words.group_mut(n5).unwrap().add_many(&[12, 7, 40]);
    words.group_from_encoded_name(root, "JLPT/N4", true).unwrap();
    words.set_last_selected(Some(n5));

    let kanji = groups.kanji_mut();
    let root = kanji.root();
    let radicals = kanji.group_from_encoded_name(root, "Radicals", true).unwrap();
    kanji.group_mut(radicals).unwrap().add_many(&[3, 2, 1]);
    groups
}

fn write_legacy(path: &Path) {
    let mut bytes = b"zkgr".to_vec();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    // Words: one group "Food" holding 8, 9.
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.push(4);
    bytes.extend_from_slice(b"Food");
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&8i32.to_le_bytes());
    bytes.extend_from_slice(&9i32.to_le_bytes());
    // Kanji: no groups.
    bytes.extend_from_slice(&0u16.to_le_bytes());
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_save_and_load_file() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("groups.zkg");

    sample().save_file(&path).unwrap();
    assert!(path.exists());

    let mut loaded = Groups::new();
    loaded.load_file(&path).unwrap();

    let words = loaded.words();
    let root = words.root();
    let n5 = words.find_group_by_encoded_name(root, "JLPT/N5").unwrap();
    assert_eq!(words.group(n5).unwrap().indexes(), &[12, 7, 40]);
    assert!(words.find_group_by_encoded_name(root, "JLPT/N4").is_some());
    assert_eq!(words.last_selected(), Some(n5));
    assert_eq!(words.word_groups(7), &[n5]);

    let kanji = loaded.kanji();
    let radicals = kanji.find_group_by_encoded_name(kanji.root(), "Radicals").unwrap();
    assert_eq!(kanji.group(radicals).unwrap().indexes(), &[3, 2, 1]);
}

#[test]
fn test_load_file_announces_reset() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("groups.zkg");
    sample().save_file(&path).unwrap();

    let mut groups = Groups::new();
    let resets = Arc::new(Mutex::new(0));
    let counter = resets.clone();
    groups
        .words()
        .signals()
        .groups_reset
        .connect(move |_| *counter.lock() += 1);

    groups.load_file(&path).unwrap();
    assert_eq!(*resets.lock(), 1);
    assert_eq!(groups.words().group_count(), 2);
}

#[test]
fn test_load_legacy_file() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.zkg");
    write_legacy(&path);

    let mut groups = Groups::new();
    groups.load_file(&path).unwrap();

    let words = groups.words();
    assert_eq!(words.category_count(), 0);
    let food = words.group_at(words.root(), 0).unwrap();
    assert_eq!(words.full_encoded_name(food.into()).as_deref(), Some("Food"));
    assert_eq!(words.group(food).unwrap().indexes(), &[8, 9]);
    assert!(groups.kanji().is_empty());
}

#[test]
fn test_missing_file_keeps_groups() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut groups = sample();

    let result = groups.load_file(dir.path().join("missing.zkg"));
    assert!(matches!(result, Err(GroupError::Io(_))));
    assert_eq!(groups.words().group_count(), 2);
}

#[test]
fn test_save_replaces_existing_file() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("groups.zkg");
    fs::write(&path, b"stale").unwrap();

    Groups::new().save_file(&path).unwrap();
    let mut loaded = sample();
    loaded.load_file(&path).unwrap();
    assert!(loaded.words().is_empty());

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path() != path)
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_settings_file_round_trip() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("groups.toml");

    let settings = GroupSettings {
        remember_last: false,
        hide_empty_categories: true,
        ..GroupSettings::default()
    };
    settings.save(&path).unwrap();
    assert_eq!(GroupSettings::load(&path).unwrap(), settings);

    let mut groups = sample();
    groups.apply_settings(&settings);
    assert!(!groups.words().remember_last());
}
