// SPDX-License-Identifier: MPL-2.0

//! Gallery persistence and selection

mod common;

use camera_booth::constants::GALLERY_STORAGE_KEY;
use camera_booth::storage::{FileStore, KeyValueStore, MemoryStore};
use camera_booth::{Config, GalleryStore, MediaKind, MediaRecord, Message};
use common::{FakeBackend, QUIET, active_runtime, runtime_with_store};

fn sample(n: usize) -> Vec<MediaRecord> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                MediaRecord::photo("image/jpeg", format!("photo-{}", i).as_bytes())
            } else {
                MediaRecord::video("video/x-motion-jpeg", format!("video-{}", i).as_bytes())
            }
        })
        .collect()
}

fn round_trip(n: usize) {
    let store = MemoryStore::new();
    let mut gallery = GalleryStore::load(Box::new(store.clone()));
    for record in sample(n) {
        gallery.add(record).unwrap();
    }

    let reloaded = GalleryStore::load(Box::new(store));
    assert_eq!(reloaded.records(), gallery.records());
    assert_eq!(reloaded.len(), n);
}

#[test]
fn test_round_trip_empty() {
    round_trip(0);
}

#[test]
fn test_round_trip_single() {
    round_trip(1);
}

#[test]
fn test_round_trip_many() {
    round_trip(7);
}

#[test]
fn test_add_prepends() {
    let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()));
    let records = sample(3);
    for record in records.clone() {
        gallery.add(record).unwrap();
    }

    let ids: Vec<_> = gallery.records().iter().map(|r| r.id.clone()).collect();
    let expected: Vec<_> = records.iter().rev().map(|r| r.id.clone()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_every_mutation_is_persisted() {
    let store = MemoryStore::new();
    let mut gallery = GalleryStore::load(Box::new(store.clone()));
    let record = MediaRecord::photo("image/png", b"png");
    let id = record.id.clone();

    gallery.add(record).unwrap();
    let persisted = store.get(GALLERY_STORAGE_KEY).unwrap().unwrap();
    assert!(persisted.contains(&id));
    assert!(persisted.contains("\"type\":\"photo\""));

    gallery.delete(&id).unwrap();
    assert_eq!(store.get(GALLERY_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_delete_is_idempotent() {
    let store = MemoryStore::new();
    let mut gallery = GalleryStore::load(Box::new(store.clone()));
    for record in sample(3) {
        gallery.add(record).unwrap();
    }
    let id = gallery.records()[1].id.clone();

    assert!(gallery.delete(&id).unwrap());
    let after_first: Vec<_> = gallery.records().to_vec();
    let persisted_first = store.get(GALLERY_STORAGE_KEY).unwrap();

    assert!(!gallery.delete(&id).unwrap());
    assert_eq!(gallery.records(), after_first.as_slice());
    assert_eq!(store.get(GALLERY_STORAGE_KEY).unwrap(), persisted_first);
    assert_eq!(gallery.len(), 2);
}

#[test]
fn test_deleting_selected_record_clears_selection() {
    let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()));
    let record = MediaRecord::photo("image/jpeg", b"a");
    let id = record.id.clone();
    gallery.add(record).unwrap();

    gallery.select(Some(&id));
    assert!(gallery.selected().is_some());

    gallery.delete(&id).unwrap();
    assert!(gallery.selected().is_none());
}

#[test]
fn test_malformed_data_loads_empty() {
    for raw in ["not json", "{\"id\": 1}", "[{\"id\": \"x\"}]", ""] {
        let store = MemoryStore::with_value(GALLERY_STORAGE_KEY, raw);
        let gallery = GalleryStore::load(Box::new(store));
        assert!(gallery.is_empty(), "{:?} should load as empty", raw);
    }
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut gallery = GalleryStore::load(Box::new(FileStore::new(dir.path())));
    for record in sample(3) {
        gallery.add(record).unwrap();
    }

    let reloaded = GalleryStore::load(Box::new(FileStore::new(dir.path())));
    assert_eq!(reloaded.records(), gallery.records());
    assert_eq!(reloaded.records()[0].kind, MediaKind::Photo);
}

#[tokio::test]
async fn test_gallery_loaded_at_startup() {
    let store = MemoryStore::new();
    {
        let mut gallery = GalleryStore::load(Box::new(store.clone()));
        for record in sample(2) {
            gallery.add(record).unwrap();
        }
    }

    let backend = FakeBackend::new();
    let (mut runtime, _) = runtime_with_store(&backend, Config::default(), store, None);
    runtime.settle(QUIET).await;

    assert_eq!(runtime.app().view().gallery.len(), 2);
}

#[tokio::test]
async fn test_select_and_delete_through_messages() {
    let backend = FakeBackend::new();
    let (mut runtime, store) = active_runtime(&backend, Config::default()).await;

    runtime.dispatch(Message::CapturePhoto);
    runtime.settle(QUIET).await;
    let id = runtime.app().view().gallery[0].id.clone();

    runtime.dispatch(Message::SelectMedia(Some(id.clone())));
    assert_eq!(
        runtime.app().view().selection.map(|r| r.id),
        Some(id.clone())
    );

    runtime.dispatch(Message::DeleteMedia(id.clone()));
    let view = runtime.app().view();
    assert!(view.selection.is_none());
    assert!(view.gallery.is_empty());
    assert_eq!(store.get(GALLERY_STORAGE_KEY).unwrap().as_deref(), Some("[]"));

    runtime.dispatch(Message::SelectMedia(None));
    assert!(runtime.app().view().selection.is_none());
}
