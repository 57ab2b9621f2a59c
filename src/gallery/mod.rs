// SPDX-License-Identifier: GPL-3.0-only

//! Media gallery
//!
//! Newest-first collection of captured media, persisted as a JSON array under
//! a single key. Every mutation rewrites the whole collection before it
//! returns; a failed write rolls the in-memory collection back so memory and
//! storage never diverge.

mod record;

pub use record::{DataUrl, MediaKind, MediaRecord, PayloadError};

use crate::constants::GALLERY_STORAGE_KEY;
use crate::errors::{StorageError, StorageResult};
use crate::storage::KeyValueStore;
use tracing::{debug, info, warn};

/// Persisted gallery with an in-memory selection
pub struct GalleryStore {
    store: Box<dyn KeyValueStore>,
    records: Vec<MediaRecord>,
    selected_id: Option<String>,
}

impl GalleryStore {
    /// Load the persisted collection
    ///
    /// A missing, unreadable or corrupt value yields an empty gallery.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let records = match Self::read(store.as_ref()) {
            Ok(records) => {
                info!(count = records.len(), "Gallery loaded");
                records
            }
            Err(e) => {
                warn!(error = %e, "Failed to load gallery, starting empty");
                Vec::new()
            }
        };

        Self {
            store,
            records,
            selected_id: None,
        }
    }

    fn read(store: &dyn KeyValueStore) -> StorageResult<Vec<MediaRecord>> {
        let Some(raw) = store.get(GALLERY_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key: GALLERY_STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    fn persist(&mut self) -> StorageResult<()> {
        let json = serde_json::to_string(&self.records).map_err(|e| StorageError::WriteFailed {
            key: GALLERY_STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(GALLERY_STORAGE_KEY, &json)?;
        debug!(count = self.records.len(), size = json.len(), "Gallery persisted");
        Ok(())
    }

    /// Prepend a record and persist
    pub fn add(&mut self, record: MediaRecord) -> StorageResult<()> {
        let id = record.id.clone();
        self.records.insert(0, record);

        if let Err(e) = self.persist() {
            self.records.remove(0);
            return Err(e);
        }

        info!(id = %id, count = self.records.len(), "Media added to gallery");
        Ok(())
    }

    /// Remove the record with `id`
    ///
    /// Returns whether a record was removed. Deleting an absent id changes
    /// nothing and writes nothing.
    pub fn delete(&mut self, id: &str) -> StorageResult<bool> {
        let Some(index) = self.records.iter().position(|r| r.id == id) else {
            debug!(id, "Delete of unknown gallery record ignored");
            return Ok(false);
        };

        let removed = self.records.remove(index);
        if let Err(e) = self.persist() {
            self.records.insert(index, removed);
            return Err(e);
        }

        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }

        info!(id, count = self.records.len(), "Media deleted from gallery");
        Ok(true)
    }

    /// Set or clear the selection
    ///
    /// Selecting an id that is not in the gallery clears the selection.
    pub fn select(&mut self, id: Option<&str>) {
        self.selected_id = id
            .filter(|id| self.records.iter().any(|r| r.id == *id))
            .map(str::to_string);
    }

    pub fn selected(&self) -> Option<&MediaRecord> {
        let id = self.selected_id.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records, newest first
    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Debug for GalleryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryStore")
            .field("records", &self.records.len())
            .field("selected_id", &self.selected_id)
            .finish()
    }
}
