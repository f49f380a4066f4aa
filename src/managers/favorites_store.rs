//! Favorites store for AstroLab.
//!
//! Implements `FavoritesStoreTrait`: the local-first collection of favorites
//! the UI renders from. Every mutation rewrites the full snapshot to
//! on-device storage before returning.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::SharedClock;
use crate::database::KeyValueStorage;
use crate::types::errors::FavoriteError;
use crate::types::favorite::{FavoriteCandidate, FavoriteFilter, FavoriteItem};

/// Storage key of the favorites snapshot.
pub const FAVORITES_STORAGE_KEY: &str = "astrolab.favorites.v1";

const SNAPSHOT_VERSION: u32 = 1;

/// Trait defining local favorites operations.
pub trait FavoritesStoreTrait {
    fn add(&mut self, candidate: FavoriteCandidate) -> Result<FavoriteItem, FavoriteError>;
    fn remove(&mut self, id: &str) -> Result<bool, FavoriteError>;
    fn toggle(&mut self, candidate: FavoriteCandidate) -> Result<bool, FavoriteError>;
    fn list(&self, filter: &FavoriteFilter) -> Vec<FavoriteItem>;
    fn contains(&self, id: &str) -> bool;
    fn get(&self, id: &str) -> Option<&FavoriteItem>;
    fn set_pinned(&mut self, id: &str, pinned: bool) -> Result<FavoriteItem, FavoriteError>;
    fn toggle_pin(&mut self, id: &str) -> Result<FavoriteItem, FavoriteError>;
    fn touch(&mut self, id: &str) -> Result<bool, FavoriteError>;
    fn replace_all(&mut self, items: Vec<FavoriteItem>) -> Result<(), FavoriteError>;
    fn prune_unused(&mut self, cutoff_millis: i64) -> Result<Vec<String>, FavoriteError>;
    fn clear(&mut self) -> Result<Vec<String>, FavoriteError>;
    fn clear_all(&mut self) -> Result<Vec<String>, FavoriteError>;
}

#[derive(Serialize, Deserialize)]
struct FavoritesSnapshot {
    version: u32,
    items: Vec<FavoriteItem>,
}

/// In-memory favorites backed by a persisted JSON snapshot.
///
/// On `PersistenceWriteFailure` the in-memory change is kept: the UI keeps
/// showing what the user did for the rest of the session.
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: SharedClock,
    items: HashMap<String, FavoriteItem>,
}

impl FavoritesStore {
    /// Loads the persisted snapshot; a missing or unreadable one yields an empty store.
    pub fn load(storage: Arc<dyn KeyValueStorage>, clock: SharedClock) -> Self {
        let items = match storage.load(FAVORITES_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<FavoritesSnapshot>(&raw) {
                Ok(snapshot) => snapshot
                    .items
                    .into_iter()
                    .map(|item| (item.id.clone(), item))
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "favorites snapshot is unreadable, starting empty");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(error = %e, "could not read favorites snapshot, starting empty");
                HashMap::new()
            }
        };
        debug!(count = items.len(), "favorites loaded");
        Self { storage, clock, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All favorites ordered by id, the shape pushed to the remote.
    pub fn snapshot(&self) -> Vec<FavoriteItem> {
        let mut items: Vec<FavoriteItem> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// Rewrites the snapshot. Called after every mutation and at shutdown.
    pub fn flush(&self) -> Result<(), FavoriteError> {
        let snapshot = FavoritesSnapshot {
            version: SNAPSHOT_VERSION,
            items: self.snapshot(),
        };
        let json = serde_json::to_string(&snapshot)
            .map_err(|e| FavoriteError::PersistenceWriteFailure(e.to_string()))?;
        self.storage.save(FAVORITES_STORAGE_KEY, &json).map_err(|e| {
            warn!(error = %e, "favorites snapshot write failed");
            FavoriteError::from(e)
        })
    }

    fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Next `last_used_at` for an existing record; never moves backwards.
    fn bump(&self, previous: i64) -> i64 {
        self.now().max(previous)
    }

    fn remove_where<F>(&mut self, predicate: F) -> Result<Vec<String>, FavoriteError>
    where
        F: Fn(&FavoriteItem) -> bool,
    {
        let mut removed: Vec<String> = self
            .items
            .values()
            .filter(|item| predicate(item))
            .map(|item| item.id.clone())
            .collect();
        removed.sort();
        if removed.is_empty() {
            return Ok(removed);
        }
        for id in &removed {
            self.items.remove(id);
        }
        self.flush()?;
        Ok(removed)
    }
}

impl FavoritesStoreTrait for FavoritesStore {
    /// Inserts the candidate, or refreshes `last_used_at` when its id is already stored.
    fn add(&mut self, candidate: FavoriteCandidate) -> Result<FavoriteItem, FavoriteError> {
        candidate.validate()?;
        let id = candidate.id();

        let item = match self.items.get(&id).map(|existing| existing.last_used_at) {
            Some(previous) => {
                let last_used_at = self.bump(previous);
                let item = self
                    .items
                    .get_mut(&id)
                    .ok_or_else(|| FavoriteError::NotFound(id.clone()))?;
                item.last_used_at = last_used_at;
                debug!(id = %id, "favorite already stored, refreshed");
                item.clone()
            }
            None => {
                let item = candidate.into_item(self.now());
                self.items.insert(id.clone(), item.clone());
                debug!(id = %id, "favorite added");
                item
            }
        };

        self.flush()?;
        Ok(item)
    }

    /// Removes a favorite. Returns whether anything was removed; absent ids are not an error.
    fn remove(&mut self, id: &str) -> Result<bool, FavoriteError> {
        if self.items.remove(id).is_none() {
            return Ok(false);
        }
        debug!(id = %id, "favorite removed");
        self.flush()?;
        Ok(true)
    }

    /// Removes the favorite if stored, adds it otherwise. Returns the new membership.
    fn toggle(&mut self, candidate: FavoriteCandidate) -> Result<bool, FavoriteError> {
        candidate.validate()?;
        let id = candidate.id();
        if self.contains(&id) {
            self.remove(&id)?;
            Ok(false)
        } else {
            self.add(candidate)?;
            Ok(true)
        }
    }

    /// Pinned first, then most recently used. Ties fall back to title.
    fn list(&self, filter: &FavoriteFilter) -> Vec<FavoriteItem> {
        let mut items: Vec<FavoriteItem> = self
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.last_used_at.cmp(&a.last_used_at))
                .then_with(|| a.title.cmp(&b.title))
        });
        items
    }

    fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    fn get(&self, id: &str) -> Option<&FavoriteItem> {
        self.items.get(id)
    }

    fn set_pinned(&mut self, id: &str, pinned: bool) -> Result<FavoriteItem, FavoriteError> {
        let previous = self
            .items
            .get(id)
            .map(|item| item.last_used_at)
            .ok_or_else(|| FavoriteError::NotFound(id.to_string()))?;
        let last_used_at = self.bump(previous);

        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| FavoriteError::NotFound(id.to_string()))?;
        item.pinned = pinned;
        item.last_used_at = last_used_at;
        let item = item.clone();

        self.flush()?;
        Ok(item)
    }

    fn toggle_pin(&mut self, id: &str) -> Result<FavoriteItem, FavoriteError> {
        let pinned = self
            .items
            .get(id)
            .map(|item| item.pinned)
            .ok_or_else(|| FavoriteError::NotFound(id.to_string()))?;
        self.set_pinned(id, !pinned)
    }

    /// Marks a favorite as just used (e.g. after navigating to it).
    fn touch(&mut self, id: &str) -> Result<bool, FavoriteError> {
        let Some(previous) = self.items.get(id).map(|item| item.last_used_at) else {
            return Ok(false);
        };
        let last_used_at = self.bump(previous);
        if let Some(item) = self.items.get_mut(id) {
            item.last_used_at = last_used_at;
        }
        self.flush()?;
        Ok(true)
    }

    /// Swaps in a whole collection, e.g. the output of a merge.
    fn replace_all(&mut self, items: Vec<FavoriteItem>) -> Result<(), FavoriteError> {
        self.items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        debug!(count = self.items.len(), "favorites replaced");
        self.flush()
    }

    /// Automatic cleanup: drops unpinned favorites not used since `cutoff_millis`.
    fn prune_unused(&mut self, cutoff_millis: i64) -> Result<Vec<String>, FavoriteError> {
        self.remove_where(|item| !item.pinned && item.last_used_at < cutoff_millis)
    }

    /// Removes every unpinned favorite.
    fn clear(&mut self) -> Result<Vec<String>, FavoriteError> {
        self.remove_where(|item| !item.pinned)
    }

    fn clear_all(&mut self) -> Result<Vec<String>, FavoriteError> {
        self.remove_where(|_| true)
    }
}
