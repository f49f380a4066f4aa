//! In-memory stand-in for the remote tables.
//!
//! Behaves like the Supabase tables (upsert by `(user_id, id)`, per-user
//! isolation) and can be switched offline or slowed down to exercise the
//! failure paths of the sync adapter and the journal.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::services::remote::{FavoritesRemote, ReflectionsRemote};
use crate::types::errors::SyncError;
use crate::types::favorite::FavoriteItem;
use crate::types::reflection::ReflectionEntry;

#[derive(Default)]
pub struct InMemoryRemote {
    favorites: Mutex<BTreeMap<(String, String), FavoriteItem>>,
    reflections: Mutex<BTreeMap<String, ReflectionEntry>>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    upsert_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `RemoteUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delays every call, e.g. to trip the adapter's timeout.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Seeds or overwrites a favorite row directly, bypassing the adapter.
    pub fn put_favorite(&self, user_id: &str, item: FavoriteItem) {
        self.favorites
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((user_id.to_string(), item.id.clone()), item);
    }

    /// Rows of `user_id` ordered by id.
    pub fn favorites_of(&self, user_id: &str) -> Vec<FavoriteItem> {
        self.favorites
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub fn reflections_of(&self, user_id: &str) -> Vec<ReflectionEntry> {
        self.reflections
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), SyncError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteUnavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FavoritesRemote for InMemoryRemote {
    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<FavoriteItem>, SyncError> {
        self.gate().await?;
        Ok(self.favorites_of(user_id))
    }

    async fn upsert_favorites(&self, user_id: &str, items: &[FavoriteItem]) -> Result<(), SyncError> {
        self.gate().await?;
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.favorites.lock().unwrap_or_else(|p| p.into_inner());
        for item in items {
            rows.insert((user_id.to_string(), item.id.clone()), item.clone());
        }
        Ok(())
    }

    async fn delete_favorites(&self, user_id: &str, ids: &[String]) -> Result<(), SyncError> {
        self.gate().await?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.favorites.lock().unwrap_or_else(|p| p.into_inner());
        for id in ids {
            rows.remove(&(user_id.to_string(), id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReflectionsRemote for InMemoryRemote {
    async fn fetch_reflections(&self, user_id: &str) -> Result<Vec<ReflectionEntry>, SyncError> {
        self.gate().await?;
        Ok(self.reflections_of(user_id))
    }

    async fn insert_reflection(&self, entry: &ReflectionEntry) -> Result<(), SyncError> {
        self.gate().await?;
        self.reflections
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn update_reflection(&self, entry: &ReflectionEntry) -> Result<bool, SyncError> {
        self.gate().await?;
        let mut rows = self.reflections.lock().unwrap_or_else(|p| p.into_inner());
        match rows.get_mut(&entry.id) {
            Some(row) if row.user_id == entry.user_id => {
                *row = entry.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_reflection(&self, user_id: &str, id: &str) -> Result<bool, SyncError> {
        self.gate().await?;
        let mut rows = self.reflections.lock().unwrap_or_else(|p| p.into_inner());
        let owned = rows.get(id).is_some_and(|row| row.user_id == user_id);
        if owned {
            rows.remove(id);
        }
        Ok(owned)
    }
}
