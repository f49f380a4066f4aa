//! Seams to the remote per-user tables.
//!
//! `SupabaseClient` talks to the real backend; `testing::InMemoryRemote`
//! stands in for it in tests.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::errors::SyncError;
use crate::types::favorite::FavoriteItem;
use crate::types::reflection::ReflectionEntry;

/// Row-per-favorite table keyed by `(user_id, id)`.
#[async_trait]
pub trait FavoritesRemote: Send + Sync {
    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<FavoriteItem>, SyncError>;
    /// Inserts or overwrites the given rows; rows not listed are left alone.
    async fn upsert_favorites(&self, user_id: &str, items: &[FavoriteItem]) -> Result<(), SyncError>;
    async fn delete_favorites(&self, user_id: &str, ids: &[String]) -> Result<(), SyncError>;
}

/// Row-per-reflection table keyed by `id`, scoped to `user_id`.
#[async_trait]
pub trait ReflectionsRemote: Send + Sync {
    async fn fetch_reflections(&self, user_id: &str) -> Result<Vec<ReflectionEntry>, SyncError>;
    async fn insert_reflection(&self, entry: &ReflectionEntry) -> Result<(), SyncError>;
    /// Returns `false` when no row matched.
    async fn update_reflection(&self, entry: &ReflectionEntry) -> Result<bool, SyncError>;
    /// Returns `false` when no row matched.
    async fn delete_reflection(&self, user_id: &str, id: &str) -> Result<bool, SyncError>;
}

/// Bounds a remote call; running past `limit` counts as `RemoteUnavailable`.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T, SyncError>
where
    F: Future<Output = Result<T, SyncError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::RemoteUnavailable(format!(
            "{} timed out after {} ms",
            operation,
            limit.as_millis()
        ))),
    }
}
