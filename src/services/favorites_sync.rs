//! Remote sync for the favorites store.
//!
//! Pushes are best-effort: debounced onto a background task, never awaited
//! by the UI path and never rolled back on failure. Reconcile pulls the
//! remote rows, merges them last-write-wins with the local snapshot and
//! writes the result to both sides.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use crate::services::merge_resolver::merge_favorites;
use crate::services::remote::{with_timeout, FavoritesRemote};
use crate::types::errors::{FavoriteError, SyncError};
use crate::types::favorite::FavoriteItem;

/// Timing knobs for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub request_timeout: Duration,
    pub push_debounce: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            push_debounce: Duration::from_millis(800),
        }
    }
}

/// What a reconcile did.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncReport {
    pub pulled: usize,
    pub total: usize,
    pub local_only: usize,
    pub remote_only: usize,
    pub local_wins: usize,
    pub remote_wins: usize,
    /// False when the merged result could not be written back remotely.
    /// True without a write when the remote already held it.
    pub pushed: bool,
    /// False when the merged result could not be written on this device.
    pub persisted: bool,
}

type Removals = Arc<Mutex<BTreeSet<String>>>;

/// Remote side of the favorites store for the signed-in user.
pub struct FavoritesSync {
    remote: Arc<dyn FavoritesRemote>,
    options: SyncOptions,
    user_id: Option<String>,
    /// Ids removed locally and not yet deleted remotely.
    pending_removals: Removals,
    pending_push: Option<JoinHandle<()>>,
}

fn lock(removals: &Mutex<BTreeSet<String>>) -> MutexGuard<'_, BTreeSet<String>> {
    removals.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FavoritesSync {
    pub fn new(remote: Arc<dyn FavoritesRemote>, options: SyncOptions) -> Self {
        Self {
            remote,
            options,
            user_id: None,
            pending_removals: Arc::new(Mutex::new(BTreeSet::new())),
            pending_push: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Switches the signed-in user. Work queued for a previous user is dropped.
    pub fn set_user(&mut self, user_id: Option<String>) {
        if self.user_id == user_id {
            return;
        }
        if let Some(handle) = self.pending_push.take() {
            handle.abort();
        }
        lock(&self.pending_removals).clear();
        debug!(signed_in = user_id.is_some(), "favorites sync user changed");
        self.user_id = user_id;
    }

    /// Records a local removal so the next push deletes the remote row.
    pub fn note_removed(&self, id: &str) {
        if self.user_id.is_some() {
            lock(&self.pending_removals).insert(id.to_string());
        }
    }

    /// Cancels a pending remote deletion after the id was re-added.
    pub fn note_added(&self, id: &str) {
        lock(&self.pending_removals).remove(id);
    }

    pub fn pending_removals(&self) -> Vec<String> {
        lock(&self.pending_removals).iter().cloned().collect()
    }

    fn require_user(&self) -> Result<&str, SyncError> {
        self.user_id.as_deref().ok_or(SyncError::Unauthenticated)
    }

    /// Fetches every remote favorite of the signed-in user.
    pub async fn pull(&self) -> Result<Vec<FavoriteItem>, SyncError> {
        let user_id = self.require_user()?;
        with_timeout(
            self.options.request_timeout,
            "favorites pull",
            self.remote.fetch_favorites(user_id),
        )
        .await
    }

    /// Upserts `snapshot` and deletes locally removed ids, waiting for the result.
    pub async fn push(&self, snapshot: &[FavoriteItem]) -> Result<(), SyncError> {
        let user_id = self.require_user()?;
        push_snapshot(
            self.remote.as_ref(),
            user_id,
            snapshot,
            &self.pending_removals,
            self.options.request_timeout,
        )
        .await
    }

    /// Queues a debounced background push of `snapshot`.
    ///
    /// A newer call replaces a push that has not fired yet. Does nothing when
    /// signed out or outside a tokio runtime.
    pub fn schedule_push(&mut self, snapshot: Vec<FavoriteItem>) {
        let Some(user_id) = self.user_id.clone() else {
            debug!("signed out, favorites stay local");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, favorites push skipped");
            return;
        };
        if let Some(handle) = self.pending_push.take() {
            handle.abort();
        }

        let remote = Arc::clone(&self.remote);
        let removals = Arc::clone(&self.pending_removals);
        let SyncOptions { request_timeout, push_debounce } = self.options;

        self.pending_push = Some(runtime.spawn(async move {
            if !push_debounce.is_zero() {
                tokio::time::sleep(push_debounce).await;
            }
            match push_snapshot(remote.as_ref(), &user_id, &snapshot, &removals, request_timeout).await {
                Ok(()) => debug!(count = snapshot.len(), "favorites pushed"),
                Err(e) => warn!(error = %e, "favorites push failed, keeping local state"),
            }
        }));
    }

    /// Waits for a queued push to finish. Used at shutdown and in tests.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending_push.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "favorites push task failed");
                }
            }
        }
    }

    /// Pull, merge, apply locally, push back.
    ///
    /// On `RemoteUnavailable` nothing changes and the device keeps running on
    /// local state until the next successful reconcile.
    pub async fn reconcile(&mut self, store: &mut FavoritesStore) -> Result<SyncReport, SyncError> {
        self.flush().await;

        let mut remote = match self.pull().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "favorites pull failed, using local state only");
                return Err(e);
            }
        };
        let pulled = remote.len();

        // Rows this device deleted but could not delete remotely yet must not come back.
        {
            let removals = lock(&self.pending_removals);
            remote.retain(|item| !removals.contains(&item.id));
        }

        let outcome = merge_favorites(&store.snapshot(), &remote);

        let persisted = match store.replace_all(outcome.items.clone()) {
            Ok(()) => true,
            Err(FavoriteError::PersistenceWriteFailure(msg)) => {
                warn!(error = %msg, "merged favorites kept in memory only");
                false
            }
            Err(e) => {
                warn!(error = %e, "could not apply merged favorites");
                false
            }
        };

        let deletions_pending = !lock(&self.pending_removals).is_empty();
        let pushed = if outcome.remote_is_stale() || deletions_pending {
            match self.push(&outcome.items).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "merged favorites not pushed");
                    false
                }
            }
        } else {
            debug!("remote favorites already current, push skipped");
            true
        };

        let report = SyncReport {
            pulled,
            total: outcome.items.len(),
            local_only: outcome.local_only,
            remote_only: outcome.remote_only,
            local_wins: outcome.local_wins,
            remote_wins: outcome.remote_wins,
            pushed,
            persisted,
        };
        info!(
            pulled = report.pulled,
            total = report.total,
            remote_wins = report.remote_wins,
            "favorites reconciled"
        );
        Ok(report)
    }
}

/// Removal ids taken out of the pending set for one push attempt.
///
/// Put back on drop unless the push succeeded, so a failed or aborted push
/// leaves them for the next one.
struct InFlightRemovals<'a> {
    pending: &'a Mutex<BTreeSet<String>>,
    ids: Vec<String>,
    delivered: bool,
}

impl Drop for InFlightRemovals<'_> {
    fn drop(&mut self) {
        if !self.delivered && !self.ids.is_empty() {
            lock(self.pending).extend(self.ids.drain(..));
        }
    }
}

async fn push_snapshot(
    remote: &dyn FavoritesRemote,
    user_id: &str,
    snapshot: &[FavoriteItem],
    removals: &Mutex<BTreeSet<String>>,
    limit: Duration,
) -> Result<(), SyncError> {
    let mut in_flight = {
        let taken = std::mem::take(&mut *lock(removals));
        InFlightRemovals {
            pending: removals,
            // A re-added id must not be deleted remotely.
            ids: taken
                .into_iter()
                .filter(|id| !snapshot.iter().any(|item| &item.id == id))
                .collect(),
            delivered: false,
        }
    };

    if !snapshot.is_empty() {
        with_timeout(limit, "favorites upsert", remote.upsert_favorites(user_id, snapshot)).await?;
    }
    if !in_flight.ids.is_empty() {
        with_timeout(
            limit,
            "favorites delete",
            remote.delete_favorites(user_id, &in_flight.ids),
        )
        .await?;
    }
    in_flight.delivered = true;
    Ok(())
}
