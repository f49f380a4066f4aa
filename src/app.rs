//! App Core for AstroLab.
//!
//! Root composition: owns the database, the favorites store, the sync
//! adapter, the reflections journal and the current auth session. Built
//! once by the binary and passed down explicitly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::clock::{SharedClock, SystemClock};
use crate::database::connection::Database;
use crate::database::KeyValueStorage;
use crate::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use crate::services::favorites_sync::{FavoritesSync, SyncOptions, SyncReport};
use crate::services::reflection_journal::ReflectionJournal;
use crate::services::remote::{FavoritesRemote, ReflectionsRemote};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::supabase_client::SupabaseClient;
use crate::types::errors::{AuthError, FavoriteError, ReflectionError, SyncError};
use crate::types::favorite::{FavoriteCandidate, FavoriteItem};
use crate::types::reflection::{ReflectionDraft, ReflectionEntry, ReflectionFilter};
use crate::types::session::AuthSession;
use crate::types::settings::SyncSettings;

/// A local change that took effect, plus a notice when it may not survive a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    pub warning: Option<String>,
}

/// Result of starring or unstarring content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ToggleResult {
    pub is_favorite: bool,
    /// Set when the change could not be written to disk.
    pub warning: Option<String>,
}

/// Result of signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: String,
    /// `None` when the remote could not be reached; favorites stay local-only.
    pub sync: Option<SyncReport>,
}

/// Maps a storage failure to a warning when the in-memory change still stands.
fn settle<T>(
    result: Result<T, FavoriteError>,
    recover: impl FnOnce() -> Option<T>,
) -> Result<Committed<T>, FavoriteError> {
    match result {
        Ok(value) => Ok(Committed { value, warning: None }),
        Err(FavoriteError::PersistenceWriteFailure(msg)) => match recover() {
            Some(value) => {
                warn!(error = %msg, "favorite change kept in memory only");
                Ok(Committed {
                    value,
                    warning: Some(FavoriteError::PersistenceWriteFailure(msg).to_string()),
                })
            }
            None => Err(FavoriteError::PersistenceWriteFailure(msg)),
        },
        Err(e) => Err(e),
    }
}

/// Central application struct.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub favorites: FavoritesStore,
    sync: Option<FavoritesSync>,
    journal: Option<ReflectionJournal>,
    supabase: Option<Arc<SupabaseClient>>,
    session: AuthSession,
}

impl App {
    /// Opens the database at `db_path` and wires the Supabase backend when configured.
    pub fn open(settings_engine: SettingsEngine, db_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Arc::new(Database::open(db_path)?);

        let sync_settings = settings_engine.effective_settings().sync;
        let supabase = if sync_settings.is_configured() {
            let url = sync_settings.supabase_url.as_deref().unwrap_or_default();
            let key = sync_settings.anon_key.as_deref().unwrap_or_default();
            match SupabaseClient::new(url, key, Duration::from_secs(sync_settings.request_timeout_secs)) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "remote sync disabled");
                    None
                }
            }
        } else {
            info!("remote sync not configured, favorites are local-only");
            None
        };

        let favorites_remote = supabase.clone().map(|c| c as Arc<dyn FavoritesRemote>);
        let reflections_remote = supabase.clone().map(|c| c as Arc<dyn ReflectionsRemote>);

        let mut app = Self::assemble(
            db,
            settings_engine,
            favorites_remote,
            reflections_remote,
            Arc::new(SystemClock),
        );
        app.supabase = supabase;
        Ok(app)
    }

    /// Builds the app around explicit collaborators.
    pub fn assemble(
        db: Arc<Database>,
        settings_engine: SettingsEngine,
        favorites_remote: Option<Arc<dyn FavoritesRemote>>,
        reflections_remote: Option<Arc<dyn ReflectionsRemote>>,
        clock: SharedClock,
    ) -> Self {
        let sync_settings: SyncSettings = settings_engine.get_settings().sync.clone();
        let options = SyncOptions {
            request_timeout: Duration::from_secs(sync_settings.request_timeout_secs),
            push_debounce: Duration::from_millis(sync_settings.push_debounce_ms),
        };

        let storage: Arc<dyn KeyValueStorage> = db.clone();
        let favorites = FavoritesStore::load(storage, clock.clone());

        let sync = favorites_remote
            .filter(|_| sync_settings.enabled)
            .map(|remote| FavoritesSync::new(remote, options));
        let journal = reflections_remote
            .map(|remote| ReflectionJournal::new(remote, clock.clone(), options.request_timeout));

        Self {
            db,
            settings_engine,
            favorites,
            sync,
            journal,
            supabase: None,
            session: AuthSession::Unauthenticated,
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn sync_available(&self) -> bool {
        self.sync.is_some()
    }

    pub fn pending_remote_deletions(&self) -> Vec<String> {
        self.sync.as_ref().map(|s| s.pending_removals()).unwrap_or_default()
    }

    fn after_change(&mut self, added: &[String], removed: &[String]) {
        if let Some(sync) = self.sync.as_mut() {
            for id in removed {
                sync.note_removed(id);
            }
            for id in added {
                sync.note_added(id);
            }
            sync.schedule_push(self.favorites.snapshot());
        }
    }

    // ─── Favorites ───

    /// Stars or unstars content. Returns the resulting membership.
    pub fn toggle_favorite(&mut self, candidate: FavoriteCandidate) -> Result<ToggleResult, FavoriteError> {
        let id = candidate.id();
        let result = self.favorites.toggle(candidate);
        let Committed { value: is_favorite, warning } = settle(result, || Some(self.favorites.contains(&id)))?;
        if is_favorite {
            self.after_change(&[id], &[]);
        } else {
            self.after_change(&[], &[id]);
        }
        Ok(ToggleResult { is_favorite, warning })
    }

    pub fn add_favorite(&mut self, candidate: FavoriteCandidate) -> Result<Committed<FavoriteItem>, FavoriteError> {
        let id = candidate.id();
        let result = self.favorites.add(candidate);
        let committed = settle(result, || self.favorites.get(&id).cloned())?;
        self.after_change(&[id], &[]);
        Ok(committed)
    }

    pub fn remove_favorite(&mut self, id: &str) -> Result<Committed<bool>, FavoriteError> {
        let existed = self.favorites.contains(id);
        let result = self.favorites.remove(id);
        let committed = settle(result, || Some(existed))?;
        if committed.value {
            self.after_change(&[], &[id.to_string()]);
        }
        Ok(committed)
    }

    pub fn set_favorite_pinned(&mut self, id: &str, pinned: bool) -> Result<Committed<FavoriteItem>, FavoriteError> {
        let result = self.favorites.set_pinned(id, pinned);
        let committed = settle(result, || self.favorites.get(id).cloned())?;
        self.after_change(&[], &[]);
        Ok(committed)
    }

    pub fn toggle_favorite_pin(&mut self, id: &str) -> Result<Committed<FavoriteItem>, FavoriteError> {
        let result = self.favorites.toggle_pin(id);
        let committed = settle(result, || self.favorites.get(id).cloned())?;
        self.after_change(&[], &[]);
        Ok(committed)
    }

    /// Marks a favorite used after the router navigated to it.
    pub fn touch_favorite(&mut self, id: &str) -> Result<Committed<bool>, FavoriteError> {
        let result = self.favorites.touch(id);
        let committed = settle(result, || Some(self.favorites.contains(id)))?;
        if committed.value {
            self.after_change(&[], &[]);
        }
        Ok(committed)
    }

    /// Removes unpinned favorites (`include_pinned` removes everything).
    pub fn clear_favorites(&mut self, include_pinned: bool) -> Result<Committed<Vec<String>>, FavoriteError> {
        let before: Vec<String> = self.favorites.snapshot().into_iter().map(|i| i.id).collect();
        let result = if include_pinned {
            self.favorites.clear_all()
        } else {
            self.favorites.clear()
        };
        let committed = settle(result, || {
            Some(before.iter().filter(|id| !self.favorites.contains(id)).cloned().collect())
        })?;
        if !committed.value.is_empty() {
            let removed = committed.value.clone();
            self.after_change(&[], &removed);
        }
        Ok(committed)
    }

    /// Automatic cleanup of unpinned favorites unused for `max_age`.
    pub fn prune_favorites(&mut self, now_millis: i64, max_age: Duration) -> Result<Committed<Vec<String>>, FavoriteError> {
        let before: Vec<String> = self.favorites.snapshot().into_iter().map(|i| i.id).collect();
        let max_age = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_millis.saturating_sub(max_age);
        let result = self.favorites.prune_unused(cutoff);
        let committed = settle(result, || {
            Some(before.iter().filter(|id| !self.favorites.contains(id)).cloned().collect())
        })?;
        if !committed.value.is_empty() {
            let removed = committed.value.clone();
            self.after_change(&[], &removed);
        }
        Ok(committed)
    }

    // ─── Session & sync ───

    /// Signs in, then reconciles favorites with the remote copy.
    ///
    /// An unreachable remote is not a login failure: `sync` is `None` and the
    /// device keeps its local state.
    pub async fn login(&mut self, access_token: &str) -> Result<LoginOutcome, AuthError> {
        let session = AuthSession::from_access_token(access_token)?;
        let user_id = session.user_id().unwrap_or_default().to_string();

        if let Some(client) = &self.supabase {
            client.set_access_token(session.access_token());
        }
        self.session = session;
        info!(user_id = %user_id, "signed in");

        let sync = match self.sync.as_mut() {
            Some(sync) => {
                sync.set_user(Some(user_id.clone()));
                sync.reconcile(&mut self.favorites).await.ok()
            }
            None => None,
        };

        Ok(LoginOutcome { user_id, sync })
    }

    /// Signs out. Pending pushes for the old user are flushed first.
    pub async fn logout(&mut self) {
        if let Some(sync) = self.sync.as_mut() {
            sync.flush().await;
            sync.set_user(None);
        }
        if let Some(client) = &self.supabase {
            client.set_access_token(None);
        }
        self.session = AuthSession::Unauthenticated;
        info!("signed out");
    }

    /// Runs a reconcile on demand (e.g. after the network comes back).
    pub async fn resync(&mut self) -> Result<SyncReport, SyncError> {
        match self.sync.as_mut() {
            Some(sync) if sync.user_id().is_some() => sync.reconcile(&mut self.favorites).await,
            Some(_) => Err(SyncError::Unauthenticated),
            None => Err(SyncError::RemoteUnavailable("remote sync is not configured".to_string())),
        }
    }

    // ─── Reflections ───

    fn journal_for_user(&self) -> Result<(&ReflectionJournal, String), ReflectionError> {
        let user_id = self
            .session
            .user_id()
            .ok_or(ReflectionError::Unauthenticated)?
            .to_string();
        let journal = self.journal.as_ref().ok_or_else(|| {
            ReflectionError::RemoteUnavailable("remote journal is not configured".to_string())
        })?;
        Ok((journal, user_id))
    }

    pub async fn list_reflections(&self, filter: &ReflectionFilter) -> Result<Vec<ReflectionEntry>, ReflectionError> {
        let (journal, user_id) = self.journal_for_user()?;
        journal.list(&user_id, filter).await
    }

    pub async fn create_reflection(&self, draft: ReflectionDraft) -> Result<ReflectionEntry, ReflectionError> {
        let (journal, user_id) = self.journal_for_user()?;
        journal.create(&user_id, draft).await
    }

    pub async fn update_reflection(&self, id: &str, draft: ReflectionDraft) -> Result<ReflectionEntry, ReflectionError> {
        let (journal, user_id) = self.journal_for_user()?;
        journal.update(&user_id, id, draft).await
    }

    pub async fn delete_reflection(&self, id: &str) -> Result<(), ReflectionError> {
        let (journal, user_id) = self.journal_for_user()?;
        journal.delete(&user_id, id).await
    }

    // ─── Lifecycle ───

    /// Flushes queued remote pushes and rewrites the local snapshot.
    pub async fn shutdown(&mut self) {
        if let Some(sync) = self.sync.as_mut() {
            sync.flush().await;
        }
        if let Err(e) = self.favorites.flush() {
            warn!(error = %e, "final favorites flush failed");
        }
        info!("shutdown complete");
    }
}
