//! Supabase (PostgREST) client for the remote favorites and reflections tables.
//!
//! Tables:
//! - `user_favorites`: one row per favorite, unique on `(user_id, id)`.
//! - `user_reflections`: one row per journal entry, primary key `id`.
//!
//! Row-level security scopes every request to the bearer token's user; the
//! explicit `user_id` filters only keep queries honest when RLS is off.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::services::remote::{FavoritesRemote, ReflectionsRemote};
use crate::types::errors::SyncError;
use crate::types::favorite::FavoriteItem;
use crate::types::reflection::ReflectionEntry;

pub const FAVORITES_TABLE: &str = "user_favorites";
pub const REFLECTIONS_TABLE: &str = "user_reflections";

const MAX_ERROR_BODY: usize = 300;

/// A favorites row as stored remotely: the item plus its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FavoriteRow {
    user_id: String,
    #[serde(flatten)]
    item: FavoriteItem,
}

/// HTTPS only, except plain HTTP on loopback for a local Supabase stack.
pub fn validate_base_url(base_url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(base_url)
        .map_err(|e| format!("Invalid supabase_url '{}': {}", base_url, e))?;
    let host = parsed.host_str().unwrap_or("");

    match parsed.scheme() {
        "https" => Ok(()),
        "http" if matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1") => Ok(()),
        "http" => Err(format!(
            "HTTP is only allowed for localhost (supabase_url: '{}')",
            base_url
        )),
        other => Err(format!("Unsupported URL scheme '{}' in supabase_url", other)),
    }
}

/// Formats ids as a PostgREST `in.(...)` list, quoting each value.
pub fn postgrest_in_list(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Maps a non-success status to the advisory sync error.
pub fn classify_status(status: StatusCode, body: &str) -> SyncError {
    let mut body = body.trim().to_string();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    match status.as_u16() {
        401 | 403 => SyncError::RemoteUnavailable(format!("auth rejected ({}): {}", status.as_u16(), body)),
        _ => SyncError::RemoteUnavailable(format!("HTTP {}: {}", status.as_u16(), body)),
    }
}

fn network_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() {
        SyncError::RemoteUnavailable(format!("request timed out: {}", err))
    } else {
        SyncError::RemoteUnavailable(format!("network error: {}", err))
    }
}

/// REST client for one Supabase project.
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl Drop for SupabaseClient {
    fn drop(&mut self) {
        self.anon_key.zeroize();
        if let Ok(mut token) = self.access_token.write() {
            if let Some(t) = token.as_mut() {
                t.zeroize();
            }
        }
    }
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, String> {
        validate_base_url(base_url)?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    /// Installs (or clears) the signed-in user's JWT used as bearer token.
    pub fn set_access_token(&self, token: Option<&str>) {
        let mut slot = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = slot.as_mut() {
            old.zeroize();
        }
        *slot = token.map(str::to_string);
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, SyncError> {
        let resp = self.authorized(builder).send().await.map_err(network_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let err = classify_status(status, &body);
        warn!(status = status.as_u16(), "supabase request rejected");
        Err(err)
    }

    async fn json<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, SyncError> {
        resp.json::<T>()
            .await
            .map_err(|e| SyncError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl FavoritesRemote for SupabaseClient {
    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<FavoriteItem>, SyncError> {
        let req = self
            .http
            .get(self.table_url(FAVORITES_TABLE))
            .query(&[("select", "*".to_string()), ("user_id", format!("eq.{}", user_id))]);
        let rows: Vec<FavoriteRow> = Self::json(self.send(req).await?).await?;
        debug!(count = rows.len(), "fetched remote favorites");
        Ok(rows.into_iter().map(|row| row.item).collect())
    }

    async fn upsert_favorites(&self, user_id: &str, items: &[FavoriteItem]) -> Result<(), SyncError> {
        let rows: Vec<FavoriteRow> = items
            .iter()
            .map(|item| FavoriteRow {
                user_id: user_id.to_string(),
                item: item.clone(),
            })
            .collect();
        let req = self
            .http
            .post(self.table_url(FAVORITES_TABLE))
            .query(&[("on_conflict", "user_id,id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rows);
        self.send(req).await?;
        Ok(())
    }

    async fn delete_favorites(&self, user_id: &str, ids: &[String]) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }
        let req = self
            .http
            .delete(self.table_url(FAVORITES_TABLE))
            .query(&[("user_id", format!("eq.{}", user_id)), ("id", postgrest_in_list(ids))])
            .header("Prefer", "return=minimal");
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl ReflectionsRemote for SupabaseClient {
    async fn fetch_reflections(&self, user_id: &str) -> Result<Vec<ReflectionEntry>, SyncError> {
        let req = self.http.get(self.table_url(REFLECTIONS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "updated_at.desc".to_string()),
        ]);
        Self::json(self.send(req).await?).await
    }

    async fn insert_reflection(&self, entry: &ReflectionEntry) -> Result<(), SyncError> {
        let req = self
            .http
            .post(self.table_url(REFLECTIONS_TABLE))
            .header("Prefer", "return=minimal")
            .json(entry);
        self.send(req).await?;
        Ok(())
    }

    async fn update_reflection(&self, entry: &ReflectionEntry) -> Result<bool, SyncError> {
        let req = self
            .http
            .patch(self.table_url(REFLECTIONS_TABLE))
            .query(&[
                ("id", format!("eq.{}", entry.id)),
                ("user_id", format!("eq.{}", entry.user_id)),
            ])
            .header("Prefer", "return=representation")
            .json(entry);
        let rows: Vec<ReflectionEntry> = Self::json(self.send(req).await?).await?;
        Ok(!rows.is_empty())
    }

    async fn delete_reflection(&self, user_id: &str, id: &str) -> Result<bool, SyncError> {
        let req = self
            .http
            .delete(self.table_url(REFLECTIONS_TABLE))
            .query(&[("id", format!("eq.{}", id)), ("user_id", format!("eq.{}", user_id))])
            .header("Prefer", "return=representation");
        let rows: Vec<ReflectionEntry> = Self::json(self.send(req).await?).await?;
        Ok(!rows.is_empty())
    }
}
