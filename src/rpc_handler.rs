//! RPC method handler for the AstroLab JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches method calls to the favorites store, sync,
//! journal and settings through the `App` struct.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::favorites_store::FavoritesStoreTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::favorite::{deterministic_id, FavoriteCandidate, FavoriteFilter, FavoriteKind};
use crate::types::reflection::{ReflectionDraft, ReflectionFilter};

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

/// Decodes the whole params object into `T`; `null` counts as `{}`.
fn typed_params<T: DeserializeOwned>(params: &Value) -> Result<T, String> {
    let params = if params.is_null() { json!({}) } else { params.clone() };
    serde_json::from_value(params).map_err(|e| format!("invalid params: {}", e))
}

/// Accepts either an explicit `id` or the `type` + `title` pair it derives from.
fn favorite_id(params: &Value) -> Result<String, String> {
    if let Some(id) = params.get("id").and_then(|v| v.as_str()) {
        return Ok(id.to_string());
    }
    let kind: FavoriteKind = params
        .get("type")
        .cloned()
        .ok_or("missing id")
        .and_then(|v| serde_json::from_value(v).map_err(|_| "invalid type"))?;
    let title = str_param(params, "title")?;
    Ok(deterministic_id(kind, title))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &mut App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Favorites ───
        "favorites.toggle" => {
            let candidate: FavoriteCandidate = typed_params(params)?;
            let result = app.toggle_favorite(candidate).map_err(|e| e.to_string())?;
            Ok(json!({"is_favorite": result.is_favorite, "warning": result.warning}))
        }
        "favorites.add" => {
            let candidate: FavoriteCandidate = typed_params(params)?;
            let added = app.add_favorite(candidate).map_err(|e| e.to_string())?;
            Ok(json!({"item": added.value, "warning": added.warning}))
        }
        "favorites.remove" => {
            let id = favorite_id(params)?;
            let removed = app.remove_favorite(&id).map_err(|e| e.to_string())?;
            Ok(json!({"removed": removed.value, "warning": removed.warning}))
        }
        "favorites.list" => {
            let filter: FavoriteFilter = typed_params(params)?;
            Ok(json!(app.favorites.list(&filter)))
        }
        "favorites.contains" => {
            let id = favorite_id(params)?;
            Ok(json!({"id": id, "is_favorite": app.favorites.contains(&id)}))
        }
        "favorites.pin" => {
            let id = favorite_id(params)?;
            // Without an explicit `pinned` the pin state flips.
            let updated = match params.get("pinned").and_then(|v| v.as_bool()) {
                Some(pinned) => app.set_favorite_pinned(&id, pinned),
                None => app.toggle_favorite_pin(&id),
            }
            .map_err(|e| e.to_string())?;
            Ok(json!({"item": updated.value, "warning": updated.warning}))
        }
        "favorites.touch" => {
            let id = favorite_id(params)?;
            let touched = app.touch_favorite(&id).map_err(|e| e.to_string())?;
            Ok(json!({"touched": touched.value, "warning": touched.warning}))
        }
        "favorites.clear" => {
            let include_pinned = params
                .get("include_pinned")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let cleared = app.clear_favorites(include_pinned).map_err(|e| e.to_string())?;
            Ok(json!({"removed": cleared.value, "warning": cleared.warning}))
        }

        // ─── Auth ───
        "auth.login" => {
            let token = str_param(params, "access_token")?;
            let outcome = app.login(token).await.map_err(|e| e.to_string())?;
            Ok(json!({"user_id": outcome.user_id, "sync": outcome.sync}))
        }
        "auth.logout" => {
            app.logout().await;
            Ok(json!({"ok": true}))
        }
        "auth.status" => Ok(json!({
            "authenticated": app.session().is_authenticated(),
            "user_id": app.session().user_id(),
            "sync_available": app.sync_available(),
            "pending_deletions": app.pending_remote_deletions(),
        })),

        // ─── Sync ───
        "sync.now" => {
            let report = app.resync().await.map_err(|e| e.to_string())?;
            Ok(json!(report))
        }

        // ─── Reflections ───
        "reflections.list" => {
            let filter: ReflectionFilter = typed_params(params)?;
            let entries = app.list_reflections(&filter).await.map_err(|e| e.to_string())?;
            Ok(json!(entries))
        }
        "reflections.create" => {
            let draft: ReflectionDraft = typed_params(params)?;
            let entry = app.create_reflection(draft).await.map_err(|e| e.to_string())?;
            Ok(json!(entry))
        }
        "reflections.update" => {
            let id = str_param(params, "id")?.to_string();
            let draft: ReflectionDraft = typed_params(params)?;
            let entry = app.update_reflection(&id, draft).await.map_err(|e| e.to_string())?;
            Ok(json!(entry))
        }
        "reflections.delete" => {
            let id = str_param(params, "id")?;
            app.delete_reflection(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings_engine.get_settings();
            serde_json::to_value(settings).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            app.settings_engine.reset().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
