//! Unit tests for the RPC handler: the JSON-RPC methods dispatched by `handle_method`.
//!
//! These tests exercise the methods through the same code path used by the
//! real `astrolab-rpc` binary, with a temporary on-disk SQLite database and
//! an in-memory remote standing in for Supabase.

use std::sync::Arc;

use astrolab::app::App;
use astrolab::clock::ManualClock;
use astrolab::database::Database;
use astrolab::managers::favorites_store::FavoritesStoreTrait;
use astrolab::rpc_handler::handle_method;
use astrolab::services::remote::{FavoritesRemote, ReflectionsRemote};
use astrolab::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use astrolab::testing::InMemoryRemote;
use astrolab::types::favorite::{FavoriteCandidate, FavoriteKind};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{json, Value};
use tempfile::TempDir;

fn settings_in(tmp: &TempDir) -> SettingsEngine {
    let path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let mut engine = SettingsEngine::new(Some(path));
    engine.set_value("sync.push_debounce_ms", json!(0)).unwrap();
    engine
}

/// Create an App backed by a temp directory DB and a shared in-memory remote.
fn setup() -> (App, Arc<InMemoryRemote>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db = Arc::new(Database::open(tmp.path().join("test.db")).expect("Failed to open database"));
    let remote = Arc::new(InMemoryRemote::new());
    let favorites: Arc<dyn FavoritesRemote> = remote.clone();
    let reflections: Arc<dyn ReflectionsRemote> = remote.clone();
    let app = App::assemble(
        db,
        settings_in(&tmp),
        Some(favorites),
        Some(reflections),
        Arc::new(ManualClock::new(1_000)),
    );
    (app, remote, tmp)
}

fn token(user_id: &str) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
        URL_SAFE_NO_PAD.encode(json!({"sub": user_id}).to_string())
    )
}

fn aries() -> Value {
    json!({"type": "glossary-sign", "title": "Aries", "route": "/glossary/signs/aries", "icon": "♈"})
}

// ─── Ping / unknown ───

#[tokio::test]
async fn test_ping() {
    let (mut app, _remote, _tmp) = setup();
    let res = handle_method(&mut app, "ping", &json!({})).await.unwrap();
    assert_eq!(res["pong"], true);
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (mut app, _remote, _tmp) = setup();
    let res = handle_method(&mut app, "nonexistent.method", &json!({})).await;
    assert_eq!(res.unwrap_err(), "unknown method: nonexistent.method");
}

// ─── Favorites ───

#[tokio::test]
async fn test_toggle_and_list() {
    let (mut app, _remote, _tmp) = setup();

    let res = handle_method(&mut app, "favorites.toggle", &aries()).await.unwrap();
    assert_eq!(res, json!({"is_favorite": true, "warning": null}));

    let list = handle_method(&mut app, "favorites.list", &json!({})).await.unwrap();
    let arr = list.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["id"], "glossary-sign:aries");
    assert_eq!(arr[0]["icon"], "♈");
    assert_eq!(arr[0]["scope"], "global");

    let res = handle_method(&mut app, "favorites.toggle", &aries()).await.unwrap();
    assert_eq!(res["is_favorite"], false);
    let list = handle_method(&mut app, "favorites.list", &Value::Null).await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_uses_camel_case_wire_fields() {
    let (mut app, _remote, _tmp) = setup();
    let params = json!({
        "type": "glossary-house",
        "title": "Casa I",
        "route": "/glossary/houses",
        "targetId": "house-1",
        "tags": ["angular"]
    });
    let res = handle_method(&mut app, "favorites.add", &params).await.unwrap();
    let item = &res["item"];
    assert_eq!(item["id"], "glossary-house:casa i");
    assert_eq!(item["type"], "glossary-house");
    assert_eq!(item["targetId"], "house-1");
    assert_eq!(item["lastUsedAt"], 1_000);
    assert_eq!(item["createdAt"], 1_000);

    let list = handle_method(&mut app, "favorites.list", &json!({"type": "glossary-sign"})).await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
    let list = handle_method(&mut app, "favorites.list", &json!({"type": "glossary-house"})).await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_contains_by_type_and_title() {
    let (mut app, _remote, _tmp) = setup();
    handle_method(&mut app, "favorites.add", &aries()).await.unwrap();

    let res = handle_method(&mut app, "favorites.contains", &json!({"type": "glossary-sign", "title": " ARIES"}))
        .await
        .unwrap();
    assert_eq!(res, json!({"id": "glossary-sign:aries", "is_favorite": true}));

    let res = handle_method(&mut app, "favorites.contains", &json!({"id": "glossary-sign:leo"})).await.unwrap();
    assert_eq!(res["is_favorite"], false);
}

#[tokio::test]
async fn test_unknown_kind_is_rejected() {
    let (mut app, _remote, _tmp) = setup();
    let res = handle_method(
        &mut app,
        "favorites.toggle",
        &json!({"type": "tarot-card", "title": "The Moon", "route": "/tarot"}),
    )
    .await;
    assert!(res.unwrap_err().starts_with("invalid params"));
}

#[tokio::test]
async fn test_invalid_candidate_is_rejected() {
    let (mut app, _remote, _tmp) = setup();
    let res = handle_method(
        &mut app,
        "favorites.add",
        &json!({"type": "glossary-sign", "title": "Aries", "route": "  "}),
    )
    .await;
    assert!(res.unwrap_err().starts_with("Invalid favorite"));
}

#[tokio::test]
async fn test_pin_touch_remove_clear() {
    let (mut app, _remote, _tmp) = setup();
    handle_method(&mut app, "favorites.add", &aries()).await.unwrap();
    handle_method(
        &mut app,
        "favorites.add",
        &json!({"type": "glossary-aspect", "title": "Trine", "route": "/glossary/aspects/trine"}),
    )
    .await
    .unwrap();

    let res = handle_method(&mut app, "favorites.pin", &json!({"id": "glossary-sign:aries"})).await.unwrap();
    assert_eq!(res["item"]["pinned"], true);
    let res = handle_method(&mut app, "favorites.pin", &json!({"id": "glossary-sign:aries", "pinned": true}))
        .await
        .unwrap();
    assert_eq!(res["item"]["pinned"], true);

    let res = handle_method(&mut app, "favorites.pin", &json!({"id": "glossary-sign:leo"})).await;
    assert_eq!(res.unwrap_err(), "Favorite not found: glossary-sign:leo");

    let res = handle_method(&mut app, "favorites.touch", &json!({"id": "glossary-aspect:trine"})).await.unwrap();
    assert_eq!(res["touched"], true);

    let res = handle_method(&mut app, "favorites.clear", &json!({})).await.unwrap();
    assert_eq!(res["removed"], json!(["glossary-aspect:trine"]));

    let res = handle_method(&mut app, "favorites.remove", &json!({"id": "glossary-sign:aries"})).await.unwrap();
    assert_eq!(res["removed"], true);
    let res = handle_method(&mut app, "favorites.remove", &json!({"id": "glossary-sign:aries"})).await.unwrap();
    assert_eq!(res["removed"], false);
}

#[tokio::test]
async fn test_storage_failure_is_a_warning() {
    let (mut app, _remote, _tmp) = setup();
    app.db.connection().execute_batch("DROP TABLE kv_store;").unwrap();

    let res = handle_method(&mut app, "favorites.toggle", &aries()).await.unwrap();
    assert_eq!(res["is_favorite"], true);
    assert!(res["warning"].as_str().unwrap().starts_with("Favorite may not be saved"));

    let res = handle_method(&mut app, "favorites.contains", &json!({"id": "glossary-sign:aries"})).await.unwrap();
    assert_eq!(res["is_favorite"], true);
}

// ─── Auth & sync ───

#[tokio::test]
async fn test_signed_out_status_and_sync() {
    let (mut app, _remote, _tmp) = setup();
    let status = handle_method(&mut app, "auth.status", &json!({})).await.unwrap();
    assert_eq!(status["authenticated"], false);
    assert_eq!(status["user_id"], Value::Null);
    assert_eq!(status["sync_available"], true);

    let res = handle_method(&mut app, "sync.now", &json!({})).await;
    assert_eq!(res.unwrap_err(), "Sync skipped: not signed in");
}

#[tokio::test]
async fn test_login_reconciles_with_remote() {
    let (mut app, remote, _tmp) = setup();
    remote.put_favorite(
        "user-1",
        FavoriteCandidate::new(FavoriteKind::GlossarySign, "Leo", "/glossary/signs/leo").into_item(500),
    );
    handle_method(&mut app, "favorites.add", &aries()).await.unwrap();

    let res = handle_method(&mut app, "auth.login", &json!({"access_token": token("user-1")}))
        .await
        .unwrap();
    assert_eq!(res["user_id"], "user-1");
    assert_eq!(res["sync"]["total"], 2);
    assert_eq!(res["sync"]["pushed"], true);
    assert_eq!(remote.favorites_of("user-1").len(), 2);

    let list = handle_method(&mut app, "favorites.list", &json!({})).await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);

    let status = handle_method(&mut app, "auth.status", &json!({})).await.unwrap();
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["user_id"], "user-1");
}

#[tokio::test]
async fn test_login_while_offline_keeps_local_state() {
    let (mut app, remote, _tmp) = setup();
    remote.set_offline(true);
    handle_method(&mut app, "favorites.add", &aries()).await.unwrap();

    let res = handle_method(&mut app, "auth.login", &json!({"access_token": token("user-1")}))
        .await
        .unwrap();
    assert_eq!(res["sync"], Value::Null);
    assert!(app.favorites.contains("glossary-sign:aries"));

    remote.set_offline(false);
    let report = handle_method(&mut app, "sync.now", &json!({})).await.unwrap();
    assert_eq!(report["local_only"], 1);
    assert_eq!(remote.favorites_of("user-1").len(), 1);
}

#[tokio::test]
async fn test_changes_after_login_are_pushed() {
    let (mut app, remote, _tmp) = setup();
    handle_method(&mut app, "auth.login", &json!({"access_token": token("user-1")})).await.unwrap();

    handle_method(&mut app, "favorites.toggle", &aries()).await.unwrap();
    app.shutdown().await;
    assert_eq!(remote.favorites_of("user-1").len(), 1);

    handle_method(&mut app, "favorites.toggle", &aries()).await.unwrap();
    handle_method(&mut app, "auth.logout", &json!({})).await.unwrap();
    assert!(remote.favorites_of("user-1").is_empty());

    let status = handle_method(&mut app, "auth.status", &json!({})).await.unwrap();
    assert_eq!(status["authenticated"], false);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (mut app, _remote, _tmp) = setup();
    let res = handle_method(&mut app, "auth.login", &json!({"access_token": "not-a-jwt"})).await;
    assert!(res.unwrap_err().starts_with("Invalid access token"));
    let res = handle_method(&mut app, "auth.login", &json!({})).await;
    assert_eq!(res.unwrap_err(), "missing access_token");
}

// ─── Reflections ───

#[tokio::test]
async fn test_reflections_require_login() {
    let (mut app, _remote, _tmp) = setup();
    let res = handle_method(&mut app, "reflections.list", &json!({})).await;
    assert_eq!(res.unwrap_err(), "Sign in to use the journal");
}

#[tokio::test]
async fn test_reflections_crud() {
    let (mut app, remote, _tmp) = setup();
    handle_method(&mut app, "auth.login", &json!({"access_token": token("user-1")})).await.unwrap();

    let created = handle_method(
        &mut app,
        "reflections.create",
        &json!({"title": "New moon", "content": "Set intentions", "tags": ["moon"]}),
    )
    .await
    .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["user_id"], "user-1");

    let updated = handle_method(
        &mut app,
        "reflections.update",
        &json!({"id": id, "title": "New moon in Aries", "content": "Set intentions"}),
    )
    .await
    .unwrap();
    assert_eq!(updated["title"], "New moon in Aries");

    let list = handle_method(&mut app, "reflections.list", &json!({"query": "aries"})).await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let res = handle_method(&mut app, "reflections.create", &json!({"title": "", "content": "x"})).await;
    assert_eq!(res.unwrap_err(), "Invalid reflection: title is empty");

    handle_method(&mut app, "reflections.delete", &json!({"id": id})).await.unwrap();
    assert!(remote.reflections_of("user-1").is_empty());
    let res = handle_method(&mut app, "reflections.delete", &json!({"id": id})).await;
    assert!(res.unwrap_err().starts_with("Reflection not found"));
}

// ─── Settings ───

#[tokio::test]
async fn test_settings_get_set_reset() {
    let (mut app, _remote, _tmp) = setup();

    let res = handle_method(&mut app, "settings.set", &json!({"key": "sync.request_timeout_secs", "value": 3}))
        .await
        .unwrap();
    assert_eq!(res, json!({"ok": true}));

    let settings = handle_method(&mut app, "settings.get", &json!({})).await.unwrap();
    assert_eq!(settings["sync"]["request_timeout_secs"], 3);

    let res = handle_method(&mut app, "settings.set", &json!({"key": "sync.unknown", "value": 1})).await;
    assert!(res.unwrap_err().starts_with("Invalid settings key"));

    handle_method(&mut app, "settings.reset", &json!({})).await.unwrap();
    let settings = handle_method(&mut app, "settings.get", &json!({})).await.unwrap();
    assert_eq!(settings["sync"]["request_timeout_secs"], 5);
}

// ─── Local-only app ───

#[tokio::test]
async fn test_app_without_remote_works_locally() {
    let tmp = TempDir::new().unwrap();
    let db = Arc::new(Database::open(tmp.path().join("local.db")).unwrap());
    let mut app = App::assemble(db, settings_in(&tmp), None, None, Arc::new(ManualClock::new(0)));

    let res = handle_method(&mut app, "favorites.toggle", &aries()).await.unwrap();
    assert_eq!(res["is_favorite"], true);

    let res = handle_method(&mut app, "auth.login", &json!({"access_token": token("user-1")}))
        .await
        .unwrap();
    assert_eq!(res["sync"], Value::Null);

    let res = handle_method(&mut app, "sync.now", &json!({})).await;
    assert!(res.unwrap_err().starts_with("Remote unavailable"));
    let res = handle_method(&mut app, "reflections.list", &json!({})).await;
    assert!(res.unwrap_err().starts_with("Reflection not saved, remote unavailable"));
}

// ─── Cleanup ───

#[tokio::test]
async fn test_prune_removes_stale_unpinned_favorites() {
    let (mut app, _remote, _tmp) = setup();
    handle_method(&mut app, "favorites.add", &aries()).await.unwrap();
    handle_method(
        &mut app,
        "favorites.add",
        &json!({"type": "glossary-moon", "title": "Full Moon", "route": "/glossary/moon", "pinned": true}),
    )
    .await
    .unwrap();

    let pruned = app
        .prune_favorites(1_000 + 90_000, std::time::Duration::from_secs(60))
        .unwrap();
    assert_eq!(pruned.value, vec!["glossary-sign:aries"]);
    assert_eq!(pruned.warning, None);
    assert!(app.favorites.contains("glossary-moon:full moon"));
}

#[tokio::test]
async fn test_prune_with_huge_max_age_keeps_everything() {
    let (mut app, _remote, _tmp) = setup();
    handle_method(&mut app, "favorites.add", &aries()).await.unwrap();

    let pruned = app.prune_favorites(1_000 + 90_000, std::time::Duration::MAX).unwrap();
    assert!(pruned.value.is_empty());
    assert!(app.favorites.contains("glossary-sign:aries"));
}
