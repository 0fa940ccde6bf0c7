// tests/session_persistence.rs
// Durability properties of the session lifecycle against the SQLite store,
// exercised through the same Session type the middleware hands out.

use std::sync::Arc;

use serde_json::json;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;

use cask::session::store::{SessionStore, SessionVars, SqliteSessionStore, StoreError};
use cask::session::{CookieConfig, Session};

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

fn cookie_for(id: &str) -> String {
    format!("cask.session.id={id}")
}

#[tokio::test]
async fn test_writes_then_save_then_load_reflect_last_values() {
    let store = Arc::new(
        SqliteSessionStore::new(memory_pool().await, 3600)
            .await
            .unwrap(),
    );

    let mut session = Session::open(None, store.clone(), CookieConfig::default())
        .await
        .unwrap();
    session.insert("name", "Alice");
    session.insert("count", 1);
    session.insert("count", 2); // overwrite before save
    session.save().await.unwrap();
    let id = session.id().to_owned();

    let reloaded = Session::open(Some(&cookie_for(&id)), store, CookieConfig::default())
        .await
        .unwrap();
    assert!(!reloaded.is_new());
    assert_eq!(reloaded.get("name"), Some(&json!("Alice")));
    assert_eq!(reloaded.get("count"), Some(&json!(2)));
}

#[tokio::test]
async fn test_clear_save_load_yields_empty_session() {
    let store = Arc::new(
        SqliteSessionStore::new(memory_pool().await, 3600)
            .await
            .unwrap(),
    );

    let mut session = Session::open(None, store.clone(), CookieConfig::default())
        .await
        .unwrap();
    session.insert("name", "Alice");
    session.save().await.unwrap();
    let id = session.id().to_owned();

    session.clear().await.unwrap();

    // the old identifier no longer resolves to any state
    let reloaded = Session::open(Some(&cookie_for(&id)), store, CookieConfig::default())
        .await
        .unwrap();
    assert!(reloaded.is_new());
    assert_eq!(reloaded.len(), 0);
    assert_eq!(reloaded.get("name"), None);
}

#[tokio::test]
async fn test_fresh_session_read_is_absence_not_empty_string() {
    let store = Arc::new(
        SqliteSessionStore::new(memory_pool().await, 3600)
            .await
            .unwrap(),
    );

    let session = Session::open(None, store, CookieConfig::default())
        .await
        .unwrap();

    assert_eq!(session.get("name"), None);
    assert_ne!(session.get("name"), Some(&json!("")));
    assert!(!session.contains("name"));
}

#[tokio::test]
async fn test_remove_then_save_drops_only_that_key() {
    let store = Arc::new(
        SqliteSessionStore::new(memory_pool().await, 3600)
            .await
            .unwrap(),
    );

    let mut session = Session::open(None, store.clone(), CookieConfig::default())
        .await
        .unwrap();
    session.insert("name", "Alice");
    session.insert("role", "admin");
    session.save().await.unwrap();
    let id = session.id().to_owned();

    session.remove("role");
    session.save().await.unwrap();

    let reloaded = Session::open(Some(&cookie_for(&id)), store, CookieConfig::default())
        .await
        .unwrap();
    assert_eq!(reloaded.get("name"), Some(&json!("Alice")));
    assert_eq!(reloaded.get("role"), None);
}

#[tokio::test]
async fn test_store_survives_reopen_on_disk() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sessions.sqlite");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    let id = {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        let store = Arc::new(SqliteSessionStore::new(pool, 3600).await.unwrap());
        let mut session = Session::open(None, store, CookieConfig::default())
            .await
            .unwrap();
        session.insert("name", "Alice");
        session.save().await.unwrap();
        session.id().to_owned()
    };

    // a brand new pool over the same file sees the saved session
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    let store = SqliteSessionStore::new(pool, 3600).await.unwrap();
    let vars = store.load(&id).await.unwrap();
    assert_eq!(vars.get("name"), Some(&json!("Alice")));
}

#[tokio::test]
async fn test_expired_session_loads_as_fresh() {
    let pool = memory_pool().await;

    // seed under a generous timeout, reopen under an already-elapsed one
    let seeder = Arc::new(SqliteSessionStore::new(pool.clone(), 3600).await.unwrap());
    let mut vars = SessionVars::new();
    vars.insert("name".to_string(), json!("Alice"));
    let id = "b".repeat(32);
    seeder.save(&id, &vars).await.unwrap();

    let expired_store = Arc::new(SqliteSessionStore::new(pool, -1).await.unwrap());
    assert!(matches!(
        expired_store.load(&id).await,
        Err(StoreError::TimedOut(_))
    ));

    let session = Session::open(
        Some(&cookie_for(&id)),
        expired_store,
        CookieConfig::default(),
    )
    .await
    .unwrap();
    assert!(session.is_new());
    assert_eq!(session.get("name"), None);
    // and the stale cookie goes back expired
    assert!(session.cookie_to_send().unwrap().contains("Expires="));
}
