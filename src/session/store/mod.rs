//! Durable session storage behind one narrow trait.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// The key-value mapping a session persists.
pub type SessionVars = HashMap<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The id has no live session: never stored, expired, or swept by gc.
    #[error("session {0} has timed out")]
    TimedOut(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage backend for session state. Expiry is the store's concern: `load`
/// refuses sessions past their timeout and `gc` sweeps them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists `vars` under `id`. An empty map removes the session.
    async fn save(&self, id: &str, vars: &SessionVars) -> Result<(), StoreError>;

    /// Loads the vars stored under `id`, or [`StoreError::TimedOut`] when
    /// the id has no live session.
    async fn load(&self, id: &str) -> Result<SessionVars, StoreError>;

    /// Removes every session past its timeout.
    async fn gc(&self) -> Result<(), StoreError>;
}
