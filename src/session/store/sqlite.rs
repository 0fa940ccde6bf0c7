//! SQLite-backed session store.
//!
//! One row per session: `id`, `ctime` (created), `atime` (last saved),
//! `vars` (JSON). Saving refreshes `atime` but preserves `ctime`; saving an
//! empty map deletes the row outright.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, sqlite::SqlitePool};
use tracing::debug;

use super::{SessionStore, SessionVars, StoreError};

pub struct SqliteSessionStore {
    pool: SqlitePool,
    timeout: i64,
}

impl SqliteSessionStore {
    /// Creates the store and the backing table if it does not exist yet.
    pub async fn new(pool: SqlitePool, timeout: i64) -> Result<Self, StoreError> {
        Self::with_auto_gc(pool, timeout, false, 0.0).await
    }

    /// Like [`new`](Self::new), but additionally sweeps expired sessions
    /// with probability `gc_auto_prob` per construction, so long-running
    /// deployments stay tidy without a dedicated cleanup job.
    pub async fn with_auto_gc(
        pool: SqlitePool,
        timeout: i64,
        gc_auto: bool,
        gc_auto_prob: f64,
    ) -> Result<Self, StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                ctime INTEGER NOT NULL,
                atime INTEGER NOT NULL,
                vars TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        let store = Self { pool, timeout };

        if gc_auto && gc_auto_prob > rand::random::<f64>() {
            store.gc().await?;
        }

        Ok(store)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn save(&self, id: &str, vars: &SessionVars) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();

        if vars.is_empty() {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            return Ok(());
        }

        // Create the row if absent; vars land in the update below so an
        // existing row keeps its ctime.
        sqlx::query("INSERT OR IGNORE INTO sessions (id, ctime, atime, vars) VALUES (?, ?, ?, '')")
            .bind(id)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

        sqlx::query("UPDATE sessions SET atime = ?, vars = ? WHERE id = ?")
            .bind(now)
            .bind(serde_json::to_string(vars)?)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load(&self, id: &str) -> Result<SessionVars, StoreError> {
        let cutoff = Utc::now().timestamp() - self.timeout;

        let row = sqlx::query("SELECT vars FROM sessions WHERE id = ? AND atime > ?")
            .bind(id)
            .bind(cutoff)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let vars: String = row.get("vars");
                Ok(serde_json::from_str(&vars)?)
            }
            None => Err(StoreError::TimedOut(id.to_string())),
        }
    }

    async fn gc(&self) -> Result<(), StoreError> {
        let cutoff = Utc::now().timestamp() - self.timeout;

        let result = sqlx::query("DELETE FROM sessions WHERE atime < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        debug!("session gc removed {} expired rows", result.rows_affected());
        Ok(())
    }
}
