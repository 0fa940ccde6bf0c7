//! In-memory session store. Same contract as the SQLite backend; state dies
//! with the process, which is exactly what unit tests want.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{SessionStore, SessionVars, StoreError};

pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (i64, SessionVars)>>,
    timeout: i64,
}

impl MemorySessionStore {
    pub fn new(timeout: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, id: &str, vars: &SessionVars) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if vars.is_empty() {
            sessions.remove(id);
        } else {
            sessions.insert(id.to_string(), (Utc::now().timestamp(), vars.clone()));
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<SessionVars, StoreError> {
        let cutoff = Utc::now().timestamp() - self.timeout;
        let sessions = self.sessions.read().await;
        match sessions.get(id) {
            Some((atime, vars)) if *atime > cutoff => Ok(vars.clone()),
            _ => Err(StoreError::TimedOut(id.to_string())),
        }
    }

    async fn gc(&self) -> Result<(), StoreError> {
        let cutoff = Utc::now().timestamp() - self.timeout;
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (atime, _)| *atime >= cutoff);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemorySessionStore::new(60);
        let mut vars = SessionVars::new();
        vars.insert("key1".to_string(), json!("string"));

        store.save("abc", &vars).await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), vars);

        store.save("abc", &SessionVars::new()).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_negative_timeout_expires_everything() {
        let store = MemorySessionStore::new(-1);
        let mut vars = SessionVars::new();
        vars.insert("key1".to_string(), json!(1));

        store.save("abc", &vars).await.unwrap();
        assert!(matches!(
            store.load("abc").await,
            Err(StoreError::TimedOut(_))
        ));
    }
}
