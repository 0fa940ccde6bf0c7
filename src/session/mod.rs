//! Session lifecycle: per-client key-value state correlated with the client
//! through a cookie-carried identifier.
//!
//! The middleware hands every request a [`SessionHandle`]. The handle is
//! lazy: the first read or write hydrates a [`Session`] from the store (or
//! starts a fresh one when the request carried no usable cookie), and a
//! request that never touches it performs no store I/O at all. Mutations
//! live in memory until an explicit [`SessionHandle::save`].

mod cookie;
pub mod middleware;
pub mod store;

pub use cookie::{CookieConfig, SessionCookie};

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use store::{SessionStore, SessionVars, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    /// A store failure other than the timed-out case (which silently
    /// yields a fresh session instead).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generates a random session id: 32 lowercase hex characters.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Checks the session id shape: exactly 32 lowercase hex characters.
pub fn validate_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// One client's session for the duration of one request.
pub struct Session {
    store: Arc<dyn SessionStore>,
    cookie: SessionCookie,
    cookie_config: CookieConfig,
    vars: SessionVars,
    is_new: bool,
    cookie_to_send: Option<String>,
}

impl Session {
    /// Builds a session from a request's `Cookie` header: hydrated from the
    /// store when the header carries a valid, live session id; fresh
    /// otherwise. A missing, malformed, or expired id is not an error;
    /// the malformed/expired cases additionally schedule an expiry cookie
    /// so the client drops the stale id.
    pub async fn open(
        cookie_header: Option<&str>,
        store: Arc<dyn SessionStore>,
        cookie_config: CookieConfig,
    ) -> Result<Self, SessionError> {
        let cookie = SessionCookie::parse(cookie_header, cookie_config.clone());
        let mut session = Self {
            store,
            cookie,
            cookie_config,
            vars: SessionVars::new(),
            is_new: true,
            cookie_to_send: None,
        };

        let Some(id) = session.cookie.value().map(str::to_owned) else {
            session.renew();
            return Ok(session);
        };

        if !validate_id(&id) {
            debug!("invalid session id in cookie, starting fresh");
            session.clear().await?;
            return Ok(session);
        }

        session.is_new = false;
        match session.store.load(&id).await {
            Ok(vars) => session.vars = vars,
            Err(StoreError::TimedOut(_)) => {
                debug!("session {id} timed out, starting fresh");
                session.clear().await?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(session)
    }

    /// The current session id. Always set: either kept from the client's
    /// cookie or generated when the session was renewed.
    pub fn id(&self) -> &str {
        self.cookie.value().unwrap_or("")
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.vars.keys()
    }

    /// Persists the current state under the session id and, when the
    /// session is new or a cookie attribute changed, schedules the session
    /// cookie for the response. Mutation without save is lost.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        if self.is_new || self.cookie.attr_changed() {
            self.cookie_to_send = Some(self.cookie.render());
        }
        let id = self.id().to_owned();
        self.store.save(&id, &self.vars).await?;
        Ok(())
    }

    /// Drops every key, expires the old identifier's cookie, persists the
    /// removal (deleting the backing row), and regenerates the id.
    pub async fn clear(&mut self) -> Result<(), SessionError> {
        self.cookie.expire_now();
        self.vars.clear();
        self.save().await?;
        self.renew();
        Ok(())
    }

    /// Re-initializes as a brand new session with a fresh id.
    fn renew(&mut self) {
        self.is_new = true;
        self.vars.clear();
        self.cookie = SessionCookie::parse(None, self.cookie_config.clone());
        self.cookie.set_value(generate_id());
    }

    /// The pending `Set-Cookie` value. Present only when one of these
    /// happened: a new session was saved, a cookie attribute changed before
    /// a save, the presented id was invalid or timed out, or the session
    /// was cleared.
    pub fn cookie_to_send(&self) -> Option<&str> {
        self.cookie_to_send.as_deref()
    }
}

/// Lazily-initializing session accessor shared between the middleware and
/// the handler. Cloning is cheap and clones observe the same session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn SessionStore>,
    cookie_config: CookieConfig,
    cookie_header: Option<String>,
}

impl SessionHandle {
    pub fn new(
        store: Arc<dyn SessionStore>,
        cookie_config: CookieConfig,
        cookie_header: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            store,
            cookie_config,
            cookie_header,
        }
    }

    /// Whether any handler touched the session during this request.
    pub async fn accessed(&self) -> bool {
        self.inner.read().await.is_some()
    }

    async fn ensure(
        &self,
    ) -> Result<tokio::sync::RwLockWriteGuard<'_, Option<Session>>, SessionError> {
        let mut guard = self.inner.write().await;
        if guard.is_none() {
            let session = Session::open(
                self.cookie_header.as_deref(),
                self.store.clone(),
                self.cookie_config.clone(),
            )
            .await?;
            *guard = Some(session);
        }
        Ok(guard)
    }

    pub async fn id(&self) -> Result<String, SessionError> {
        let mut guard = self.ensure().await?;
        Ok(guard.as_mut().expect("just initialized").id().to_owned())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let mut guard = self.ensure().await?;
        Ok(guard.as_mut().expect("just initialized").get(key).cloned())
    }

    pub async fn contains(&self, key: &str) -> Result<bool, SessionError> {
        let mut guard = self.ensure().await?;
        Ok(guard.as_mut().expect("just initialized").contains(key))
    }

    pub async fn insert(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), SessionError> {
        let mut guard = self.ensure().await?;
        guard.as_mut().expect("just initialized").insert(key, value);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let mut guard = self.ensure().await?;
        Ok(guard.as_mut().expect("just initialized").remove(key))
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        let mut guard = self.ensure().await?;
        guard.as_mut().expect("just initialized").clear().await
    }

    pub async fn save(&self) -> Result<(), SessionError> {
        let mut guard = self.ensure().await?;
        guard.as_mut().expect("just initialized").save().await
    }

    /// The pending `Set-Cookie` value, without touching an un-accessed
    /// session.
    pub async fn cookie_to_send(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .and_then(|s| s.cookie_to_send().map(str::to_owned))
    }
}
