//! Session middleware: hands every request a lazy [`SessionHandle`] through
//! the request extensions and flushes any pending session cookie onto the
//! response once the handler is done.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{CookieConfig, SessionHandle, store::SessionStore};

/// Everything the session layer needs, shared across requests.
#[derive(Clone)]
pub struct SessionState {
    pub store: Arc<dyn SessionStore>,
    pub cookie: CookieConfig,
}

/// Wrap with `axum::middleware::from_fn_with_state(session_state, session_layer)`.
pub async fn session_layer(
    State(state): State<SessionState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let handle = SessionHandle::new(state.store.clone(), state.cookie.clone(), cookie_header);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    // Only a session the handler actually touched can owe the client a cookie
    if handle.accessed().await {
        if let Some(cookie) = handle.cookie_to_send().await {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!("dropping malformed session cookie: {e}"),
            }
        }
    }

    response
}
