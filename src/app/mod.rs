//! The session demo application: a login form, a login action, and a
//! greeting page, composed with the session layer.

use axum::{
    Form, Router, middleware,
    extract::Extension,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::session::SessionHandle;
use crate::session::middleware::{SessionState, session_layer};

const LOGIN_PAGE: &str = "<!DOCTYPE html>\n\
<html>\n\
<head><title>Login</title></head>\n\
<body>\n\
  <form action=\"/login\" method=\"post\">\n\
    <input type=\"text\" name=\"name\" placeholder=\"Your name\">\n\
    <button type=\"submit\">Login</button>\n\
  </form>\n\
</body>\n\
</html>\n";

/// Builds the demo router with the session layer applied to every route.
pub fn router(sessions: SessionState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/hello", get(hello))
        .layer(middleware::from_fn_with_state(sessions, session_layer))
        .layer(TraceLayer::new_for_http())
}

/// `GET /`: the login form. No session interaction.
async fn index() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

#[derive(Deserialize)]
struct LoginForm {
    name: Option<String>,
}

/// `POST /login`: drop any previous state, remember the submitted name,
/// persist, and send the client on to the greeting.
async fn login(
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Redirect> {
    let name = form
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: name"))?;

    session.clear().await?;
    session.insert("name", name.clone()).await?;
    session.save().await?;

    info!("login: {name}");
    Ok(Redirect::to("/hello"))
}

/// `GET /hello`: greet a logged-in client, bounce everyone else back to
/// the form. Reads only, so no save.
async fn hello(Extension(session): Extension<SessionHandle>) -> ApiResult<Response> {
    match session.get("name").await? {
        Some(name) => {
            let name = name.as_str().unwrap_or_default().to_owned();
            let page = format!(
                "<!DOCTYPE html>\n<html>\n<head><title>Hello</title></head>\n\
                 <body>\n  <p>Hello {name}!</p>\n</body>\n</html>\n"
            );
            Ok(Html(page).into_response())
        }
        None => Ok(Redirect::to("/").into_response()),
    }
}
