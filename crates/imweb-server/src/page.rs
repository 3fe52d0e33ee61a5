//! Bootstrap page served at `GET /`.
//!
//! The page carries the whole renderer: it opens the websocket, applies
//! `ADD` / `REPLACE` / `REMOVE` commands to the document body, forwards
//! button clicks through `window.IMWEB_notify`, and reconnects after a
//! fixed delay whenever the socket closes. It is rendered once at startup.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use imweb_core::config::PageConfig;
use minijinja::{Environment, context};

use crate::error::ServerError;
use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Render the bootstrap page for the given settings.
pub fn render_page(config: &PageConfig) -> Result<String, ServerError> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;

    // Emitted inside <script>, where entities are not decoded, so it is
    // JSON-encoded and marked safe instead of HTML-escaped.
    let ws_path_json = serde_json::to_string(&config.ws_path)?;

    let html = env.get_template("index.html")?.render(context! {
        title => config.title.as_str(),
        ws_path_json => ws_path_json,
        reconnect_delay_ms => config.reconnect_delay_ms,
    })?;
    Ok(html)
}

/// Serve the pre-rendered bootstrap page.
///
/// # Route
///
/// `GET /`
pub async fn index<S>(State(state): State<Arc<AppState<S>>>) -> Html<String>
where
    S: Send + Sync + 'static,
{
    Html(state.page.clone())
}
