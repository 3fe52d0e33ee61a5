//! Axum router construction.
//!
//! Two routes: the bootstrap page and the websocket endpoint. Anything
//! else falls through to axum's default 404.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::page;
use crate::state::AppState;
use crate::ws;

/// Build the router for an application with state type `S`.
///
/// The router includes:
/// - `GET /` -- bootstrap page
/// - `GET {ws_path}` -- websocket session endpoint (`/ws` by default)
pub fn build_router<S>(state: Arc<AppState<S>>) -> Router
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(page::index::<S>))
        .route(&state.ws_path, get(ws::ws_session::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
