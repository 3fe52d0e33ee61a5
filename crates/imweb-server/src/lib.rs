//! Axum front end for the imweb engine.
//!
//! This crate serves:
//!
//! - **Bootstrap page** (`GET /`) carrying the browser-side renderer
//! - **`WebSocket` endpoint** (`/ws` by default) where each connection
//!   runs its own [`Session`](imweb_core::Session) frame loop
//!
//! # Lifecycle
//!
//! [`run`] is the whole server in one call: it builds the shared
//! [`AppState`], binds, and serves until SIGINT or SIGTERM. Sessions watch
//! the same shutdown signal and close their sockets when it fires; the
//! server returns only after the last of them has finished.
//!
//! Embedders that need the bound address (tests, supervisors) use
//! [`bind`] and [`serve`] directly; [`build_router`] alone is enough for
//! in-process request tests.

pub mod error;
pub mod page;
pub mod router;
pub mod server;
pub mod signal;
pub mod state;
pub mod ws;

use std::sync::Arc;

use imweb_core::config::ImwebConfig;
use imweb_core::{Context, RenderFn, shutdown_channel};
use tracing::info;

pub use error::ServerError;
pub use router::build_router;
pub use server::{bind, serve};
pub use signal::wait_for_termination;
pub use state::AppState;
pub use ws::{ReaderEnd, WsCommandSink, read_events};

/// Serve `render` over websockets until the process is told to stop.
///
/// Every connecting client gets its own copy of `init` and its own frame
/// loop calling `render`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, templates fail to
/// compile, or the listener cannot bind or fails while serving.
pub async fn run<S, F>(config: ImwebConfig, init: S, render: F) -> Result<(), ServerError>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(&mut Context<'_, S>) + Send + Sync + 'static,
{
    let (trigger, signal) = shutdown_channel();
    let render: RenderFn<S> = Arc::new(render);
    let state = Arc::new(AppState::new(init, render, &config, signal)?);
    let listener = bind(&config.server).await?;

    tokio::spawn(async move {
        wait_for_termination().await;
        info!("shutting down");
        trigger.trigger();
    });

    serve(listener, state).await
}
