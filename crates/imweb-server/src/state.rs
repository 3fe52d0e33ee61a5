//! Shared application state for the axum router.
//!
//! [`AppState`] holds what every new session needs: the initial
//! application state to clone, the render callback, compiled element
//! markup, frame tuning, and the shutdown signal. Apart from the session
//! tracker nothing in here is mutated after startup; sessions share no
//! runtime state.

use std::sync::Arc;

use imweb_core::config::{FrameConfig, ImwebConfig};
use imweb_core::{Markup, RenderFn, ShutdownSignal};
use tokio_util::task::TaskTracker;

use crate::error::ServerError;
use crate::page::render_page;

/// Shared state for the axum application.
///
/// Wrapped in [`Arc`] and injected via axum's `State` extractor.
pub struct AppState<S> {
    /// Application state each session starts from.
    pub initial: S,
    /// Render callback run once per frame by every session.
    pub render: RenderFn<S>,
    /// Compiled element templates.
    pub markup: Arc<Markup>,
    /// Frame loop and event queue tuning.
    pub frame: FrameConfig,
    /// Path of the websocket endpoint.
    pub ws_path: String,
    /// Pre-rendered bootstrap page.
    pub page: String,
    /// Ends every session when fired.
    pub shutdown: ShutdownSignal,
    /// Open websocket sessions. [`serve`](crate::serve) waits for it to
    /// drain before returning.
    pub sessions: TaskTracker,
}

impl<S> AppState<S> {
    /// Build the shared state, compiling templates and rendering the page.
    pub fn new(
        initial: S,
        render: RenderFn<S>,
        config: &ImwebConfig,
        shutdown: ShutdownSignal,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self {
            initial,
            render,
            markup: Arc::new(Markup::new()?),
            frame: config.frame.clone(),
            ws_path: config.page.ws_path.clone(),
            page: render_page(&config.page)?,
            shutdown,
            sessions: TaskTracker::new(),
        })
    }
}
