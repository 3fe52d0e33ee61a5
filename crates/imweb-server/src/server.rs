//! Listener lifecycle.
//!
//! Binding and serving are split so callers (and tests) can bind to port 0
//! and learn the real address before any client connects.

use std::net::SocketAddr;
use std::sync::Arc;

use imweb_core::config::ServerConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::ServerError;
use crate::router::build_router;
use crate::state::AppState;

/// Bind a TCP listener on the configured host and port.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or the port
/// cannot be bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the application on `listener` until its shutdown signal fires.
///
/// Open sessions observe the same signal and close their sockets. This
/// returns once the listener has stopped accepting, in-flight HTTP requests
/// are done, and every websocket session has finished.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve<S>(listener: TcpListener, state: Arc<AppState<S>>) -> Result<(), ServerError>
where
    S: Clone + Send + Sync + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(format!("listener has no local address: {e}")))?;
    info!(%addr, "imweb server listening");

    let mut shutdown = state.shutdown.clone();
    let sessions = state.sessions.clone();
    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")));

    sessions.close();
    info!(open = sessions.len(), "waiting for sessions to close");
    sessions.wait().await;

    result?;
    info!("imweb server stopped");
    Ok(())
}
