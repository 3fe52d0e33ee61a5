//! Error types for the imweb server.
//!
//! Session-level failures never reach this type: they end their own
//! session and are logged. [`ServerError`] covers startup and the listener.

use imweb_core::MarkupError;
use imweb_core::config::ConfigError;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Element templates failed to compile.
    #[error("markup error: {0}")]
    Markup(#[from] MarkupError),

    /// The bootstrap page failed to render.
    #[error("bootstrap page error: {0}")]
    Page(#[from] minijinja::Error),

    /// A value embedded in the bootstrap page could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
