//! Reconciliation engine for server-driven UIs.
//!
//! Application code declares, on every frame, the text labels and buttons
//! it wants on the page. The engine diffs each declaration against what it
//! sent before and produces the minimal `ADD` / `REPLACE` commands for the
//! remote renderer, while feeding click events from the renderer back into
//! the next frame.
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - [`store::ElementStore`] -- last-rendered state per element
//! - [`queue::EventQueue`] -- bounded event buffer between the reader task
//!   and the frame loop; the only cross-task structure besides the store
//! - [`context::Context`] -- the per-frame builder passed to the app
//! - [`session::Session`] -- paces, drains, renders, and transmits
//! - [`transport::CommandSink`] -- outbound seam implemented by the server
//!
//! Sessions share nothing with each other. This crate has no HTTP
//! dependency; see `imweb-server` for the websocket transport.

pub mod config;
pub mod context;
pub mod markup;
pub mod pacing;
pub mod queue;
pub mod session;
pub mod shutdown;
pub mod store;
pub mod transport;

pub use config::{FrameConfig, ImwebConfig, OverflowPolicy, SendErrorPolicy};
pub use context::{Context, ContextError};
pub use markup::{Markup, MarkupError};
pub use queue::{EventQueue, QueueError};
pub use session::{RenderFn, Session, SessionEnd};
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use store::{ElementKind, ElementState, ElementStore};
pub use transport::{CommandSink, TransportError};
