//! Shared type definitions for the imweb UI synchronization engine.
//!
//! This crate has no async or HTTP dependencies. It defines the identifiers
//! and the two JSON message shapes that travel over the websocket:
//!
//! - [`Event`] -- interaction reported by the renderer (e.g. `clicked`)
//! - [`Command`] -- `ADD` / `REPLACE` / `REMOVE` patch sent to the renderer
//!
//! TypeScript bindings for these types are generated by `ts-rs` into
//! `bindings/` when the tests run.

pub mod ids;
pub mod wire;

pub use ids::{ElementId, SessionId};
pub use wire::{CLICKED, Command, CommandKind, Event};
