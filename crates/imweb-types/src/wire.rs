//! JSON messages exchanged with the remote renderer.
//!
//! | Direction | Shape |
//! |-----------|-------|
//! | renderer -> server | `{"id": "...", "event": "clicked"}` |
//! | server -> renderer | `{"id": "...", "data": "<markup>", "kind": "ADD"}` |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ElementId;

/// Event tag sent by a button when it is pressed.
pub const CLICKED: &str = "clicked";

/// An interaction event reported by the renderer.
///
/// `event` is an open tag; [`CLICKED`] is the only value the engine acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Element the interaction happened on.
    pub id: ElementId,
    /// Kind of interaction.
    pub event: String,
}

impl Event {
    /// Build a `clicked` event for the given element.
    pub fn clicked(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            event: CLICKED.to_owned(),
        }
    }

    /// Whether this event is a click.
    pub fn is_click(&self) -> bool {
        self.event == CLICKED
    }
}

/// Patch operation applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum CommandKind {
    /// Append the markup to the document.
    Add,
    /// Remove the element with the given id. Reserved; no element emits it yet.
    Remove,
    /// Replace the element with the given id by the markup.
    Replace,
}

impl core::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Replace => "REPLACE",
        };
        f.write_str(name)
    }
}

/// A patch command sent to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Command {
    /// Target element.
    pub id: ElementId,
    /// Rendered markup (empty for [`CommandKind::Remove`]).
    pub data: String,
    /// Operation to apply.
    pub kind: CommandKind,
}

impl Command {
    /// First appearance of an element.
    pub const fn add(id: ElementId, data: String) -> Self {
        Self {
            id,
            data,
            kind: CommandKind::Add,
        }
    }

    /// New markup for an element already on the page.
    pub const fn replace(id: ElementId, data: String) -> Self {
        Self {
            id,
            data,
            kind: CommandKind::Replace,
        }
    }

    /// Removal of an element from the page.
    pub const fn remove(id: ElementId) -> Self {
        Self {
            id,
            data: String::new(),
            kind: CommandKind::Remove,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_shape() {
        let cmd = Command::add(ElementId::from("count-text"), String::from("<div>0</div>"));
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "count-text", "data": "<div>0</div>", "kind": "ADD"})
        );

        let replace = serde_json::to_value(Command::replace(ElementId::from("x"), String::new()))
            .unwrap();
        assert_eq!(replace["kind"], "REPLACE");

        let remove = serde_json::to_value(Command::remove(ElementId::from("x"))).unwrap();
        assert_eq!(remove["kind"], "REMOVE");
        assert_eq!(remove["data"], "");
    }

    #[test]
    fn event_parses_from_renderer_json() {
        let event: Event = serde_json::from_str(r#"{"id":"Increment","event":"clicked"}"#).unwrap();
        assert_eq!(event, Event::clicked("Increment"));
        assert!(event.is_click());
    }

    #[test]
    fn unknown_event_tags_are_kept() {
        let event: Event = serde_json::from_str(r#"{"id":"a","event":"hovered"}"#).unwrap();
        assert_eq!(event.event, "hovered");
        assert!(!event.is_click());
    }

    #[test]
    fn event_missing_field_is_rejected() {
        assert!(serde_json::from_str::<Event>(r#"{"id":"a"}"#).is_err());
    }

    #[test]
    fn command_kind_display_matches_wire() {
        for kind in [CommandKind::Add, CommandKind::Remove, CommandKind::Replace] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
