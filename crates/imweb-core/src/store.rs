//! Per-session store of last-rendered element state.
//!
//! The frame loop is the only writer today, but the reader task and future
//! element kinds may touch the store from other tasks, so access goes
//! through an internal [`RwLock`]. Locks are never held across an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use imweb_types::ElementId;

/// Kind of an element, fixed by the first declaration of its ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Declared with `text`.
    Text,
    /// Declared with `button`.
    Button,
}

impl core::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Button => f.write_str("button"),
        }
    }
}

/// Last-rendered state of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementState {
    /// A text label and the content last sent for it.
    Text {
        /// Content of the last `ADD`/`REPLACE`.
        content: String,
    },
    /// A button and its pending one-shot click flag.
    Button {
        /// Set by the frame loop on a click, cleared when the app observes it.
        clicked: bool,
    },
}

impl ElementState {
    /// The kind of element this state belongs to.
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Text { .. } => ElementKind::Text,
            Self::Button { .. } => ElementKind::Button,
        }
    }
}

impl Default for ElementState {
    fn default() -> Self {
        Self::Text {
            content: String::new(),
        }
    }
}

/// Concurrent map from element ID to its last-rendered state.
#[derive(Debug, Default)]
pub struct ElementStore {
    elems: RwLock<HashMap<ElementId, ElementState>>,
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an element. `None` means the ID was never declared.
    pub fn get(&self, id: &str) -> Option<ElementState> {
        self.elems
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Look up an element, falling back to an empty text state.
    ///
    /// This masks a missing key. Only use it where the element is known to
    /// exist, or where the fallback is harmless.
    pub fn must_get(&self, id: &str) -> ElementState {
        self.get(id).unwrap_or_default()
    }

    /// Insert or overwrite the state of an element.
    pub fn set(&self, id: ElementId, state: ElementState) {
        self.elems
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, state);
    }

    /// Whether the ID has been declared.
    pub fn contains(&self, id: &str) -> bool {
        self.elems
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Number of declared elements.
    pub fn len(&self) -> usize {
        self.elems.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no element has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
