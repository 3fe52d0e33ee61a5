//! Declarative context handed to the application's render callback.
//!
//! The application declares its full UI on every frame. Each declaration is
//! reconciled against the [`ElementStore`]: a new ID yields an `ADD`, a text
//! whose content changed yields a `REPLACE`, anything else yields nothing.
//! Commands accumulate in the frame's batch; the frame loop sends them after
//! the callback returns. No I/O happens here.

use imweb_types::{Command, ElementId};
use tracing::warn;

use crate::markup::{Markup, MarkupError};
use crate::store::{ElementKind, ElementState, ElementStore};

/// Errors raised by a declaration.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The ID was first declared as a different kind of element.
    #[error("element {id} is a {found}, not a {expected}")]
    KindMismatch {
        /// The offending element.
        id: ElementId,
        /// Kind implied by the accessor that was called.
        expected: ElementKind,
        /// Kind the element was created with.
        found: ElementKind,
    },

    /// Markup for the element could not be rendered.
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Per-frame builder over a session's element store and application state.
pub struct Context<'a, S> {
    store: &'a ElementStore,
    markup: &'a Markup,
    commands: &'a mut Vec<Command>,
    state: &'a mut S,
}

impl<'a, S> Context<'a, S> {
    /// Bind a context to one frame of a session.
    pub const fn new(
        store: &'a ElementStore,
        markup: &'a Markup,
        commands: &'a mut Vec<Command>,
        state: &'a mut S,
    ) -> Self {
        Self {
            store,
            markup,
            commands,
            state,
        }
    }

    /// The session's application state.
    pub fn state(&self) -> &S {
        &*self.state
    }

    /// The session's application state, mutably.
    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    /// Commands produced so far in this frame.
    pub fn commands(&self) -> &[Command] {
        self.commands.as_slice()
    }

    /// Declare a text label.
    ///
    /// Errors are logged and the declaration is skipped.
    pub fn text(&mut self, id: impl Into<ElementId>, content: impl Into<String>) {
        if let Err(e) = self.try_text(id, content) {
            warn!(error = %e, "text declaration skipped");
        }
    }

    /// Declare a text label, reporting misuse.
    pub fn try_text(
        &mut self,
        id: impl Into<ElementId>,
        content: impl Into<String>,
    ) -> Result<(), ContextError> {
        let id = id.into();
        let content = content.into();

        let is_new = match self.store.get(id.as_str()) {
            None => true,
            Some(ElementState::Text { content: previous }) if previous == content => return Ok(()),
            Some(ElementState::Text { .. }) => false,
            Some(other) => {
                return Err(ContextError::KindMismatch {
                    id,
                    expected: ElementKind::Text,
                    found: other.kind(),
                });
            }
        };

        let html = self.markup.text(&id, &content)?;
        self.store.set(id.clone(), ElementState::Text { content });
        let command = if is_new {
            Command::add(id, html)
        } else {
            Command::replace(id, html)
        };
        self.commands.push(command);
        Ok(())
    }

    /// Declare a button. Returns `true` exactly once per observed click.
    ///
    /// Errors are logged and reported as "not clicked".
    pub fn button(&mut self, id: impl Into<ElementId>) -> bool {
        self.try_button(id).unwrap_or_else(|e| {
            warn!(error = %e, "button declaration skipped");
            false
        })
    }

    /// Declare a button, reporting misuse.
    pub fn try_button(&mut self, id: impl Into<ElementId>) -> Result<bool, ContextError> {
        let id = id.into();
        match self.store.get(id.as_str()) {
            None => {
                let html = self.markup.button(&id)?;
                self.store
                    .set(id.clone(), ElementState::Button { clicked: false });
                self.commands.push(Command::add(id, html));
                Ok(false)
            }
            Some(ElementState::Button { clicked: true }) => {
                self.store.set(id, ElementState::Button { clicked: false });
                Ok(true)
            }
            Some(ElementState::Button { clicked: false }) => Ok(false),
            Some(other) => Err(ContextError::KindMismatch {
                id,
                expected: ElementKind::Button,
                found: other.kind(),
            }),
        }
    }
}
