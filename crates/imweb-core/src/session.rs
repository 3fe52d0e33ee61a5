//! One connection's frame loop.
//!
//! A [`Session`] owns the element store, the event queue, and a private
//! copy of the application state. [`Session::run`] repeats the frame cycle
//! until the session closes:
//!
//! 1. **Pace** -- wait until one frame interval has passed since the
//!    previous frame started
//! 2. **Drain** -- apply queued events, at most one per element
//! 3. **Render** -- call the application with a fresh [`Context`]
//! 4. **Transmit** -- send the frame's commands in declaration order
//!
//! The session closes when the reader closes the queue, when a send fails
//! with a disconnect, or when shutdown is requested. A render in progress
//! always completes.

use std::collections::HashSet;
use std::sync::Arc;

use imweb_types::{Command, ElementId, Event, SessionId};
use tracing::{debug, info, trace, warn};

use crate::config::{FrameConfig, SendErrorPolicy};
use crate::context::Context;
use crate::markup::Markup;
use crate::pacing::FramePacer;
use crate::queue::EventQueue;
use crate::shutdown::ShutdownSignal;
use crate::store::{ElementState, ElementStore};
use crate::transport::{CommandSink, TransportError};

/// Application render callback, invoked once per frame.
pub type RenderFn<S> = Arc<dyn Fn(&mut Context<'_, S>) + Send + Sync>;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The reader task stopped (peer closed, read or decode error).
    ReaderClosed,
    /// A send failed because the peer is gone.
    Disconnected,
    /// Shutdown was requested.
    Shutdown,
}

impl core::fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            Self::ReaderClosed => "reader closed",
            Self::Disconnected => "disconnected",
            Self::Shutdown => "shutdown",
        };
        f.write_str(reason)
    }
}

/// Outcome of the drain step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Events applied this frame.
    pub applied: usize,
    /// Events pushed back for a later frame.
    pub deferred: usize,
}

/// Outcome of the transmit step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitReport {
    /// Commands handed to the transport.
    pub sent: usize,
    /// Commands that failed with a non-disconnect error.
    pub failed: usize,
    /// Commands not attempted because the frame was aborted.
    pub skipped: usize,
}

/// Outcome of one drain/render/transmit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Drain step.
    pub drain: DrainReport,
    /// Transmit step.
    pub transmit: TransmitReport,
}

/// Apply queued events to the store, at most one per element.
///
/// An event whose element was already updated this frame is deferred and
/// put back at the front of the queue once the queue is empty, so two
/// clicks on the same button register on two consecutive frames.
pub fn drain_events(queue: &EventQueue, store: &ElementStore) -> DrainReport {
    let mut updated: HashSet<ElementId> = HashSet::new();
    let mut deferred: Vec<Event> = Vec::new();
    let mut applied: usize = 0;

    while let Some(event) = queue.try_pop() {
        if updated.contains(&event.id) {
            deferred.push(event);
            continue;
        }
        apply_event(store, &event);
        updated.insert(event.id);
        applied = applied.saturating_add(1);
    }

    let report = DrainReport {
        applied,
        deferred: deferred.len(),
    };
    queue.requeue(deferred);
    report
}

fn apply_event(store: &ElementStore, event: &Event) {
    if !event.is_click() {
        debug!(element = %event.id, event = %event.event, "ignoring unknown event kind");
        return;
    }
    match store.must_get(event.id.as_str()) {
        ElementState::Button { .. } => {
            store.set(event.id.clone(), ElementState::Button { clicked: true });
        }
        ElementState::Text { .. } => {
            debug!(element = %event.id, "click on a non-button element ignored");
        }
    }
}

/// Send a frame's commands in order.
///
/// A disconnect stops immediately and is returned as the error. Other
/// failures are logged and counted; `policy` decides whether the rest of
/// the frame is still sent. Failed commands are not retried.
pub async fn transmit<K: CommandSink>(
    sink: &mut K,
    commands: Vec<Command>,
    policy: SendErrorPolicy,
) -> Result<TransmitReport, TransportError> {
    let mut report = TransmitReport::default();
    let total = commands.len();

    for command in commands {
        match sink.send(&command).await {
            Ok(()) => report.sent = report.sent.saturating_add(1),
            Err(e) if e.is_disconnect() => return Err(e),
            Err(e) => {
                report.failed = report.failed.saturating_add(1);
                warn!(
                    element = %command.id,
                    kind = %command.kind,
                    error = %e,
                    "command send failed"
                );
                if policy == SendErrorPolicy::AbortFrame {
                    break;
                }
            }
        }
    }

    report.skipped = total
        .saturating_sub(report.sent)
        .saturating_sub(report.failed);
    Ok(report)
}

/// State and frame loop of one connection.
pub struct Session<S> {
    id: SessionId,
    store: Arc<ElementStore>,
    queue: Arc<EventQueue>,
    markup: Arc<Markup>,
    render: RenderFn<S>,
    state: S,
    pacer: FramePacer,
    send_errors: SendErrorPolicy,
    frames: u64,
}

impl<S: Send> Session<S> {
    /// Create a session with an empty store and queue.
    pub fn new(
        id: SessionId,
        state: S,
        render: RenderFn<S>,
        markup: Arc<Markup>,
        config: &FrameConfig,
    ) -> Self {
        Self {
            id,
            store: Arc::new(ElementStore::new()),
            queue: Arc::new(EventQueue::new(config.queue_capacity, config.overflow)),
            markup,
            render,
            state,
            pacer: FramePacer::new(config.frame_interval()),
            send_errors: config.send_errors,
            frames: 0,
        }
    }

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Handle to the event queue for the reader task.
    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    /// Element states as of the last frame.
    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// The session's application state.
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Number of completed frames.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Invoke the render callback and collect the frame's commands.
    pub fn render_frame(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut ctx = Context::new(&self.store, &self.markup, &mut commands, &mut self.state);
        (self.render)(&mut ctx);
        commands
    }

    /// Run one drain/render/transmit cycle without pacing.
    pub async fn frame<K: CommandSink>(
        &mut self,
        sink: &mut K,
    ) -> Result<FrameReport, TransportError> {
        let drain = drain_events(&self.queue, &self.store);
        let commands = self.render_frame();
        let transmit = transmit(sink, commands, self.send_errors).await?;
        self.frames = self.frames.saturating_add(1);
        Ok(FrameReport { drain, transmit })
    }

    /// Run frames until the session closes.
    pub async fn run<K: CommandSink>(
        mut self,
        sink: &mut K,
        mut shutdown: ShutdownSignal,
    ) -> SessionEnd {
        info!(
            session = %self.id,
            interval = ?self.pacer.interval(),
            "session started"
        );

        let end = loop {
            tokio::select! {
                biased;
                () = shutdown.wait() => break SessionEnd::Shutdown,
                _ = self.pacer.wait() => {}
            }

            if self.queue.is_closed() {
                break SessionEnd::ReaderClosed;
            }

            match self.frame(sink).await {
                Ok(report) => trace!(
                    session = %self.id,
                    frame = self.frames,
                    applied = report.drain.applied,
                    deferred = report.drain.deferred,
                    sent = report.transmit.sent,
                    failed = report.transmit.failed,
                    "frame complete"
                ),
                Err(e) => {
                    debug!(session = %self.id, error = %e, "peer disconnected");
                    break SessionEnd::Disconnected;
                }
            }
        };

        info!(session = %self.id, reason = %end, frames = self.frames, "session ended");
        end
    }
}
