//! Bounded FIFO of interaction events between the reader task and the
//! frame loop.
//!
//! The reader pushes with [`EventQueue::push`]; the frame loop pops with
//! [`EventQueue::try_pop`] until empty and hands back what it could not
//! apply this frame with [`EventQueue::requeue`]. This queue is the only
//! structure written by one session task and read by the other.
//!
//! # Backpressure
//!
//! With [`OverflowPolicy::Block`] (the default) a full queue suspends the
//! reader until the frame loop drains it, so a session never reads from the
//! socket faster than it renders. With [`OverflowPolicy::DropOldest`] the
//! reader never waits; the oldest pending event is discarded instead.
//!
//! Deferred events go back to the front of the queue, ahead of anything
//! that arrived meanwhile. They do not count toward the capacity and are
//! never dropped: [`OverflowPolicy::DropOldest`] discards the oldest event
//! behind them.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use imweb_types::Event;
use tokio::sync::Notify;
use tracing::warn;

use crate::config::OverflowPolicy;

/// Errors returned to the producing side.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The session ended; no more events are accepted.
    #[error("event queue closed")]
    Closed,
}

#[derive(Debug, Default)]
struct QueueInner {
    events: VecDeque<Event>,
    /// Leading entries of `events` that were put back by `requeue`.
    deferred: usize,
    closed: bool,
    dropped: u64,
}

impl QueueInner {
    fn admitted(&self) -> usize {
        self.events.len().saturating_sub(self.deferred)
    }
}

/// Bounded, closable event queue.
#[derive(Debug)]
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    space: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` pending events.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(QueueInner {
                events: VecDeque::with_capacity(capacity),
                ..QueueInner::default()
            }),
            space: Notify::new(),
            capacity,
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event, applying the overflow policy when full.
    ///
    /// Under [`OverflowPolicy::Block`] this waits until the frame loop pops
    /// an event or the queue is closed.
    pub async fn push(&self, event: Event) -> Result<(), QueueError> {
        loop {
            // Registered before checking so a pop between the check and the
            // await still wakes us.
            let notified = self.space.notified();
            {
                let mut inner = self.lock();
                if inner.closed {
                    return Err(QueueError::Closed);
                }
                if inner.admitted() < self.capacity {
                    inner.events.push_back(event);
                    return Ok(());
                }
                if self.policy == OverflowPolicy::DropOldest {
                    let oldest_admitted = inner.deferred;
                    if let Some(oldest) = inner.events.remove(oldest_admitted) {
                        inner.dropped = inner.dropped.saturating_add(1);
                        warn!(
                            element = %oldest.id,
                            event = %oldest.event,
                            "event queue full, dropping oldest event"
                        );
                    }
                    inner.events.push_back(event);
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Pop the next event without waiting.
    pub fn try_pop(&self) -> Option<Event> {
        let event = {
            let mut inner = self.lock();
            let event = inner.events.pop_front();
            if event.is_some() {
                inner.deferred = inner.deferred.saturating_sub(1);
            }
            event
        };
        if event.is_some() {
            self.space.notify_waiters();
        }
        event
    }

    /// Put deferred events back at the front, keeping their order.
    ///
    /// Never waits, even if the queue is at capacity.
    pub fn requeue(&self, deferred: Vec<Event>) {
        if deferred.is_empty() {
            return;
        }
        let mut inner = self.lock();
        inner.deferred = inner.deferred.saturating_add(deferred.len());
        for event in deferred.into_iter().rev() {
            inner.events.push_front(event);
        }
    }

    /// Stop accepting events and wake any blocked producer.
    ///
    /// Events already queued can still be popped.
    pub fn close(&self) {
        self.lock().closed = true;
        self.space.notify_waiters();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Whether no event is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Maximum number of pending events.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Backpressure policy in effect.
    pub const fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Number of events discarded by [`OverflowPolicy::DropOldest`].
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}
