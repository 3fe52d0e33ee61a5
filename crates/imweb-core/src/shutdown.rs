//! Cooperative shutdown signal shared by the listener and every session.

use tokio::sync::watch;

/// Fires the shutdown signal. Dropping it without firing means shutdown
/// never happens.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Another receiver for the same signal.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side of the shutdown signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested. Cancel-safe.
    pub async fn wait(&mut self) {
        let sender_gone = self.rx.wait_for(|triggered| *triggered).await.is_err();
        if sender_gone {
            // Trigger dropped without firing.
            std::future::pending::<()>().await;
        }
    }
}

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn trigger_wakes_every_signal() {
        let (trigger, mut first) = shutdown_channel();
        let mut second = trigger.signal();
        assert!(!first.is_triggered());

        trigger.trigger();
        first.wait().await;
        second.wait().await;
        assert!(second.is_triggered());
    }

    #[tokio::test]
    async fn signal_cloned_after_trigger_is_already_set() {
        let (trigger, signal) = shutdown_channel();
        trigger.trigger();
        let mut late = signal.clone();
        late.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trigger_never_fires() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);
        let waited = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;
        assert!(waited.is_err());
    }
}
