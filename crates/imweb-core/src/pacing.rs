//! Frame pacing.
//!
//! [`FramePacer::wait`] suspends until at least one frame interval has
//! passed since the previous frame started. It is a soft upper bound on
//! frame frequency; a slow frame simply starts the next one late. Uses
//! [`tokio::time::Instant`] so tests can drive it with a paused clock.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum spacing between frame starts.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    last: Option<Instant>,
}

impl FramePacer {
    /// Create a pacer with the given minimum spacing.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Minimum spacing between frame starts.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next frame slot and return the frame's start time.
    ///
    /// The first call returns immediately. Cancel-safe: dropping the future
    /// before it completes leaves the pacer unchanged.
    pub async fn wait(&mut self) -> Instant {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval.saturating_sub(elapsed)).await;
            }
        }
        let start = Instant::now();
        self.last = Some(start);
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_frame_is_immediate() {
        let mut pacer = FramePacer::new(Duration::from_millis(50));
        let before = Instant::now();
        let start = pacer.wait().await;
        assert_eq!(start, before);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_frames_are_at_least_one_interval_apart() {
        let interval = Duration::from_millis(50);
        let mut pacer = FramePacer::new(interval);

        let mut starts = Vec::new();
        for _ in 0..10 {
            starts.push(pacer.wait().await);
        }
        for pair in starts.windows(2) {
            if let [a, b] = pair {
                assert!(b.duration_since(*a) >= interval);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_frame_does_not_sleep_again() {
        let interval = Duration::from_millis(50);
        let mut pacer = FramePacer::new(interval);
        let first = pacer.wait().await;

        // Simulate a render that overran the interval.
        tokio::time::advance(Duration::from_millis(80)).await;
        let second = pacer.wait().await;
        assert_eq!(second.duration_since(first), Duration::from_millis(80));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_frame_sleeps_the_remainder() {
        let interval = Duration::from_millis(50);
        let mut pacer = FramePacer::new(interval);
        let first = pacer.wait().await;

        tokio::time::advance(Duration::from_millis(20)).await;
        let second = pacer.wait().await;
        let spacing = second.duration_since(first);
        assert!(spacing >= interval);
        assert!(spacing < Duration::from_millis(52));
    }
}
