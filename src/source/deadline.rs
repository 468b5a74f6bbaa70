//! Per-clip time limit.
//!
//! Frame sources block on external I/O, so a clip is given a wall-clock
//! budget that is checked between frames and between patches. A single
//! blocking read is not interrupted.

use std::time::{Duration, Instant};

/// Wall-clock budget for processing one clip.
#[derive(Debug, Clone, Copy)]
pub struct ClipDeadline {
    started: Instant,
    limit: Duration,
}

impl ClipDeadline {
    /// Starts the clock now.
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// The configured budget.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Time spent since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the elapsed time once the budget is used up.
    pub fn expired(&self) -> Option<Duration> {
        let elapsed = self.elapsed();
        (elapsed >= self.limit).then_some(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_deadline_not_expired() {
        let deadline = ClipDeadline::start(Duration::from_secs(60));
        assert!(deadline.expired().is_none());
        assert_eq!(deadline.limit(), Duration::from_secs(60));
    }

    #[test]
    fn test_expired_reports_elapsed() {
        let deadline = ClipDeadline::start(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));

        let elapsed = deadline.expired().unwrap();
        assert!(elapsed >= Duration::from_millis(5));
    }
}
