//! Wall-clock timing for ingestion and reduction phases.

use std::time::Instant;

/// Stopwatch reporting elapsed milliseconds.
///
/// Every parallel phase in rawstack joins its workers before returning, so a
/// `stop()` placed after a call measures the whole phase, not just the
/// calling thread's share.
#[derive(Clone, Copy, Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Resets the timer to now.
    pub fn restart(&mut self) {
        self.start = Instant::now();
    }

    /// Returns milliseconds since the last (re)start without resetting.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns milliseconds since the last (re)start and restarts the timer.
    pub fn stop(&mut self) -> f64 {
        let elapsed = self.elapsed_ms();
        self.restart();
        elapsed
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
