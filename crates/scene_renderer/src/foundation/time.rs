//! Wall-clock timing of CPU-side frame stages

use std::time::{Duration, Instant};

/// Measures time since it was started
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Start timing now
    pub fn start_new() -> Self {
        Self { started: Instant::now() }
    }

    /// Time since [`Stopwatch::start_new`]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let stopwatch = Stopwatch::start_new();
        let first = stopwatch.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(stopwatch.elapsed() >= first + Duration::from_millis(2));
    }
}
