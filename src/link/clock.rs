//! Clock abstraction for deterministic testing.
//!
//! Serial runs use `SystemClock` (monotonic wall time). Replays and tests use
//! `SampleClock`, which derives time from the number of samples consumed at
//! the nominal sample rate.

use std::time::{Duration, Instant};

/// Time source for session durations and command timing
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Called once for every accepted sample
    fn on_sample(&mut self) {}
}

/// Production clock using real monotonic time
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that advances by one sample period per accepted sample
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    sample_rate: u32,
    samples: u64,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            samples: 0,
        }
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl Clock for SampleClock {
    fn now(&self) -> Duration {
        let nanos = self.samples as u128 * 1_000_000_000 / self.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }

    fn on_sample(&mut self) {
        self.samples += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clock_is_exact() {
        let mut clock = SampleClock::new(512);
        for _ in 0..512 * 3 {
            clock.on_sample();
        }
        assert_eq!(clock.now(), Duration::from_secs(3));
        clock.on_sample();
        assert!(clock.now() > Duration::from_secs(3));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
