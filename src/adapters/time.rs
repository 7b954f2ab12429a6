//! Host time adapters.
//!
//! - [`SystemClock`] implements the [`Clock`] port with
//!   `std::time::Instant` (monotonic, immune to wall-clock jumps).
//! - [`WallClock`] reads milliseconds since the Unix epoch, for arrival
//!   stamps on stored events.
//! - [`StdDelay`] implements `embedded_hal::delay::DelayNs` with
//!   `thread::sleep`, for the link adapter's retry delay.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since start (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock time.  A clock set before 1970 reads as zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl Clock for WallClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Blocking delay backed by the OS scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        StdDelay.delay_ms(2);
        let b = clock.now_ms();
        assert!(b >= a + 1);
        assert_eq!(clock.uptime_secs(), 0);
    }

    #[test]
    fn wall_clock_is_past_2024() {
        // 2024-01-01T00:00:00Z
        assert!(WallClock.now_ms() > 1_704_067_200_000);
    }
}
