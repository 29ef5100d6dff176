//! Frame clock for tick-driven systems.
//!
//! [`FrameClock`] measures the wall-clock time between ticks. The system
//! resets it whenever it (re)gains the ability to tick (on attach, on
//! renderer discovery, on `play()`), so stale elapsed time is never
//! integrated into the simulation in one burst.

use std::time::Instant;

/// Wall-clock delta source.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock referenced to now.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            frame_count: 0,
        }
    }

    /// Re-reference the clock to now, discarding accumulated time.
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }

    /// Seconds since the previous tick (or the last reset).
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.frame_count += 1;
        delta
    }

    /// Total ticks taken since creation.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_tick_measures_elapsed_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();
        assert!(delta >= 0.009);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_reset_discards_accumulated_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        clock.reset();
        let delta = clock.tick();
        assert!(delta < 0.009);
    }
}
