//! Simulation-time stopwatch
//!
//! Object timers advance with the fixed step rather than wall-clock time, so
//! a frame-stepped world ages identically no matter how fast it runs.

/// Elapsed simulated time in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stopwatch {
    elapsed_ms: f64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed_ms += dt as f64 * 1000.0;
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn set_elapsed_ms(&mut self, ms: f64) {
        self.elapsed_ms = ms;
    }

    pub fn is_past_ms(&self, ms: f64) -> bool {
        self.elapsed_ms > ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_accumulates_ms() {
        let mut sw = Stopwatch::new();
        sw.tick(0.5);
        sw.tick(0.25);
        assert!((sw.elapsed_ms() - 750.0).abs() < 1e-6);
        assert!(sw.is_past_ms(700.0));
        sw.reset();
        assert_eq!(sw.elapsed_ms(), 0.0);
    }
}
