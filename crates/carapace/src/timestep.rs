//! Fixed-timestep frame clock.
//!
//! Wall time is folded into an accumulator and paid out as whole fixed
//! simulation steps; whatever remains becomes the interpolation fraction for
//! rendering. Catch-up after a stall is clamped so a long hitch (debugger,
//! window drag) does not trigger a spiral of ever-growing update batches.

use std::time::{Duration, Instant};

/// The outcome of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Whole fixed steps to simulate this frame.
    pub updates: u32,
    /// Duration of one fixed step, in seconds.
    pub delta: f32,
    /// Fraction of the pending step already elapsed, in `0.0..1.0`. Used to
    /// interpolate rendering between the last two simulated states.
    pub alpha: f32,
}

/// Fixed-timestep accumulator.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_delta: Duration,
    max_updates_per_frame: u32,
    accumulator: Duration,
    last_tick: Option<Instant>,
}

impl FrameClock {
    /// Create a clock with the given step size and catch-up limit.
    ///
    /// Panics if `fixed_delta` is zero or `max_updates_per_frame` is zero;
    /// both are construction-time programming errors.
    pub fn new(fixed_delta: Duration, max_updates_per_frame: u32) -> Self {
        assert!(!fixed_delta.is_zero(), "fixed_delta must be non-zero");
        assert!(max_updates_per_frame > 0, "max_updates_per_frame must be non-zero");
        Self {
            fixed_delta,
            max_updates_per_frame,
            accumulator: Duration::ZERO,
            last_tick: None,
        }
    }

    /// The fixed step size.
    pub fn fixed_delta(&self) -> Duration {
        self.fixed_delta
    }

    /// Advance the clock to `now` and pay out whole simulation steps.
    pub fn tick(&mut self, now: Instant) -> FrameStep {
        let elapsed = match self.last_tick {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.accumulator += elapsed;

        let mut updates = 0;
        while self.accumulator >= self.fixed_delta && updates < self.max_updates_per_frame {
            self.accumulator -= self.fixed_delta;
            updates += 1;
        }

        // Catch-up limit hit: drop the surplus instead of carrying a debt
        // that would max out every following frame.
        if self.accumulator >= self.fixed_delta {
            tracing::debug!(
                target: "carapace::timestep",
                dropped_ms = self.accumulator.as_millis() as u64,
                "frame clock overrun, dropping accumulated time"
            );
            self.accumulator = Duration::ZERO;
        }

        FrameStep {
            updates,
            delta: self.fixed_delta.as_secs_f32(),
            alpha: self.accumulator.as_secs_f32() / self.fixed_delta.as_secs_f32(),
        }
    }

    /// Forget elapsed time, e.g. across a suspend/resume transition.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(10);

    #[test]
    fn test_first_tick_produces_no_updates() {
        let mut clock = FrameClock::new(STEP, 4);
        let step = clock.tick(Instant::now());
        assert_eq!(step.updates, 0);
        assert_eq!(step.alpha, 0.0);
    }

    #[test]
    fn test_whole_steps_are_paid_out() {
        let mut clock = FrameClock::new(STEP, 8);
        let start = Instant::now();
        clock.tick(start);

        let step = clock.tick(start + Duration::from_millis(35));
        assert_eq!(step.updates, 3);
        assert!((step.delta - 0.010).abs() < 1e-6);
        // 5ms of the next step remain: alpha is one half.
        assert!((step.alpha - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut clock = FrameClock::new(STEP, 8);
        let start = Instant::now();
        clock.tick(start);

        assert_eq!(clock.tick(start + Duration::from_millis(6)).updates, 0);
        // 6ms carried + 6ms new = one step and 2ms over.
        let step = clock.tick(start + Duration::from_millis(12));
        assert_eq!(step.updates, 1);
        assert!((step.alpha - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_catch_up_is_clamped() {
        let mut clock = FrameClock::new(STEP, 4);
        let start = Instant::now();
        clock.tick(start);

        // A one-second stall would owe 100 steps; the clamp pays 4 and
        // forgives the rest.
        let step = clock.tick(start + Duration::from_secs(1));
        assert_eq!(step.updates, 4);
        assert_eq!(step.alpha, 0.0);

        // The debt is gone: a normal frame follows.
        let step = clock.tick(start + Duration::from_secs(1) + STEP);
        assert_eq!(step.updates, 1);
    }

    #[test]
    fn test_reset_forgets_elapsed_time() {
        let mut clock = FrameClock::new(STEP, 4);
        let start = Instant::now();
        clock.tick(start);
        clock.reset();

        // Time across the reset is not owed.
        let step = clock.tick(start + Duration::from_millis(500));
        assert_eq!(step.updates, 0);
    }
}
