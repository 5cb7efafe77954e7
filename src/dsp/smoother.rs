//! # Parameter Smoother
//!
//! When a user moves a knob, the parameter value jumps instantly. In
//! audio, instant jumps create discontinuities: a gain that steps from
//! 0.2 to 0.8 between two samples is heard as a click, and a delay read
//! head that leaps 10000 samples splices two unrelated pieces of audio
//! together. Every externally driven value in the signal path therefore
//! passes through a [`Smoother`] that glides from the old value to the
//! new one over a short ramp (tens of milliseconds).
//!
//! ## Linear Ramps
//!
//! A new target sets up a fixed number of equal steps:
//!
//! ```text
//! step = (target - current) / ramp_len
//! ```
//!
//! Each [`tick()`](Smoother::tick) adds one step and counts down. The last
//! step assigns the target directly instead of adding, so the ramp always
//! lands *exactly* on the target. That matters for delay times: they are
//! stored in samples (values up to several hundred thousand), where an
//! exponential approach in `f32` stalls a few samples short once each
//! increment drops below the float's resolution.

/// A value that ramps linearly toward its target, one step per call.
#[derive(Debug, Clone)]
pub struct Smoother {
    current: f32,
    target: f32,

    /// Amount added per step while ramping.
    step: f32,

    /// Steps left until `current` reaches `target`.
    steps_left: u32,

    /// Length of a full ramp, in steps (samples).
    ramp_len: u32,
}

impl Smoother {
    /// A smoother resting at `value` with no ramp configured. Call
    /// [`reset()`](Self::reset) once the sample rate is known.
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            steps_left: 0,
            ramp_len: 0,
        }
    }

    /// Snap to `value` and recompute the ramp length for `sample_rate`.
    ///
    /// Called on every prepare. Skipping it after a sample-rate change
    /// doesn't break anything, but ramps would run too fast or too slow.
    pub fn reset(&mut self, value: f32, sample_rate: f32, ramp_seconds: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.steps_left = 0;
        self.ramp_len = (sample_rate * ramp_seconds).round().max(0.0) as u32;
    }

    /// Start gliding toward `target`. `current` doesn't move until the
    /// next [`tick()`](Self::tick).
    ///
    /// Setting the target it's already heading for is a no-op, so this
    /// can be called once per block with the latest parameter value
    /// without restarting the ramp every time.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }

        self.target = target;
        if self.ramp_len == 0 {
            self.current = target;
            self.steps_left = 0;
        } else {
            self.steps_left = self.ramp_len;
            self.step = (target - self.current) / self.ramp_len as f32;
        }
    }

    /// Advance one step and return the new value.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        if self.steps_left > 0 {
            self.steps_left -= 1;
            self.current = if self.steps_left == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    /// Advance `steps` steps at once and return the new value.
    ///
    /// Equivalent to calling [`tick()`](Self::tick) `steps` times, for
    /// callers that only need the value once per block.
    #[inline]
    pub fn skip(&mut self, steps: usize) -> f32 {
        if self.steps_left == 0 {
            return self.current;
        }

        let steps = u32::try_from(steps).unwrap_or(u32::MAX);
        if steps >= self.steps_left {
            self.steps_left = 0;
            self.current = self.target;
        } else {
            self.steps_left -= steps;
            self.current += self.step * steps as f32;
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether a ramp is still in progress.
    pub fn is_smoothing(&self) -> bool {
        self.steps_left > 0
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
