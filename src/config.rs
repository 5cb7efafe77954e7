//! # Engine Configuration
//!
//! Values fixed for the lifetime of an engine instance: how many taps it
//! owns, how long the longest echo may be, and how quickly each class of
//! parameter glides to a new value. User-facing knobs live in
//! [`crate::params`]; these are the limits those knobs are mapped into.

use crate::error::EngineError;

/// Tempo used when the host doesn't report one (or reports nonsense).
pub const DEFAULT_TEMPO_BPM: f32 = 120.0;

/// Upper bound for the host tempo. Anything faster is clamped.
pub const MAX_TEMPO_BPM: f32 = 999.0;

/// Construction-time settings for a [`DelayEngine`](crate::dsp::engine::DelayEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of independent taps. Fixed once the engine is built.
    pub tap_count: usize,

    /// Longest free-running delay a tap can be set to, in milliseconds.
    pub max_delay_ms: f32,

    /// Largest synced subdivision, counted in sixteenth notes.
    pub max_sixteenths: u32,

    /// Slowest tempo honored by synced taps. Together with
    /// `max_sixteenths` this bounds the longest synced delay, so the
    /// buffer can be sized for it up front.
    pub min_sync_tempo_bpm: f32,

    /// Glide time for delay-time changes. Longer ramps trade a brief
    /// pitch bend for freedom from clicks when the read head jumps.
    pub delay_ramp_ms: f32,

    /// Glide time for the per-channel tap gains (gain and pan).
    pub gain_ramp_ms: f32,

    /// Glide time for the dry/wet blend.
    pub blend_ramp_ms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tap_count: 16,
            max_delay_ms: 4000.0,
            max_sixteenths: 16,
            // 16 sixteenths at 30 BPM = 4 beats * 2 s = 8 s of delay.
            min_sync_tempo_bpm: 30.0,
            delay_ramp_ms: 50.0,
            gain_ramp_ms: 20.0,
            blend_ramp_ms: 20.0,
        }
    }
}

impl EngineConfig {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tap_count == 0 {
            return Err(EngineError::NoTaps);
        }
        if !(self.max_delay_ms.is_finite() && self.max_delay_ms > 0.0) {
            return Err(EngineError::InvalidMaxDelay(self.max_delay_ms));
        }
        if self.max_sixteenths == 0 {
            return Err(EngineError::InvalidSubdivisionLimit);
        }
        if !(self.min_sync_tempo_bpm.is_finite() && self.min_sync_tempo_bpm > 0.0) {
            return Err(EngineError::InvalidMinTempo(self.min_sync_tempo_bpm));
        }

        for (name, value) in [
            ("delay", self.delay_ramp_ms),
            ("gain", self.gain_ramp_ms),
            ("blend", self.blend_ramp_ms),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidRampTime { name, value });
            }
        }

        Ok(())
    }

    /// The longest delay any tap can ask for, in seconds, across both
    /// free-running and tempo-synced modes.
    ///
    /// ```text
    /// synced = (60 / min_tempo) * (max_sixteenths / 4)
    /// ```
    pub fn max_delay_seconds(&self) -> f32 {
        let free = self.max_delay_ms / 1000.0;
        let synced = (60.0 / self.min_sync_tempo_bpm) * (self.max_sixteenths as f32 / 4.0);
        free.max(synced)
    }

    /// Sanitize a tempo reported by the host.
    ///
    /// Hosts occasionally report zero, negative or NaN tempos while the
    /// transport is settling. Those fall back to [`DEFAULT_TEMPO_BPM`];
    /// everything else is clamped into the range the buffer was sized for.
    pub fn sanitize_tempo(&self, tempo_bpm: f32) -> f32 {
        if !tempo_bpm.is_finite() || tempo_bpm <= 0.0 {
            return DEFAULT_TEMPO_BPM.clamp(self.min_sync_tempo_bpm, MAX_TEMPO_BPM);
        }
        tempo_bpm.clamp(self.min_sync_tempo_bpm, MAX_TEMPO_BPM)
    }
}
