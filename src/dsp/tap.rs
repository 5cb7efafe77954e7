//! # Tap
//!
//! A tap is one echo voice: it reads the delay buffer at its own delay
//! time, scales the result by its own gain, places it in the stereo field
//! with its own pan, and adds it to the shared wet signal. The engine runs
//! all taps one after another over the same buffer.
//!
//! ## Delay Time: Free or Synced
//!
//! A free-running tap converts milliseconds to samples:
//!
//! ```text
//! delay_samples = sample_rate * delay_ms / 1000
//! ```
//!
//! A synced tap counts sixteenth notes at the host tempo. One beat (a
//! quarter note) lasts `60 / bpm` seconds and holds four sixteenths:
//!
//! ```text
//! delay_samples = sample_rate * (60 / bpm) * (sixteenths / 4)
//! ```
//!
//! At 120 BPM and 48 kHz, 4 sixteenths = one beat = 0.5 s = 24000 samples.
//!
//! ## Equal-Power Panning
//!
//! A linear pan law (`left = 1 - pan`, `right = pan`) sounds quieter in the
//! middle: both channels at 0.5 carry only half the power of one channel at
//! 1.0. Sine curves keep `left² + right²` constant instead:
//!
//! ```text
//! left  = sin(π/2 * (1 - pan)) * gain
//! right = sin(π/2 * pan)       * gain
//! ```
//!
//! At centre both channels get `sin(π/4) ≈ 0.7071`, and
//! `0.7071² + 0.7071² = 1`.

use std::f32::consts::FRAC_PI_2;

use crate::config::DEFAULT_TEMPO_BPM;
use crate::dsp::delay_buffer::DelayBuffer;
use crate::dsp::smoother::Smoother;
use crate::dsp::NUM_CHANNELS;

/// The plain-number parameters of one tap, as read from the parameter
/// store once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapSettings {
    /// Free-running delay time in milliseconds.
    pub delay_ms: f32,

    /// Use `sixteenths` at the host tempo instead of `delay_ms`.
    pub sync: bool,

    /// Synced delay time, in sixteenth notes.
    pub sixteenths: u32,

    /// Level of the echo, 0-100.
    pub gain_percent: f32,

    /// Stereo position, 0 (hard left) to 100 (hard right). 50 is centre.
    pub pan_percent: f32,
}

impl Default for TapSettings {
    fn default() -> Self {
        Self {
            delay_ms: 250.0,
            sync: false,
            sixteenths: 4,
            gain_percent: 0.0,
            pan_percent: 50.0,
        }
    }
}

/// One delayed voice with its own smoothed delay time and channel gains.
#[derive(Debug, Clone)]
pub struct Tap {
    settings: TapSettings,

    /// Delay time in (possibly fractional) samples. Buffer reads always
    /// use this smoothed value, never the raw target, so tempo changes,
    /// sync toggles and knob jumps glide instead of clicking.
    delay_samples: Smoother,

    /// Left and right gains, each the product of tap gain and pan curve.
    gains: [Smoother; NUM_CHANNELS],
}

impl Tap {
    pub fn new(settings: TapSettings) -> Self {
        Self {
            settings,
            delay_samples: Smoother::default(),
            gains: [Smoother::default(), Smoother::default()],
        }
    }

    pub fn settings(&self) -> TapSettings {
        self.settings
    }

    /// Store a new parameter snapshot. Takes effect at the next
    /// [`update_targets()`](Self::update_targets).
    pub fn set_settings(&mut self, settings: TapSettings) {
        self.settings = settings;
    }

    /// The unsmoothed delay time in samples for the current settings.
    ///
    /// A non-positive or non-finite tempo falls back to
    /// [`DEFAULT_TEMPO_BPM`] instead of dividing by zero.
    pub fn compute_delay_samples(&self, sample_rate: f32, tempo_bpm: f32) -> f32 {
        if self.settings.sync {
            let tempo = if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
                tempo_bpm
            } else {
                DEFAULT_TEMPO_BPM
            };
            sample_rate * (60.0 / tempo) * (self.settings.sixteenths as f32 / 4.0)
        } else {
            sample_rate * (self.settings.delay_ms.max(0.0) / 1000.0)
        }
    }

    /// Equal-power left/right gains for a gain and pan given in percent.
    pub fn compute_channel_gains(gain_percent: f32, pan_percent: f32) -> (f32, f32) {
        let gain = (gain_percent / 100.0).clamp(0.0, 1.0);
        let pan = (pan_percent / 100.0).clamp(0.0, 1.0);

        let left = (FRAC_PI_2 * (1.0 - pan)).sin() * gain;
        let right = (FRAC_PI_2 * pan).sin() * gain;
        (left, right)
    }

    /// Snap every smoother to the current settings and set ramp lengths
    /// for a new sample rate. Called while preparing.
    pub(crate) fn reset(
        &mut self,
        sample_rate: f32,
        tempo_bpm: f32,
        max_delay_samples: f32,
        delay_ramp_seconds: f32,
        gain_ramp_seconds: f32,
    ) {
        let delay = self
            .compute_delay_samples(sample_rate, tempo_bpm)
            .clamp(0.0, max_delay_samples);
        self.delay_samples.reset(delay, sample_rate, delay_ramp_seconds);

        let (left, right) =
            Self::compute_channel_gains(self.settings.gain_percent, self.settings.pan_percent);
        self.gains[0].reset(left, sample_rate, gain_ramp_seconds);
        self.gains[1].reset(right, sample_rate, gain_ramp_seconds);
    }

    /// Point the smoothers at the values for this block. Synced delays
    /// are recomputed from the tempo every block.
    pub(crate) fn update_targets(
        &mut self,
        sample_rate: f32,
        tempo_bpm: f32,
        max_delay_samples: f32,
    ) {
        let delay = self
            .compute_delay_samples(sample_rate, tempo_bpm)
            .clamp(0.0, max_delay_samples);
        self.delay_samples.set_target(delay);

        let (left, right) =
            Self::compute_channel_gains(self.settings.gain_percent, self.settings.pan_percent);
        self.gains[0].set_target(left);
        self.gains[1].set_target(right);
    }

    /// Add this tap's echo for one block into `wet`.
    ///
    /// `write_pos` is the buffer's write position *before* this block's
    /// advance; sample `i` of the block reads `delay` samples behind
    /// `write_pos + i`. Output is always added, never assigned, because
    /// every tap shares the same `wet` buffer.
    pub fn render(
        &mut self,
        buffer: &DelayBuffer,
        write_pos: usize,
        wet: &mut [Vec<f32>],
        len: usize,
    ) {
        if self.is_silent() {
            // Keep the delay ramp moving so the tap is in the right place
            // when it's turned back up.
            self.delay_samples.skip(len);
            return;
        }

        let channels = wet.len().min(NUM_CHANNELS).min(buffer.num_channels());
        let delay = self.delay_samples.current();

        if !self.delay_samples.is_smoothing() && delay.fract() == 0.0 {
            // Steady whole-sample delay: the block's source samples are one
            // contiguous (or wrap-split) run of the buffer.
            let offset = write_pos as isize - buffer.write_position() as isize + len as isize
                - delay as isize;
            for (channel, gain) in self.gains.iter_mut().enumerate() {
                if channel >= channels {
                    gain.skip(len);
                    continue;
                }
                let view = buffer.read(channel, offset, len);
                for (out, sample) in wet[channel][..len].iter_mut().zip(view.iter()) {
                    *out += sample * gain.tick();
                }
            }
            return;
        }

        for i in 0..len {
            let delay = self.delay_samples.tick();
            for (channel, gain) in self.gains.iter_mut().enumerate() {
                let gain = gain.tick();
                if channel < channels {
                    wet[channel][i] += buffer.read_at(channel, write_pos + i, delay) * gain;
                }
            }
        }
    }

    /// The smoothed delay time currently used for reads, in samples.
    pub fn delay_samples(&self) -> f32 {
        self.delay_samples.current()
    }

    /// The delay time this tap is heading for, in samples.
    pub fn target_delay_samples(&self) -> f32 {
        self.delay_samples.target()
    }

    /// Whether the tap contributes anything, now or once its gain ramps finish.
    pub fn is_audible(&self) -> bool {
        self.gains
            .iter()
            .any(|g| g.current() != 0.0 || g.target() != 0.0)
    }

    fn is_silent(&self) -> bool {
        self.gains
            .iter()
            .all(|g| !g.is_smoothing() && g.current() == 0.0)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
