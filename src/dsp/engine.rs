//! # Delay Engine
//!
//! The engine owns the delay buffer and every tap, and turns one block of
//! dry input into one block of dry + wet output, in place.
//!
//! ## The Per-Block Pipeline
//!
//! ```text
//!            ┌──────────────────────────────────────────────────────┐
//! Input ──►  │ 1. upmix  (mono → both channels)                     │
//!            │ 2. write  block → delay buffer at write_pos          │
//!            │ 3. taps   each tap reads behind write_pos, adds into │
//!            │           the shared wet buffer (tap 0, 1, 2, ...)   │
//!            │ 4. advance write_pos += block length                 │
//!            │ 5. mix    out = dry * (1 - wet%) + wet * wet%        │
//!            └──────────────────────────────────────────────────────┘ ──► Output
//! ```
//!
//! The order is strict. Taps must read *after* the block is written (a
//! delay shorter than the block reads this block's own input) and
//! *before* the advance (so "N samples ago" is measured from where the
//! block started).
//!
//! ## Lifecycle
//!
//! ```text
//!   Unprepared ──prepare()──► Prepared ──release()──► Released
//!                               ▲  │                     │
//!                               └──┘ prepare()           │
//!                               ▲                        │
//!                               └────────prepare()───────┘
//! ```
//!
//! Only `prepare()` allocates. `process()` in any state but Prepared leaves
//! the audio untouched.

use std::num::NonZeroUsize;

use nih_plug::{nih_debug_assert_failure, nih_log, nih_warn};

use crate::config::{EngineConfig, DEFAULT_TEMPO_BPM};
use crate::dsp::delay_buffer::DelayBuffer;
use crate::dsp::smoother::Smoother;
use crate::dsp::tap::{Tap, TapSettings};
use crate::dsp::NUM_CHANNELS;
use crate::error::EngineError;

/// Where the engine reads its parameters from each block.
///
/// The plugin's atomic parameter tree implements this, as does the plain
/// [`DelaySettings`] snapshot. The engine never sees how the values are
/// stored or synchronized, only the numbers.
pub trait ParameterSource {
    /// Settings for tap `index`, or `None` if the source has no such tap.
    fn tap_settings(&self, index: usize) -> Option<TapSettings>;

    /// Dry/wet blend, 0 (all dry) to 100 (all wet).
    fn blend_percent(&self) -> f32;
}

/// A plain, owned set of engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DelaySettings {
    pub taps: Vec<TapSettings>,
    pub blend_percent: f32,
}

impl ParameterSource for DelaySettings {
    fn tap_settings(&self, index: usize) -> Option<TapSettings> {
        self.taps.get(index).copied()
    }

    fn blend_percent(&self) -> f32 {
        self.blend_percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No buffers yet. Only `prepare()` does anything.
    Unprepared,
    /// Buffers sized for the current sample rate; processing audio.
    Prepared,
    /// Idle after `release()`. Buffers are kept for a later `prepare()`.
    Released,
}

/// The multi-tap delay: a shared delay buffer, N taps, and a dry/wet mix.
pub struct DelayEngine {
    config: EngineConfig,
    state: EngineState,

    sample_rate: f32,

    /// Sanitized tempo of the most recent block.
    tempo_bpm: f32,

    /// Largest block `process()` handles in one pass. Longer blocks are
    /// split into chunks of this size.
    max_block_size: usize,

    /// Longest delay any tap may read, in samples.
    max_delay_samples: f32,

    buffer: DelayBuffer,

    /// Accumulation buffer the taps add into, one `max_block_size` slice
    /// per channel. Silent between blocks.
    wet: Vec<Vec<f32>>,

    taps: Vec<Tap>,

    blend_percent: f32,

    /// Wet fraction (0.0-1.0) of the output.
    blend: Smoother,
}

impl DelayEngine {
    /// Build an engine with `config.tap_count` taps at their default
    /// settings. Nothing is sized for audio until [`prepare()`](Self::prepare).
    pub fn new(config: EngineConfig) -> Self {
        let taps = vec![Tap::new(TapSettings::default()); config.tap_count];
        let blend_percent = 100.0;

        Self {
            config,
            state: EngineState::Unprepared,
            // Placeholder until prepare() tells us the real rate.
            sample_rate: 44100.0,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            max_block_size: 0,
            max_delay_samples: 0.0,
            buffer: DelayBuffer::new(NUM_CHANNELS, NonZeroUsize::MIN),
            wet: Vec::new(),
            taps,
            blend_percent,
            blend: Smoother::new(blend_percent / 100.0),
        }
    }

    /// Whether the engine can run with `inputs` input and `outputs`
    /// output channels: stereo out, with mono or stereo in.
    pub fn check_layout(inputs: usize, outputs: usize) -> Result<(), EngineError> {
        if outputs == NUM_CHANNELS && (1..=NUM_CHANNELS).contains(&inputs) {
            Ok(())
        } else {
            Err(EngineError::UnsupportedLayout { inputs, outputs })
        }
    }

    /// Size every buffer for `sample_rate` and `max_block_size`, clear them
    /// to silence, and snap all smoothers to the current parameters.
    ///
    /// This is the only method that allocates. On error the engine keeps
    /// its previous state.
    ///
    /// ## Buffer Size
    ///
    /// ```text
    /// capacity = ceil(sample_rate * max_delay_seconds) + max_block_size
    /// ```
    ///
    /// The extra block means the longest delay never reads a slot that the
    /// current block has already overwritten.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), EngineError> {
        if let Err(err) = self.try_prepare(sample_rate, max_block_size) {
            nih_warn!("refusing to prepare delay engine: {}", err);
            return Err(err);
        }

        nih_log!(
            "delay engine prepared: {} Hz, {} samples per block, {} taps, {} samples of delay memory",
            self.sample_rate,
            self.max_block_size,
            self.taps.len(),
            self.buffer.capacity()
        );
        Ok(())
    }

    fn try_prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), EngineError> {
        self.config.validate()?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(EngineError::EmptyBlock);
        }

        let max_delay = (sample_rate * self.config.max_delay_seconds()).ceil() as usize;
        if max_block_size > max_delay {
            return Err(EngineError::BlockTooLarge {
                block: max_block_size,
                max_delay,
            });
        }
        let capacity = NonZeroUsize::new(max_delay + max_block_size).ok_or(EngineError::EmptyBlock)?;

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.max_delay_samples = max_delay as f32;

        self.buffer.resize(NUM_CHANNELS, capacity);
        self.wet = vec![vec![0.0; max_block_size]; NUM_CHANNELS];
        self.reset_smoothers();

        self.state = EngineState::Prepared;
        Ok(())
    }

    /// Stop processing. Buffers stay allocated; the next `prepare()`
    /// reuses or resizes them.
    pub fn release(&mut self) {
        if self.state == EngineState::Prepared {
            nih_log!("delay engine released");
            self.state = EngineState::Released;
        }
    }

    /// Silence the delay memory and snap every smoother to its current
    /// target, so stale echoes don't play when the transport restarts.
    /// Allocation-free.
    pub fn clear(&mut self) {
        self.buffer.clear();
        for channel in &mut self.wet {
            channel.fill(0.0);
        }
        self.reset_smoothers();
    }

    fn reset_smoothers(&mut self) {
        let delay_ramp = self.config.delay_ramp_ms / 1000.0;
        let gain_ramp = self.config.gain_ramp_ms / 1000.0;
        for tap in &mut self.taps {
            tap.reset(
                self.sample_rate,
                self.tempo_bpm,
                self.max_delay_samples,
                delay_ramp,
                gain_ramp,
            );
        }
        self.blend.reset(
            self.blend_percent / 100.0,
            self.sample_rate,
            self.config.blend_ramp_ms / 1000.0,
        );
    }

    // ─── Parameters ──────────────────────────────────────────────────

    /// Pull every tap's settings and the blend from `source`. Taps the
    /// source doesn't know about keep their current settings.
    pub fn load_parameters(&mut self, source: &impl ParameterSource) {
        for (index, tap) in self.taps.iter_mut().enumerate() {
            if let Some(settings) = source.tap_settings(index) {
                tap.set_settings(settings);
            }
        }
        self.blend_percent = source.blend_percent();
    }

    /// Replace one tap's settings. Out-of-range indices are ignored.
    pub fn set_tap(&mut self, index: usize, settings: TapSettings) {
        if let Some(tap) = self.taps.get_mut(index) {
            tap.set_settings(settings);
        }
    }

    pub fn tap_settings(&self, index: usize) -> Option<TapSettings> {
        self.taps.get(index).map(Tap::settings)
    }

    pub fn set_blend_percent(&mut self, blend_percent: f32) {
        self.blend_percent = blend_percent;
    }

    pub fn blend_percent(&self) -> f32 {
        self.blend_percent
    }

    /// A snapshot of every current parameter value.
    pub fn settings(&self) -> DelaySettings {
        DelaySettings {
            taps: self.taps.iter().map(Tap::settings).collect(),
            blend_percent: self.blend_percent,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn tempo_bpm(&self) -> f32 {
        self.tempo_bpm
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn max_delay_samples(&self) -> f32 {
        self.max_delay_samples
    }

    /// Length of each channel's ring in the delay buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn write_position(&self) -> usize {
        self.buffer.write_position()
    }

    /// How long echoes keep sounding after the input stops: the longest
    /// delay among taps that are (or are heading to be) audible.
    pub fn tail_samples(&self) -> u32 {
        self.taps
            .iter()
            .filter(|tap| tap.is_audible())
            .map(|tap| tap.delay_samples().max(tap.target_delay_samples()))
            .fold(0.0_f32, f32::max)
            .ceil() as u32
    }

    // ─── Processing ──────────────────────────────────────────────────

    /// Process one block in place.
    ///
    /// `block` holds one slice per output channel (always stereo). The
    /// first `input_channels` of them carry input audio; the rest are
    /// filled from the inputs before processing. `tempo_bpm` is the host
    /// tempo; invalid values fall back to a default.
    ///
    /// Never allocates, never blocks, never fails.
    pub fn process(&mut self, block: &mut [&mut [f32]], input_channels: usize, tempo_bpm: f32) {
        if self.state != EngineState::Prepared {
            return;
        }
        if block.len() != NUM_CHANNELS {
            nih_debug_assert_failure!(
                "expected {} output channels, got {}",
                NUM_CHANNELS,
                block.len()
            );
            return;
        }

        let len = block.iter().map(|channel| channel.len()).min().unwrap_or(0);
        if len == 0 {
            return;
        }

        // 1. Channel normalization: copy inputs cyclically into any
        //    output channel that has no input of its own.
        let input_channels = input_channels.clamp(1, NUM_CHANNELS);
        for channel in input_channels..NUM_CHANNELS {
            let (sources, targets) = block.split_at_mut(channel);
            targets[0][..len].copy_from_slice(&sources[channel % input_channels][..len]);
        }

        // Targets are refreshed once per block. Synced delays follow the
        // tempo reported for this block.
        self.tempo_bpm = self.config.sanitize_tempo(tempo_bpm);
        for tap in &mut self.taps {
            tap.update_targets(self.sample_rate, self.tempo_bpm, self.max_delay_samples);
        }
        self.blend.set_target((self.blend_percent / 100.0).clamp(0.0, 1.0));

        let mut start = 0;
        while start < len {
            let end = (start + self.max_block_size).min(len);
            self.process_chunk(block, start, end);
            start = end;
        }
    }

    /// Run the write / taps / advance / mix pipeline over
    /// `block[..][start..end]`, which is at most `max_block_size` long.
    fn process_chunk(&mut self, block: &mut [&mut [f32]], start: usize, end: usize) {
        let len = end - start;

        // 2. Write phase.
        for (channel, samples) in block.iter().enumerate() {
            self.buffer.write(channel, &samples[start..end]);
        }

        // 3. Tap phase, in index order, all reading relative to the
        //    pre-advance write position.
        let write_pos = self.buffer.write_position();
        for tap in &mut self.taps {
            tap.render(&self.buffer, write_pos, &mut self.wet, len);
        }

        // 4. Advance phase.
        self.buffer.advance(len);

        // 5. Mix phase. The blend ramps per sample so a moving dry/wet
        //    knob never steps at block boundaries.
        for i in 0..len {
            let wet_fraction = self.blend.tick();
            let dry_fraction = 1.0 - wet_fraction;
            for (samples, wet) in block.iter_mut().zip(&self.wet) {
                let sample = &mut samples[start + i];
                *sample = *sample * dry_fraction + wet[i] * wet_fraction;
            }
        }

        for wet in &mut self.wet {
            wet[..len].fill(0.0);
        }
    }
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// At 1 kHz, a delay of N ms is exactly N samples.
    const SAMPLE_RATE: f32 = 1000.0;

    fn instant_config(tap_count: usize) -> EngineConfig {
        EngineConfig {
            tap_count,
            delay_ramp_ms: 0.0,
            gain_ramp_ms: 0.0,
            blend_ramp_ms: 0.0,
            ..EngineConfig::default()
        }
    }

    fn prepared(tap_count: usize, block: usize) -> DelayEngine {
        let mut engine = DelayEngine::new(instant_config(tap_count));
        engine.prepare(SAMPLE_RATE, block).unwrap();
        engine
    }

    fn tap(delay_ms: f32, gain_percent: f32, pan_percent: f32) -> TapSettings {
        TapSettings {
            delay_ms,
            gain_percent,
            pan_percent,
            ..TapSettings::default()
        }
    }

    fn run(engine: &mut DelayEngine, left: &mut [f32], right: &mut [f32], inputs: usize) {
        let mut block: [&mut [f32]; 2] = [left, right];
        engine.process(&mut block, inputs, 120.0);
    }

    #[test]
    fn test_starts_unprepared_and_passes_audio_through() {
        let mut engine = DelayEngine::default();
        assert_eq!(engine.state(), EngineState::Unprepared);

        let mut left = [0.5, -0.5, 0.25];
        let mut right = [0.1, 0.2, 0.3];
        run(&mut engine, &mut left, &mut right, 2);
        assert_eq!(left, [0.5, -0.5, 0.25]);
        assert_eq!(right, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_prepare_sizes_buffer() {
        let engine = prepared(4, 64);
        assert_eq!(engine.state(), EngineState::Prepared);
        // 8 s of synced delay at 1 kHz plus one block of headroom.
        assert_eq!(engine.max_delay_samples(), 8000.0);
        assert_eq!(engine.capacity(), 8064);
        assert_eq!(engine.write_position(), 0);
        assert_eq!(engine.max_block_size(), 64);
        assert_eq!(engine.sample_rate(), SAMPLE_RATE);
        assert_eq!(engine.config().tap_count, 4);
        assert_eq!(engine.taps().len(), engine.config().tap_count);
    }

    #[test]
    fn test_prepare_rejects_bad_configuration() {
        let mut engine = DelayEngine::default();
        assert_eq!(
            engine.prepare(0.0, 64),
            Err(EngineError::InvalidSampleRate(0.0))
        );
        assert!(matches!(
            engine.prepare(f32::NAN, 64),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert_eq!(engine.prepare(48000.0, 0), Err(EngineError::EmptyBlock));
        assert_eq!(
            engine.prepare(10.0, 4096),
            Err(EngineError::BlockTooLarge {
                block: 4096,
                max_delay: 80,
            })
        );
        assert_eq!(engine.state(), EngineState::Unprepared);

        let mut engine = DelayEngine::new(EngineConfig {
            tap_count: 0,
            ..EngineConfig::default()
        });
        assert_eq!(engine.prepare(48000.0, 64), Err(EngineError::NoTaps));
    }

    #[test]
    fn test_check_layout() {
        assert!(DelayEngine::check_layout(2, 2).is_ok());
        assert!(DelayEngine::check_layout(1, 2).is_ok());
        assert_eq!(
            DelayEngine::check_layout(2, 1),
            Err(EngineError::UnsupportedLayout {
                inputs: 2,
                outputs: 1
            })
        );
        assert!(DelayEngine::check_layout(0, 2).is_err());
        assert!(DelayEngine::check_layout(6, 6).is_err());
    }

    #[test]
    fn test_release_and_reprepare() {
        let mut engine = prepared(2, 16);
        engine.set_blend_percent(0.0);
        engine.release();
        assert_eq!(engine.state(), EngineState::Released);

        // Released engines leave audio alone and keep their buffers.
        let mut left = [1.0; 4];
        let mut right = [1.0; 4];
        engine.set_blend_percent(100.0);
        run(&mut engine, &mut left, &mut right, 2);
        assert_eq!(left, [1.0; 4]);
        assert_eq!(engine.write_position(), 0);

        engine.prepare(2000.0, 32).unwrap();
        assert_eq!(engine.state(), EngineState::Prepared);
        assert_eq!(engine.sample_rate(), 2000.0);
        assert_eq!(engine.capacity(), 16032);
    }

    #[test]
    fn test_write_position_advances_and_wraps() {
        let mut engine = prepared(1, 1000);
        let capacity = engine.capacity();
        let mut left = vec![0.0; 1000];
        let mut right = vec![0.0; 1000];

        let mut expected = 0;
        for _ in 0..20 {
            run(&mut engine, &mut left, &mut right, 2);
            expected = (expected + 1000) % capacity;
            assert_eq!(engine.write_position(), expected);
        }
    }

    /// Blend at 0% with silent taps is an exact bypass.
    #[test]
    fn test_silence_identity() {
        let mut engine = prepared(4, 64);
        engine.set_blend_percent(0.0);
        engine.prepare(SAMPLE_RATE, 64).unwrap();

        let input: Vec<f32> = (0..64).map(|i| ((i * 7) % 13) as f32 / 13.0 - 0.5).collect();
        let mut left = input.clone();
        let mut right: Vec<f32> = input.iter().map(|s| -s).collect();
        run(&mut engine, &mut left, &mut right, 2);

        assert_eq!(left, input);
        assert_eq!(right, input.iter().map(|s| -s).collect::<Vec<_>>());
    }

    /// At 100% wet the output is only the delayed signal.
    #[test]
    fn test_full_wet_is_only_delayed_signal() {
        let mut engine = prepared(1, 32);
        engine.set_tap(0, tap(3.0, 100.0, 0.0));
        engine.set_blend_percent(100.0);
        engine.prepare(SAMPLE_RATE, 32).unwrap();

        let input: Vec<f32> = (1..=32).map(|i| i as f32).collect();
        let mut left = input.clone();
        let mut right = input.clone();
        run(&mut engine, &mut left, &mut right, 2);

        for i in 0..32 {
            let expected = if i >= 3 { input[i - 3] } else { 0.0 };
            assert!((left[i] - expected).abs() < 1e-5, "left[{i}] = {}", left[i]);
            assert!(right[i].abs() < 1e-6, "right[{i}] = {}", right[i]);
        }
    }

    /// Echoes that cross a block boundary come out in the next block.
    #[test]
    fn test_delay_longer_than_block() {
        let mut engine = prepared(1, 8);
        engine.set_tap(0, tap(10.0, 100.0, 100.0));
        engine.prepare(SAMPLE_RATE, 8).unwrap();

        let mut out = Vec::new();
        for block in 0..4 {
            let mut left = [0.0; 8];
            let mut right = [0.0; 8];
            if block == 0 {
                left[2] = 1.0;
                right[2] = 1.0;
            }
            run(&mut engine, &mut left, &mut right, 2);
            out.extend_from_slice(&right);
        }

        for (i, sample) in out.iter().enumerate() {
            let expected = if i == 12 { 1.0 } else { 0.0 };
            assert!((sample - expected).abs() < 1e-6, "out[{i}] = {sample}");
        }
    }

    /// Taps add up in the shared wet buffer.
    #[test]
    fn test_taps_are_summed() {
        let mut engine = prepared(3, 16);
        engine.set_tap(0, tap(1.0, 100.0, 0.0));
        engine.set_tap(1, tap(2.0, 50.0, 0.0));
        engine.set_tap(2, tap(4.0, 25.0, 0.0));
        engine.prepare(SAMPLE_RATE, 16).unwrap();

        let mut left = [0.0; 16];
        let mut right = [0.0; 16];
        left[0] = 1.0;
        run(&mut engine, &mut left, &mut right, 2);

        assert!((left[1] - 1.0).abs() < 1e-6);
        assert!((left[2] - 0.5).abs() < 1e-6);
        assert!((left[4] - 0.25).abs() < 1e-6);
        assert!(left[0].abs() < 1e-6 && left[3].abs() < 1e-6);
    }

    /// A mono input feeds both sides of the delay.
    #[test]
    fn test_mono_input_is_upmixed() {
        let mut engine = prepared(1, 16);
        engine.set_tap(0, tap(2.0, 100.0, 50.0));
        engine.prepare(SAMPLE_RATE, 16).unwrap();

        let mut left = [0.0; 16];
        left[0] = 1.0;
        // Whatever the host left in the second channel is replaced.
        let mut right = [0.0; 16];
        run(&mut engine, &mut left, &mut right, 1);

        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((left[2] - expected).abs() < 1e-6, "left = {left:?}");
        assert!((right[2] - expected).abs() < 1e-6, "right = {right:?}");
    }

    /// Blocks longer than the prepared maximum are processed in chunks
    /// with the same result as feeding them one block at a time.
    #[test]
    fn test_oversized_block_is_chunked() {
        let settings = tap(5.0, 80.0, 30.0);
        let input: Vec<f32> = (0..40).map(|i| (i as f32 * 0.37).sin()).collect();

        let mut chunked = prepared(1, 8);
        chunked.set_tap(0, settings);
        chunked.set_blend_percent(60.0);
        chunked.prepare(SAMPLE_RATE, 8).unwrap();
        let mut left_a = input.clone();
        let mut right_a = input.clone();
        run(&mut chunked, &mut left_a, &mut right_a, 2);

        let mut stepwise = prepared(1, 8);
        stepwise.set_tap(0, settings);
        stepwise.set_blend_percent(60.0);
        stepwise.prepare(SAMPLE_RATE, 8).unwrap();
        let mut left_b = input.clone();
        let mut right_b = input.clone();
        for (l, r) in left_b.chunks_mut(8).zip(right_b.chunks_mut(8)) {
            run(&mut stepwise, l, r, 2);
        }

        assert_eq!(left_a, left_b);
        assert_eq!(right_a, right_b);
        assert_eq!(chunked.write_position(), 40);
    }

    /// Synced delays follow tempo changes from one block to the next.
    #[test]
    fn test_sync_follows_tempo() {
        let mut engine = prepared(1, 16);
        engine.set_tap(
            0,
            TapSettings {
                sync: true,
                sixteenths: 4,
                gain_percent: 100.0,
                ..TapSettings::default()
            },
        );

        let mut left = [0.0; 16];
        let mut right = [0.0; 16];
        let mut block: [&mut [f32]; 2] = [&mut left, &mut right];
        engine.process(&mut block, 2, 120.0);
        assert_eq!(engine.taps()[0].delay_samples(), 500.0);

        engine.process(&mut block, 2, 60.0);
        assert_eq!(engine.taps()[0].delay_samples(), 1000.0);

        // Nonsense tempo: the default is used.
        engine.process(&mut block, 2, 0.0);
        assert_eq!(engine.tempo_bpm(), DEFAULT_TEMPO_BPM);
        assert_eq!(engine.taps()[0].delay_samples(), 500.0);
    }

    /// The blend ramps per sample instead of stepping at the block edge.
    #[test]
    fn test_blend_ramps_per_sample() {
        let mut engine = DelayEngine::new(EngineConfig {
            tap_count: 1,
            blend_ramp_ms: 10.0,
            ..instant_config(1)
        });
        engine.set_blend_percent(0.0);
        engine.prepare(SAMPLE_RATE, 32).unwrap();

        // Taps are silent, so output = input * (1 - wet).
        engine.set_blend_percent(100.0);
        let mut left = [1.0; 32];
        let mut right = [1.0; 32];
        run(&mut engine, &mut left, &mut right, 2);

        assert!(left[0] < 1.0 && left[0] > 0.8, "left[0] = {}", left[0]);
        for pair in left[..10].windows(2) {
            assert!(pair[1] < pair[0]);
        }
        assert_eq!(left[9], 0.0);
        assert_eq!(left[31], 0.0);
    }

    /// Turning a tap up mid-stream ramps its gain per sample, not per
    /// block.
    #[test]
    fn test_tap_gain_ramps_per_sample() {
        let mut engine = DelayEngine::new(EngineConfig {
            gain_ramp_ms: 10.0,
            ..instant_config(1)
        });
        engine.set_tap(0, tap(1.0, 0.0, 0.0));
        engine.prepare(SAMPLE_RATE, 32).unwrap();

        // Fill the delay memory with DC while the tap is silent.
        let mut left = [1.0; 32];
        let mut right = [1.0; 32];
        run(&mut engine, &mut left, &mut right, 2);
        assert!(left.iter().all(|&s| s == 0.0));

        engine.set_tap(0, tap(1.0, 100.0, 0.0));
        let mut left = [1.0; 32];
        let mut right = [1.0; 32];
        run(&mut engine, &mut left, &mut right, 2);

        for (i, &sample) in left[..10].iter().enumerate() {
            let expected = 0.1 * (i + 1) as f32;
            assert!((sample - expected).abs() < 1e-5, "left[{i}] = {sample}");
        }
        assert!(left.windows(2).all(|pair| pair[1] >= pair[0]));
        assert!(left[9..].iter().all(|&s| (s - 1.0).abs() < 1e-6));
        assert!(right.iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_load_parameters() {
        let mut engine = prepared(3, 16);
        let mut settings = engine.settings();
        settings.taps[1] = tap(700.0, 40.0, 10.0);
        settings.taps.truncate(2);
        settings.blend_percent = 35.0;

        engine.set_tap(2, tap(900.0, 10.0, 90.0));
        engine.load_parameters(&settings);

        assert_eq!(engine.tap_settings(0), Some(TapSettings::default()));
        assert_eq!(engine.tap_settings(1), Some(tap(700.0, 40.0, 10.0)));
        // Not covered by the source, so untouched.
        assert_eq!(engine.tap_settings(2), Some(tap(900.0, 10.0, 90.0)));
        assert_eq!(engine.tap_settings(3), None);
        assert_eq!(engine.blend_percent(), 35.0);
    }

    #[test]
    fn test_tail_is_longest_audible_delay() {
        let mut engine = prepared(3, 16);
        assert_eq!(engine.tail_samples(), 0);

        engine.set_tap(0, tap(300.0, 50.0, 50.0));
        engine.set_tap(1, tap(1200.0, 0.0, 50.0));
        engine.set_tap(2, tap(750.0, 20.0, 50.0));
        engine.prepare(SAMPLE_RATE, 16).unwrap();

        assert_eq!(engine.tail_samples(), 750);
    }

    /// Clearing silences old echoes.
    #[test]
    fn test_clear_drops_old_echoes() {
        let mut engine = prepared(1, 8);
        engine.set_tap(0, tap(8.0, 100.0, 0.0));
        engine.prepare(SAMPLE_RATE, 8).unwrap();

        let mut left = [1.0; 8];
        let mut right = [1.0; 8];
        run(&mut engine, &mut left, &mut right, 2);
        engine.clear();

        let mut left = [0.0; 8];
        let mut right = [0.0; 8];
        run(&mut engine, &mut left, &mut right, 2);
        assert!(left.iter().all(|&s| s == 0.0));
    }
}
