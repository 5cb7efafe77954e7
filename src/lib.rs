//! # Sequenced Delay — A Multi-Tap AU/VST3/CLAP Delay Plugin
//!
//! A multi-tap echo built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! Sixteen independent taps each read the same delay buffer at their own
//! time (milliseconds, or sixteenth notes at the host tempo), with their
//! own gain and equal-power pan. The echoes are summed and blended with
//! the dry signal.
//!
//! ## Signal Flow
//!
//! ```text
//!                 ┌─────────────────────────── × (1 - blend) ─────────────┐
//!                 │                                                       │
//! Input ──►[upmix]┤                                                       │
//!                 │     ┌──► tap 1  (time, gain, pan) ──┐                 │
//!                 │     │                               │                 │
//!                 └──► [Delay Buffer] ──► tap 2 ... ───(+)── × blend ───►(+)──► Output
//!                       │                               │
//!                       └──► tap 16 ────────────────────┘
//! ```
//!
//! There is no feedback path: every echo is a single read of the input,
//! so the pattern of repeats is exactly the pattern of taps.
//!
//! The DSP lives in [`dsp`] and knows nothing about plugin hosts; this
//! file only adapts nih-plug's callbacks to the engine's
//! prepare / process / release lifecycle.

pub mod config;
pub mod dsp;
pub mod error;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

pub use config::{EngineConfig, DEFAULT_TEMPO_BPM};
pub use dsp::engine::{DelayEngine, DelaySettings, EngineState, ParameterSource};
pub use dsp::tap::TapSettings;
pub use error::EngineError;
use params::{DelayParams, NUM_TAPS};

/// The plugin: a parameter tree for the host and a [`DelayEngine`] for
/// the audio thread.
///
/// The engine never sees nih-plug parameters. Once per block it pulls a
/// plain [`TapSettings`] snapshot through [`ParameterSource`], which
/// `DelayParams` implements with atomic loads, and ramps from there.
struct SequencedDelay {
    params: Arc<DelayParams>,

    engine: DelayEngine,

    /// Input channels of the negotiated layout (1 or 2). Outputs are
    /// always stereo; a mono input is copied to both sides.
    input_channels: usize,
}

impl Default for SequencedDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(DelayParams::default()),
            engine: DelayEngine::new(EngineConfig {
                tap_count: NUM_TAPS,
                ..EngineConfig::default()
            }),
            input_channels: 2,
        }
    }
}

impl Plugin for SequencedDelay {
    const NAME: &'static str = "Sequenced Delay";
    const VENDOR: &'static str = "Sequenced Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Supported audio channel layouts. The host will pick the first
    // layout that matches the track configuration. The echoes are panned
    // across a stereo field, so the output is always stereo.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        // Mono track into a stereo delay.
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    // Only the transport tempo is used; no MIDI.
    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Split blocks at automation points so each block sees the parameter
    // values that apply to it. The engine then ramps between them.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Negotiate the bus layout and size the engine for this sample rate
    /// and block size. The engine allocates here and nowhere else: enough
    /// delay memory for the longest echo, plus one block.
    ///
    /// Returning `false` tells the host the plugin can't work with this
    /// configuration.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let inputs = audio_io_layout
            .main_input_channels
            .map_or(0, |c| c.get() as usize);
        let outputs = audio_io_layout
            .main_output_channels
            .map_or(0, |c| c.get() as usize);

        if let Err(err) = DelayEngine::check_layout(inputs, outputs) {
            nih_error!("{}", err);
            return false;
        }
        self.input_channels = inputs;

        // Load the (possibly restored) parameter values first so that the
        // smoothers start where the preset is instead of ramping to it.
        self.engine.load_parameters(self.params.as_ref());

        match self
            .engine
            .prepare(buffer_config.sample_rate, buffer_config.max_buffer_size as usize)
        {
            Ok(()) => true,
            Err(err) => {
                nih_error!("failed to initialize: {}", err);
                false
            }
        }
    }

    /// Host reset (transport restart, bypass toggle). Echoes still in the
    /// delay memory are dropped and every ramp snaps to its target.
    fn reset(&mut self) {
        self.engine.clear();
    }

    fn deactivate(&mut self) {
        self.engine.release();
    }

    /// The core audio callback.
    ///
    /// 1. Pull this block's parameter values from the atomic store.
    /// 2. Read the host tempo (for synced taps).
    /// 3. Let the engine process the buffer in place.
    /// 4. Report the echo tail so the host keeps calling us after the
    ///    input goes silent.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.engine.load_parameters(self.params.as_ref());

        let tempo = context
            .transport()
            .tempo
            .map_or(DEFAULT_TEMPO_BPM, |bpm| bpm as f32);

        self.engine.process(buffer.as_slice(), self.input_channels, tempo);

        match self.engine.tail_samples() {
            0 => ProcessStatus::Normal,
            tail_samples => ProcessStatus::Tail(tail_samples),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for SequencedDelay {
    const CLAP_ID: &'static str = "com.sequenced-audio.sequenced-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A sixteen-tap delay with per-tap time, gain, pan and tempo sync");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for SequencedDelay {
    // The `*b"..."` syntax creates a `[u8; 16]` from a 16-character
    // ASCII string literal.
    const VST3_CLASS_ID: [u8; 16] = *b"SeqncdDelay_v001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as AUv2 so Logic Pro
// (Audio Units only) can load it.

nih_export_clap!(SequencedDelay);
nih_export_vst3!(SequencedDelay);

clap_wrapper::export_auv2!();
