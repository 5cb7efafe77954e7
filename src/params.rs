//! # Plugin Parameters
//!
//! Parameters are the knobs and switches the user sees in the DAW. Each
//! parameter has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to
//!   save and recall presets. Once published, never change these IDs
//!   or existing presets will break.
//! - A **human-readable name** shown in the DAW's UI.
//! - A **range** and a **default value**.
//!
//! ## Sixteen Taps, One Struct
//!
//! Every tap has the same five controls, so they're declared once in
//! [`TapParams`] and repeated with `#[nested(array)]`. nih-plug appends
//! the tap number to each ID (`delay_1`, `delay_2`, ...) and to the group
//! name shown by the host.
//!
//! ## No Smoothing Here
//!
//! Unlike a typical nih-plug plugin, these parameters don't attach
//! smoothers. The engine reads the plain values once per block through
//! [`ParameterSource`] and ramps them itself, in the units it actually
//! uses (samples of delay, linear channel gains), so a pan move and a gain
//! move glide as one.

use nih_plug::prelude::*;

use crate::dsp::engine::ParameterSource;
use crate::dsp::tap::TapSettings;

/// Number of taps exposed to the host.
pub const NUM_TAPS: usize = 16;

/// All user-facing parameters for the Sequenced Delay plugin.
#[derive(Params)]
pub struct DelayParams {
    #[nested(array, group = "Tap")]
    pub taps: [TapParams; NUM_TAPS],

    /// **Dry/Wet** — balance between the dry input and the echoes.
    ///
    /// - 0% = only the dry input
    /// - 100% = only the echoes (the default, as for a send effect)
    #[id = "blend"]
    pub blend: FloatParam,
}

/// The controls of one tap.
#[derive(Params)]
pub struct TapParams {
    /// **Time** — free-running delay in milliseconds, used when sync is off.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Gain** — echo level. Taps start silent so that only the ones the
    /// user turns up are heard.
    #[id = "gain"]
    pub gain: FloatParam,

    /// **Pan** — 0% hard left, 50% centre, 100% hard right.
    #[id = "pan"]
    pub pan: FloatParam,

    /// **Sync** — take the delay from the host tempo instead of `delay_time`.
    #[id = "sync"]
    pub sync: BoolParam,

    /// **Sixteenths** — synced delay length. 4 = one beat.
    #[id = "sixt"]
    pub sixteenths: IntParam,
}

impl TapParams {
    /// Parameters for tap `number` (1-based, as shown to the user).
    pub fn new(number: usize) -> Self {
        Self {
            delay_time: FloatParam::new(
                format!("Delay {number} Time"),
                250.0,
                FloatRange::Skewed {
                    min: 0.0,
                    max: 4000.0,
                    // More knob travel for short delays, where small
                    // changes are most audible.
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            gain: FloatParam::new(
                format!("Delay {number} Gain"),
                0.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            pan: FloatParam::new(
                format!("Delay {number} Pan"),
                50.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            sync: BoolParam::new(format!("Delay {number} Sync"), false),

            sixteenths: IntParam::new(
                format!("Delay {number} Sixteenths"),
                4,
                IntRange::Linear { min: 1, max: 16 },
            ),
        }
    }

    /// Read the current values (lock-free atomic loads) into a plain
    /// snapshot for the engine.
    pub fn settings(&self) -> TapSettings {
        TapSettings {
            delay_ms: self.delay_time.value(),
            sync: self.sync.value(),
            sixteenths: self.sixteenths.value().max(1) as u32,
            gain_percent: self.gain.value(),
            pan_percent: self.pan.value(),
        }
    }
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            taps: std::array::from_fn(|index| TapParams::new(index + 1)),

            blend: FloatParam::new(
                "Dry/Wet",
                100.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),
        }
    }
}

impl ParameterSource for DelayParams {
    fn tap_settings(&self, index: usize) -> Option<TapSettings> {
        self.taps.get(index).map(TapParams::settings)
    }

    fn blend_percent(&self) -> f32 {
        self.blend.value()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
