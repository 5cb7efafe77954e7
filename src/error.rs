//! # Configuration Errors
//!
//! The audio path itself never fails: once the engine is prepared,
//! `process()` always succeeds. Everything that *can* go wrong is caught
//! earlier, at the prepare/configuration boundary, and reported with one
//! of these variants. The plugin wrapper logs the error and tells the
//! host it cannot run with that configuration.

use thiserror::Error;

/// Reasons the delay engine refuses to enter the prepared state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("maximum block size must be at least one sample")]
    EmptyBlock,

    #[error("block size of {block} samples does not fit a delay line of {max_delay} samples")]
    BlockTooLarge { block: usize, max_delay: usize },

    #[error("the engine needs at least one tap")]
    NoTaps,

    #[error("maximum delay time must be positive and finite, got {0} ms")]
    InvalidMaxDelay(f32),

    #[error("sync subdivision limit must be at least one sixteenth")]
    InvalidSubdivisionLimit,

    #[error("minimum sync tempo must be positive and finite, got {0} BPM")]
    InvalidMinTempo(f32),

    #[error("ramp time for {name} must be finite and non-negative, got {value} ms")]
    InvalidRampTime { name: &'static str, value: f32 },

    #[error("unsupported channel layout: {inputs} in, {outputs} out")]
    UnsupportedLayout { inputs: usize, outputs: usize },
}
