//! # DSP (Digital Signal Processing) Core
//!
//! The multi-tap delay, bottom-up:
//!
//! - **`delay_buffer`**: A per-channel ring buffer that stores the last
//!   few seconds of input, written a block at a time.
//!
//! - **`smoother`**: A linear ramp used for every value that changes while
//!   audio is running (delay times, gains, the dry/wet blend), so that
//!   knob moves never click.
//!
//! - **`tap`**: One echo voice: a delay time (milliseconds or tempo-synced
//!   sixteenths), a gain, and an equal-power pan.
//!
//! - **`engine`**: Owns the buffer and the taps and runs the per-block
//!   pipeline: write, render taps, advance, mix.

pub mod delay_buffer;
pub mod engine;
pub mod smoother;
pub mod tap;

/// The engine always runs in stereo. Mono inputs are copied to both sides
/// before any processing.
pub const NUM_CHANNELS: usize = 2;
