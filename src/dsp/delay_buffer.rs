//! # Circular Delay Buffer
//!
//! The delay buffer stores the most recent few seconds of audio for every
//! channel so that taps can read it back later. It is the "tape loop" of
//! the effect: a write head records whole blocks of incoming audio, and
//! any number of read heads play back from positions further behind.
//!
//! ## Block Writes and the Wrap Split
//!
//! The host hands us audio a block at a time (typically 64-1024 samples),
//! so the buffer is written a block at a time too. A block that fits
//! before the end of the storage is one copy. A block that runs off the
//! end is split in two:
//!
//! ```text
//!  capacity = 10, write_pos = 8, block = [a b c d]
//!
//!  index:  0 1 2 3 4 5 6 7 8 9
//!          c d . . . . . . a b
//!          └─┘             └─┘
//!       "from start"     "to end"
//! ```
//!
//! Reads are split the same way and handed out as a [`DelayView`]: two
//! slices that, chained together, are the requested samples in order.
//!
//! ## One Write Position for All Channels
//!
//! Every channel receives a block of the same length at the same time,
//! so a single shared `write_pos` serves them all. It only moves in
//! [`advance()`](DelayBuffer::advance), called exactly once per block
//! *after* every tap has read. Until then, reads are relative to where
//! this block started, which is what makes "N samples ago" well defined.
//!
//! ## Index Math
//!
//! To read `N` samples behind position `p` on a ring of length `C`:
//!
//! ```text
//! read_index = (p + C - N) % C
//! ```
//!
//! Adding `C` before subtracting keeps the arithmetic non-negative
//! (`usize` can't go below zero); the modulo wraps back into range.

use std::num::NonZeroUsize;

use nih_plug::{nih_debug_assert, nih_debug_assert_failure};

/// Per-channel ring storage with a shared write head.
///
/// Storage is allocated once (in [`new()`](Self::new) or
/// [`resize()`](Self::resize), both called only while preparing) and
/// never again, so every method used during processing is allocation-free.
pub struct DelayBuffer {
    /// One ring of samples per channel. All rings have length `capacity`.
    channels: Vec<Vec<f32>>,

    /// Slot that the *next* incoming sample will be written to.
    /// Always in `0..capacity`.
    write_pos: usize,

    /// Length of every ring.
    capacity: usize,
}

/// A possibly wrapped run of samples borrowed from a [`DelayBuffer`].
///
/// `head` holds the samples up to the end of the storage and `tail` the
/// ones that continued at index 0. When the run didn't wrap, `tail` is
/// empty.
#[derive(Debug, Clone, Copy)]
pub struct DelayView<'a> {
    pub head: &'a [f32],
    pub tail: &'a [f32],
}

impl<'a> DelayView<'a> {
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the run sits in one contiguous slice.
    pub fn is_contiguous(&self) -> bool {
        self.tail.is_empty()
    }

    /// The samples in playback order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + 'a {
        let (head, tail) = (self.head, self.tail);
        head.iter().chain(tail.iter()).copied()
    }
}

impl DelayBuffer {
    /// Create a silent buffer with `num_channels` rings of `capacity`
    /// samples each.
    ///
    /// `NonZeroUsize` guarantees the ring can't be zero-length, which
    /// would make every modulo in the index math divide by zero.
    pub fn new(num_channels: usize, capacity: NonZeroUsize) -> Self {
        Self {
            channels: vec![vec![0.0; capacity.get()]; num_channels],
            write_pos: 0,
            capacity: capacity.get(),
        }
    }

    /// Reallocate for a new channel count or capacity and clear to
    /// silence. Only call this while preparing, never from `process()`.
    pub fn resize(&mut self, num_channels: usize, capacity: NonZeroUsize) {
        let capacity = capacity.get();
        self.channels.resize_with(num_channels, Vec::new);
        for channel in &mut self.channels {
            channel.clear();
            channel.resize(capacity, 0.0);
        }
        self.capacity = capacity;
        self.write_pos = 0;
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Where the next sample will be written.
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Copy a block into one channel's ring, starting at the write head.
    ///
    /// **Important:** This does NOT advance the write position. Every
    /// channel is written from the same starting slot, and taps read
    /// relative to it, before [`advance()`](Self::advance) moves on.
    pub fn write(&mut self, channel: usize, source: &[f32]) {
        let capacity = self.capacity;
        let write_pos = self.write_pos;
        let Some(ring) = self.channels.get_mut(channel) else {
            nih_debug_assert_failure!("write to missing delay channel {}", channel);
            return;
        };

        nih_debug_assert!(
            source.len() <= capacity,
            "block of {} samples exceeds delay capacity {}",
            source.len(),
            capacity
        );
        let source = &source[..source.len().min(capacity)];

        // Split into "to end" and "from start" copies.
        let to_end = (capacity - write_pos).min(source.len());
        ring[write_pos..write_pos + to_end].copy_from_slice(&source[..to_end]);
        ring[..source.len() - to_end].copy_from_slice(&source[to_end..]);
    }

    /// Borrow `count` samples from one channel, ending (exclusively) at
    /// `write_pos + offset`.
    ///
    /// Negative offsets reach into the past. A positive offset reaches
    /// into the block written since the last advance, up to its length.
    ///
    /// ```text
    /// offset = -100, count = 4  →  the 4 samples written 104..=101 slots ago
    /// offset = 0,    count = 4  →  the 4 most recent samples before write_pos
    /// ```
    pub fn read(&self, channel: usize, offset: isize, count: usize) -> DelayView<'_> {
        let Some(ring) = self.channels.get(channel) else {
            nih_debug_assert_failure!("read from missing delay channel {}", channel);
            return DelayView { head: &[], tail: &[] };
        };

        let capacity = self.capacity;
        let count = count.min(capacity);
        let start = (self.write_pos as isize + offset - count as isize)
            .rem_euclid(capacity as isize) as usize;

        let to_end = (capacity - start).min(count);
        DelayView {
            head: &ring[start..start + to_end],
            tail: &ring[..count - to_end],
        }
    }

    /// Read one sample `delay_samples` behind `position`, using linear
    /// interpolation for fractional delays.
    ///
    /// `position` is an absolute slot that may run past the end of the
    /// ring (e.g. `write_position() + i` for the i-th sample of a block);
    /// it's wrapped here. The delay is clamped to `capacity - 1`; below
    /// that, both interpolation neighbours stay inside the ring.
    ///
    /// For a delay of 441.3 samples:
    ///
    /// ```text
    /// result = ring[p - 441] * 0.7 + ring[p - 442] * 0.3
    /// ```
    pub fn read_at(&self, channel: usize, position: usize, delay_samples: f32) -> f32 {
        let Some(ring) = self.channels.get(channel) else {
            return 0.0;
        };

        let capacity = self.capacity;
        let delay = delay_samples.clamp(0.0, (capacity - 1) as f32);
        let delay_int = delay as usize;
        let delay_frac = delay - delay_int as f32;

        let pos = position % capacity;
        let index_a = (pos + capacity - delay_int) % capacity;
        let sample_a = ring[index_a];
        if delay_frac == 0.0 {
            return sample_a;
        }

        let index_b = (pos + capacity - delay_int - 1) % capacity;
        sample_a * (1.0 - delay_frac) + ring[index_b] * delay_frac
    }

    /// Move the write head forward by one block, wrapping at the end.
    pub fn advance(&mut self, count: usize) {
        self.write_pos = (self.write_pos + count) % self.capacity;
    }

    /// Fill every ring with silence and rewind the write head.
    pub fn clear(&mut self) {
        for ring in &mut self.channels {
            ring.fill(0.0);
        }
        self.write_pos = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
