//! # Stereo Ring Buffer
//!
//! The delay's memory: two channels of sample history sharing one write
//! cursor. Every sample the kernel writes `input + feedback` at the cursor
//! and moves the cursor forward by one, wrapping at the end of the buffer.
//!
//! ```text
//!            cursor - delay          cursor          cursor + delay
//!                  │                   │                   │
//!  ... ─┬────┬────┬▼───┬────┬────┬────┬▼───┬────┬────┬────┬▼───┬─ ...
//!       │    │    │ fwd│    │    │    │ W  │    │    │    │flip│
//!  ... ─┴────┴────┴────┴────┴────┴────┴────┴────┴────┴────┴────┴─ ...
//!        (older)                                   (oldest, about to
//!                                                   be overwritten)
//! ```
//!
//! A **forward** read looks `delay` samples behind the cursor, which is
//! the audio written `delay` samples ago. A **flip** read looks `delay`
//! samples *ahead* of the cursor. On a ring that is the far past, the
//! audio written roughly `capacity - delay` samples ago, and as the cursor
//! moves on it sweeps toward ever older material. That is the "reverse"
//! character of the flip mode; it is not a true time-reversal.
//!
//! Both reads are fractional and use linear interpolation between the
//! sample at `floor(position)` and the one after it.

use std::num::NonZeroUsize;

/// Which channel of the ring to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

/// Read direction relative to the write cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `delay` samples behind the cursor.
    Forward,
    /// `delay` samples ahead of the cursor (flip mode).
    Reverse,
}

/// Fixed-capacity stereo sample history with a single shared write cursor.
///
/// Capacity is fixed at construction; nothing in here allocates after
/// [`RingBuffer::new`].
#[derive(Debug, Clone)]
pub struct RingBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    write_pos: usize,
}

impl RingBuffer {
    /// Create a silent ring holding `capacity` samples per channel.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            left: vec![0.0; capacity.get()],
            right: vec![0.0; capacity.get()],
            write_pos: 0,
        }
    }

    /// Samples per channel.
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    /// Index the next [`write`](Self::write) will land on.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Store one stereo frame at the cursor. Does not advance.
    pub fn write(&mut self, left: f32, right: f32) {
        self.left[self.write_pos] = left;
        self.right[self.write_pos] = right;
    }

    /// Move the cursor forward by one sample, wrapping at capacity.
    pub fn advance(&mut self) {
        self.write_pos = (self.write_pos + 1) % self.capacity();
    }

    /// Fractional read `delay_samples` away from the cursor.
    ///
    /// The delay is clamped to `[0, capacity - 1]`, so any finite value is
    /// safe. With an integer delay `d >= 1` and `Direction::Forward` this
    /// returns exactly the sample written `d` calls to `advance()` ago.
    pub fn read(&self, channel: Channel, delay_samples: f32, direction: Direction) -> f32 {
        let data = match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        };
        let len = data.len();
        let len_f = len as f64;

        let delay = if delay_samples.is_finite() {
            f64::from(delay_samples).clamp(0.0, len_f - 1.0)
        } else {
            0.0
        };

        // Index math in f64: at 10 s of 192 kHz the positions run into the
        // millions, where f32 has no fractional precision left.
        let cursor = self.write_pos as f64;
        let position = match direction {
            Direction::Forward => (cursor - delay + len_f).rem_euclid(len_f),
            Direction::Reverse => (cursor + delay).rem_euclid(len_f),
        };

        let index = position.floor();
        let frac = (position - index) as f32;
        let index_a = (index as usize) % len;
        let index_b = (index_a + 1) % len;

        data[index_a] * (1.0 - frac) + data[index_b] * frac
    }

    /// Overwrite this ring with the contents and cursor of `other`.
    ///
    /// Used for the hold snapshot. Both rings are created with the same
    /// capacity, so this is a plain memcpy and never allocates. If the
    /// capacities ever differ only the overlapping prefix is copied.
    pub fn copy_from(&mut self, other: &RingBuffer) {
        let n = self.capacity().min(other.capacity());
        self.left[..n].copy_from_slice(&other.left[..n]);
        self.right[..n].copy_from_slice(&other.right[..n]);
        self.write_pos = other.write_pos % self.capacity();
    }

    /// Silence both channels and rewind the cursor.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> RingBuffer {
        RingBuffer::new(NonZeroUsize::new(capacity).unwrap())
    }

    /// Every integer offset returns exactly what was written that many
    /// steps earlier, including after the cursor has wrapped.
    #[test]
    fn test_integer_offset_round_trip() {
        let mut rb = ring(32);
        for i in 0..50 {
            rb.write(i as f32, -(i as f32));
            rb.advance();
        }

        // Last value written was 49.
        for d in 1..32 {
            let expected = (50 - d) as f32;
            let l = rb.read(Channel::Left, d as f32, Direction::Forward);
            let r = rb.read(Channel::Right, d as f32, Direction::Forward);
            assert_eq!(l, expected, "left at delay {d}");
            assert_eq!(r, -expected, "right at delay {d}");
        }
    }

    #[test]
    fn test_forward_interpolates_toward_newer_sample() {
        let mut rb = ring(16);
        rb.write(0.0, 0.0);
        rb.advance();
        rb.write(1.0, 1.0);
        rb.advance();

        // Cursor at 2; position 2 - 1.5 = 0.5 sits halfway between
        // index 0 (0.0) and index 1 (1.0).
        let v = rb.read(Channel::Left, 1.5, Direction::Forward);
        assert!((v - 0.5).abs() < 1e-6, "Expected 0.5, got {v}");

        // 1.25 back → position 0.75 → 0.25 * 0.0 + 0.75 * 1.0
        let v = rb.read(Channel::Left, 1.25, Direction::Forward);
        assert!((v - 0.75).abs() < 1e-6, "Expected 0.75, got {v}");
    }

    #[test]
    fn test_reverse_reads_ahead_of_cursor() {
        let mut rb = ring(8);
        for i in 0..8 {
            rb.write(i as f32, 0.0);
            rb.advance();
        }
        // Full lap: cursor back at 0, which holds the oldest sample.
        assert_eq!(rb.write_pos(), 0);

        assert_eq!(rb.read(Channel::Left, 3.0, Direction::Reverse), 3.0);
        assert_eq!(rb.read(Channel::Left, 7.0, Direction::Reverse), 7.0);

        let v = rb.read(Channel::Left, 2.5, Direction::Reverse);
        assert!((v - 2.5).abs() < 1e-6, "Expected 2.5, got {v}");
    }

    #[test]
    fn test_interpolation_wraps_past_end() {
        let mut rb = ring(4);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            rb.write(v, 0.0);
            rb.advance();
        }
        // Slots are now [50, 20, 30, 40] with the cursor at 1.
        assert_eq!(rb.write_pos(), 1);

        // Reverse 2.5 → position 3.5 → halfway from idx 3 (40) to idx 0 (50).
        let v = rb.read(Channel::Left, 2.5, Direction::Reverse);
        assert!((v - 45.0).abs() < 1e-4, "Expected 45.0, got {v}");

        // Forward 1.5 lands on the same position from the other side.
        let v = rb.read(Channel::Left, 1.5, Direction::Forward);
        assert!((v - 45.0).abs() < 1e-4, "Expected 45.0, got {v}");
    }

    #[test]
    fn test_out_of_range_delay_is_clamped() {
        let mut rb = ring(10);
        rb.write(1.0, 1.0);
        rb.advance();

        for d in [-5.0, 1e9, f32::NAN, f32::INFINITY] {
            let v = rb.read(Channel::Left, d, Direction::Forward);
            assert!(v.is_finite(), "delay {d} produced {v}");
        }
    }

    #[test]
    fn test_copy_from_takes_contents_and_cursor() {
        let mut live = ring(16);
        for i in 0..5 {
            live.write(i as f32, i as f32 * 2.0);
            live.advance();
        }

        let mut snapshot = ring(16);
        snapshot.copy_from(&live);

        assert_eq!(snapshot.write_pos(), live.write_pos());
        for d in 1..=5 {
            let d = d as f32;
            assert_eq!(
                snapshot.read(Channel::Right, d, Direction::Forward),
                live.read(Channel::Right, d, Direction::Forward)
            );
        }

        // Later writes to the live ring must not leak into the copy.
        live.write(99.0, 99.0);
        live.advance();
        assert_eq!(snapshot.read(Channel::Left, 1.0, Direction::Forward), 4.0);
    }

    #[test]
    fn test_clear() {
        let mut rb = ring(10);
        rb.write(0.5, 0.5);
        rb.advance();
        rb.clear();

        assert_eq!(rb.write_pos(), 0);
        assert_eq!(rb.read(Channel::Left, 1.0, Direction::Forward), 0.0);
        assert_eq!(rb.read(Channel::Right, 1.0, Direction::Forward), 0.0);
    }
}
