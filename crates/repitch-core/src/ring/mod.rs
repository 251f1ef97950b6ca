//! Fixed-capacity circular sample buffer
//!
//! Absorbs the size mismatch between the stretcher's engine-chosen output
//! chunks and the host's fixed-size block requests. Capacity is a power of
//! two so cursor arithmetic wraps via bitmasking; storage is allocated once
//! at construction and never resized.
//!
//! Underrun is not an error here: it occurs routinely while the stretcher
//! is still inside its startup latency. The policy is zero-fill - never
//! replay stale samples, never read past the writer. A *partial* underrun
//! zero-fills the front of the request and places the real samples at the
//! tail, so the signal is padded rather than shifted.

use crate::error::{RepitchError, RepitchResult};
use crate::types::Sample;

/// Ring buffer of audio samples with wraparound read/write and
/// zero-fill-on-underrun reads
#[derive(Debug)]
pub struct RingBuffer {
    data: Vec<Sample>,
    mask: usize,
    write_pos: usize,
    read_pos: usize,
    /// Unread samples between the cursors. Kept explicitly so a buffer
    /// holding exactly `capacity` samples is distinguishable from an
    /// empty one (the cursors coincide in both cases).
    unread: usize,
}

impl RingBuffer {
    /// Create a ring buffer with the given capacity in samples
    ///
    /// Fails if the capacity is zero or not a power of two.
    pub fn new(capacity: usize) -> RepitchResult<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(RepitchError::InvalidRingCapacity(capacity));
        }
        Ok(Self {
            data: vec![0.0; capacity],
            mask: capacity - 1,
            write_pos: 0,
            read_pos: 0,
            unread: 0,
        })
    }

    /// Buffer capacity in samples
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of unread samples currently held
    #[inline]
    pub fn occupancy(&self) -> usize {
        self.unread
    }

    /// Append samples at the write cursor, wrapping at the storage
    /// boundary
    ///
    /// The caller must never put more than `capacity` samples in one
    /// call. If the writer laps the reader, the oldest unread samples are
    /// overwritten and the read cursor skips ahead to the oldest sample
    /// still intact.
    pub fn put(&mut self, data: &[Sample]) {
        let len = data.len();
        debug_assert!(len <= self.capacity(), "put of {} exceeds capacity {}", len, self.capacity());

        let pos = self.write_pos;
        let tail = self.data.len() - pos;
        if len <= tail {
            self.data[pos..pos + len].copy_from_slice(data);
        } else {
            self.data[pos..].copy_from_slice(&data[..tail]);
            self.data[..len - tail].copy_from_slice(&data[tail..]);
        }
        self.write_pos = (pos + len) & self.mask;

        self.unread = (self.unread + len).min(self.capacity());
        // After an overwrite the oldest intact sample sits `unread`
        // behind the writer.
        self.read_pos = self.write_pos.wrapping_sub(self.unread) & self.mask;
    }

    /// Fill `dst` from the read cursor
    ///
    /// If the buffer is empty the whole slice is zero-filled. If fewer
    /// samples are unread than requested, the shortfall becomes a zero
    /// prefix and only the tail carries real data; the read cursor
    /// advances only past samples actually consumed.
    pub fn get(&mut self, dst: &mut [Sample]) {
        let len = dst.len();
        debug_assert!(len <= self.capacity(), "get of {} exceeds capacity {}", len, self.capacity());

        if self.unread == 0 {
            dst.fill(0.0);
            return;
        }

        let real = self.unread.min(len);
        let silent = len - real;
        dst[..silent].fill(0.0);

        let pos = self.read_pos;
        let out = &mut dst[silent..];
        let tail = self.data.len() - pos;
        if real <= tail {
            out.copy_from_slice(&self.data[pos..pos + real]);
        } else {
            out[..tail].copy_from_slice(&self.data[pos..]);
            out[tail..].copy_from_slice(&self.data[..real - tail]);
        }
        self.read_pos = (pos + real) & self.mask;
        self.unread -= real;
    }

    /// Zero the storage and rewind both cursors
    ///
    /// Called on (re)activation so stale audio never leaks across
    /// non-contiguous processing sessions.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
        self.unread = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_must_be_power_of_two() {
        assert!(RingBuffer::new(0).is_err());
        assert!(RingBuffer::new(100).is_err());
        assert!(RingBuffer::new(4096).is_ok());
    }

    #[test]
    fn test_underrun_zero_fill() {
        let mut ring = RingBuffer::new(64).unwrap();
        let mut out = [1.0f32; 32];
        ring.get(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let mut ring = RingBuffer::new(64).unwrap();
        let input: Vec<f32> = (0..32).map(|i| i as f32).collect();
        ring.put(&input);

        let mut out = [0.0f32; 32];
        ring.get(&mut out);
        assert_eq!(&out[..], &input[..]);
        assert_eq!(ring.occupancy(), 0);
    }

    #[test]
    fn test_wraparound_preserves_order() {
        let mut ring = RingBuffer::new(16).unwrap();

        // Push the cursors near the boundary first
        let pad = [0.5f32; 12];
        ring.put(&pad);
        let mut sink = [0.0f32; 12];
        ring.get(&mut sink);

        // This put crosses the storage boundary
        let markers: Vec<f32> = (1..=8).map(|i| i as f32).collect();
        ring.put(&markers);

        let mut out = [0.0f32; 8];
        ring.get(&mut out);
        assert_eq!(&out[..], &markers[..]);
    }

    #[test]
    fn test_full_capacity_marker_sequence() {
        let mut ring = RingBuffer::new(128).unwrap();
        let markers: Vec<f32> = (0..128).map(|i| i as f32 + 1.0).collect();
        ring.put(&markers);
        assert_eq!(ring.occupancy(), 128);

        let mut out = vec![0.0f32; 128];
        ring.get(&mut out);
        assert_eq!(out, markers);
    }

    #[test]
    fn test_partial_underrun_zero_prefix() {
        let mut ring = RingBuffer::new(64).unwrap();
        let input = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        ring.put(&input);

        // Request more than is available: 11 zeros, then the 5 real samples
        let mut out = [9.9f32; 16];
        ring.get(&mut out);
        assert!(out[..11].iter().all(|&s| s == 0.0));
        assert_eq!(&out[11..], &input[..]);
        assert_eq!(ring.occupancy(), 0);
    }

    #[test]
    fn test_overwrite_keeps_newest_in_order() {
        let mut ring = RingBuffer::new(16).unwrap();
        let first: Vec<f32> = (1..=10).map(|i| i as f32).collect();
        let second: Vec<f32> = (11..=20).map(|i| i as f32).collect();
        ring.put(&first);
        ring.put(&second);

        // 20 samples into a 16-slot ring: the oldest four are gone and
        // the reader lands on the oldest sample still intact.
        assert_eq!(ring.occupancy(), 16);
        let mut out = [0.0f32; 16];
        ring.get(&mut out);
        let expect: Vec<f32> = (5..=20).map(|i| i as f32).collect();
        assert_eq!(&out[..], &expect[..]);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut ring = RingBuffer::new(64).unwrap();
        ring.put(&[1.0; 40]);
        ring.reset();

        assert_eq!(ring.occupancy(), 0);
        let mut out = [1.0f32; 40];
        ring.get(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_interleaved_put_get() {
        let mut ring = RingBuffer::new(32).unwrap();
        let mut next = 0.0f32;
        let mut expect = 0.0f32;

        // Alternating put(12)/get(12) walks the cursors around the
        // storage many times; order must survive every wrap.
        for _ in 0..20 {
            let chunk: Vec<f32> = (0..12)
                .map(|_| {
                    next += 1.0;
                    next
                })
                .collect();
            ring.put(&chunk);

            let mut out = [0.0f32; 12];
            ring.get(&mut out);
            for &s in &out {
                expect += 1.0;
                assert_eq!(s, expect);
            }
        }
    }
}
