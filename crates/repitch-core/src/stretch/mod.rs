//! Stretcher capability contract and the signalsmith-stretch adapter
//!
//! The bridge never talks to a concrete DSP engine; it pulls through the
//! [`Stretcher`] trait: ask the engine how much input it wants, feed
//! exactly that, then drain whatever output is ready. This keeps the
//! bridge testable against a scripted fake with arbitrary chunk sizes.
//!
//! The production implementation wraps signalsmith-stretch. Pitch
//! compensation leaves duration unchanged, so the adapter runs the engine
//! with equal-sized input/output blocks: input accumulates into a fixed
//! block, each completed block is transposed in one pass, and the result
//! queues in a pre-allocated FIFO until the bridge drains it. All storage
//! is sized at construction; the processing path never allocates.

use signalsmith_stretch::Stretch;

use crate::error::{RepitchError, RepitchResult};
use crate::types::{Sample, STRETCH_BLOCK};

/// Real-time pitch stretcher capability
///
/// All methods are synchronous and real-time safe once the implementation
/// is constructed.
pub trait Stretcher {
    /// Set the pitch transposition ratio (1.0 = unchanged). Callable
    /// every callback; takes effect on subsequently processed input.
    fn set_pitch_scale(&mut self, ratio: f64);

    /// Exact number of input samples wanted for the next processing step
    fn samples_required(&self) -> usize;

    /// Feed input samples; the engine may buffer internally without
    /// producing output. `final_block` marks the end of the stream.
    fn process(&mut self, input: &[Sample], final_block: bool);

    /// Number of output samples ready to be drained right now
    fn available(&self) -> usize;

    /// Copy up to `dst.len()` ready samples into `dst`; returns the
    /// number actually copied
    fn retrieve(&mut self, dst: &mut [Sample]) -> usize;

    /// Startup latency in samples (silence emitted before real output)
    fn latency(&self) -> usize;

    /// Drop all internal state, ready for a non-contiguous stream
    fn reset(&mut self);
}

/// Mono channel count for the underlying engine
const CHANNELS: u32 = 1;

/// [`Stretcher`] backed by signalsmith-stretch
pub struct SignalsmithStretcher {
    stretch: Stretch,
    pitch_scale: f64,
    block: usize,
    /// Input accumulated toward the next block (len < block)
    pending: Vec<Sample>,
    /// Per-block output scratch
    out_block: Vec<Sample>,
    /// Produced-but-undrained output; `fifo_read` indexes the next
    /// sample to hand out
    fifo: Vec<Sample>,
    fifo_read: usize,
    /// Most undrained samples the FIFO may hold: the declared maximum
    /// host block plus one processing block of carry-over. A caller that
    /// exceeds it loses the oldest output; the FIFO never grows.
    fifo_limit: usize,
}

impl SignalsmithStretcher {
    /// Create a mono stretcher for the given sample rate with the default
    /// processing block
    ///
    /// `max_block_size` is the largest host block the caller will feed
    /// before draining; the output queue is sized from it once, at
    /// construction.
    pub fn new(sample_rate: u32, max_block_size: usize) -> RepitchResult<Self> {
        Self::with_block(sample_rate, STRETCH_BLOCK, max_block_size)
    }

    /// Create a mono stretcher with an explicit processing block size
    pub fn with_block(
        sample_rate: u32,
        block: usize,
        max_block_size: usize,
    ) -> RepitchResult<Self> {
        if block == 0 {
            return Err(RepitchError::InvalidBlockSize(block));
        }
        let fifo_limit = max_block_size + block;
        Ok(Self {
            stretch: Stretch::preset_default(CHANNELS, sample_rate),
            pitch_scale: 1.0,
            block,
            pending: Vec::with_capacity(block),
            out_block: vec![0.0; block],
            fifo: Vec::with_capacity(fifo_limit),
            fifo_read: 0,
            fifo_limit,
        })
    }

    /// Run one completed input block through the engine and queue the
    /// result
    fn run_block(&mut self) {
        self.out_block.fill(0.0);
        self.stretch.process(&self.pending, &mut self.out_block);
        self.pending.clear();

        // Compact the FIFO before appending so capacity never grows.
        if self.fifo_read > 0 {
            let remaining = self.fifo.len() - self.fifo_read;
            self.fifo.copy_within(self.fifo_read.., 0);
            self.fifo.truncate(remaining);
            self.fifo_read = 0;
        }
        // Past the declared limit the oldest output is discarded; the
        // append below must never reallocate.
        let overflow = (self.fifo.len() + self.block).saturating_sub(self.fifo_limit);
        if overflow > 0 {
            let remaining = self.fifo.len() - overflow;
            self.fifo.copy_within(overflow.., 0);
            self.fifo.truncate(remaining);
        }
        self.fifo.extend_from_slice(&self.out_block);
    }
}

impl Stretcher for SignalsmithStretcher {
    fn set_pitch_scale(&mut self, ratio: f64) {
        if ratio == self.pitch_scale {
            return;
        }
        self.pitch_scale = ratio;
        let semitones = 12.0 * ratio.log2();
        self.stretch
            .set_transpose_factor_semitones(semitones as f32, None);
    }

    fn samples_required(&self) -> usize {
        self.block - self.pending.len()
    }

    fn process(&mut self, input: &[Sample], _final_block: bool) {
        let mut rest = input;
        while !rest.is_empty() {
            let take = (self.block - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() == self.block {
                self.run_block();
            }
        }
    }

    fn available(&self) -> usize {
        self.fifo.len() - self.fifo_read
    }

    fn retrieve(&mut self, dst: &mut [Sample]) -> usize {
        let n = self.available().min(dst.len());
        dst[..n].copy_from_slice(&self.fifo[self.fifo_read..self.fifo_read + n]);
        self.fifo_read += n;
        if self.fifo_read == self.fifo.len() {
            self.fifo.clear();
            self.fifo_read = 0;
        }
        n
    }

    fn latency(&self) -> usize {
        // Engine latency plus the accumulation block in front of it.
        self.stretch.input_latency() + self.stretch.output_latency() + self.block
    }

    fn reset(&mut self) {
        self.stretch.reset();
        self.pending.clear();
        self.fifo.clear();
        self.fifo_read = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_required_tracks_pending() {
        let mut s = SignalsmithStretcher::with_block(48000, 256, 4096).unwrap();
        assert_eq!(s.samples_required(), 256);

        s.process(&[0.0; 100], false);
        assert_eq!(s.samples_required(), 156);
        assert_eq!(s.available(), 0);
    }

    #[test]
    fn test_completed_block_produces_output() {
        let mut s = SignalsmithStretcher::with_block(48000, 256, 4096).unwrap();
        s.process(&[0.1; 256], false);

        assert_eq!(s.samples_required(), 256);
        assert_eq!(s.available(), 256);

        let mut out = [0.0f32; 256];
        assert_eq!(s.retrieve(&mut out), 256);
        assert_eq!(s.available(), 0);
    }

    #[test]
    fn test_multi_block_feed() {
        let mut s = SignalsmithStretcher::with_block(48000, 128, 4096).unwrap();
        // One oversized feed spanning three blocks plus a remainder
        s.process(&[0.1; 400], false);

        assert_eq!(s.available(), 384);
        assert_eq!(s.samples_required(), 112);
    }

    #[test]
    fn test_partial_retrieve_keeps_remainder() {
        let mut s = SignalsmithStretcher::with_block(48000, 128, 4096).unwrap();
        s.process(&[0.1; 128], false);

        let mut out = [0.0f32; 50];
        assert_eq!(s.retrieve(&mut out), 50);
        assert_eq!(s.available(), 78);
    }

    #[test]
    fn test_reset_discards_pending_and_output() {
        let mut s = SignalsmithStretcher::with_block(48000, 128, 4096).unwrap();
        s.process(&[0.1; 200], false);
        s.reset();

        assert_eq!(s.samples_required(), 128);
        assert_eq!(s.available(), 0);
    }

    #[test]
    fn test_zero_block_rejected() {
        assert!(SignalsmithStretcher::with_block(48000, 0, 4096).is_err());
    }

    #[test]
    fn test_latency_includes_block() {
        let s = SignalsmithStretcher::with_block(48000, 512, 4096).unwrap();
        assert!(s.latency() >= 512);
    }

    #[test]
    fn test_full_host_block_backlog_fits() {
        // A 4096-sample host period with a 512 block completes eight
        // input blocks back-to-back before anything is drained; all of
        // that output must queue without growing the FIFO.
        let mut s = SignalsmithStretcher::with_block(48000, 512, 4096).unwrap();
        s.process(&[0.1; 4096], false);

        assert_eq!(s.available(), 4096);
        let mut out = vec![0.0f32; 4096];
        assert_eq!(s.retrieve(&mut out), 4096);
        assert_eq!(s.available(), 0);
    }

    #[test]
    fn test_backlog_past_limit_drops_oldest() {
        // Declared maximum 256 with a 128 block: at most 384 undrained
        // samples. Feeding four blocks without draining discards the
        // oldest block instead of growing the queue.
        let mut s = SignalsmithStretcher::with_block(48000, 128, 256).unwrap();
        s.process(&[0.1; 512], false);

        assert_eq!(s.available(), 384);
    }
}
