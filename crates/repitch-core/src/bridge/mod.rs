//! Rate-adaptive bridge between the host callback and the stretcher
//!
//! The host delivers and demands a fixed number of samples every period;
//! the stretcher consumes input in engine-chosen sub-chunks and produces
//! output in engine-chosen (different) sizes. The bridge reconciles the
//! two inside a single synchronous callback: feed the fixed input in
//! engine-dictated pieces, drain everything the engine has ready, then
//! satisfy the fixed output demand from the ring buffer.
//!
//! Pitch is compensated inversely to the host's playback speed, so audio
//! pitch stays constant under vari-speed transport - which is the entire
//! point of the plugin. Speeds outside the stretcher's reliable operating
//! range degrade to silence rather than asking the engine for an unstable
//! extreme ratio.

use crate::config::{EngineConfig, ShortfallPolicy};
use crate::error::RepitchResult;
use crate::ring::RingBuffer;
use crate::stretch::{SignalsmithStretcher, Stretcher};
use crate::transport::{PositionReport, TransportTracker};
use crate::types::{Sample, MAX_SPEED};

/// Vari-speed pitch compensation engine
///
/// One instance per plugin instance. All state is single-owner and
/// mutated only from the audio callback thread; the host guarantees
/// callbacks are never concurrent for one instance, so no locking is
/// needed. Everything is allocated at construction - the processing path
/// is allocation-free.
///
/// Teardown is `Drop`: releasing the instance releases the stretcher
/// handle and all buffer storage.
pub struct RePitch {
    config: EngineConfig,
    transport: TransportTracker,
    ring: RingBuffer,
    /// Scratch for draining stretcher output, sized to the ring capacity
    scratch: Vec<Sample>,
    stretcher: Box<dyn Stretcher>,
    /// Whether the last callback was inside the speed guard band, so the
    /// transition is logged once instead of every callback
    guard_engaged: bool,
}

impl RePitch {
    /// Create an engine with the production signalsmith stretcher
    pub fn new(config: EngineConfig) -> RepitchResult<Self> {
        let stretcher = SignalsmithStretcher::new(config.sample_rate, config.max_block_size)?;
        Self::new_with_stretcher(config, Box::new(stretcher))
    }

    /// Create an engine around an externally supplied stretcher
    ///
    /// This is the seam the tests use to run the bridge against a
    /// scripted fake with arbitrary chunk sizes.
    pub fn new_with_stretcher(
        config: EngineConfig,
        stretcher: Box<dyn Stretcher>,
    ) -> RepitchResult<Self> {
        let ring = RingBuffer::new(config.ring_capacity)?;
        let scratch = vec![0.0; config.ring_capacity];
        let transport = TransportTracker::new(config.sample_rate);
        log::debug!(
            "repitch engine: {} shortfall policy, ring capacity {}, max block {}",
            config.shortfall_policy.display_name(),
            config.ring_capacity,
            config.max_block_size
        );
        Ok(Self {
            config,
            transport,
            ring,
            scratch,
            stretcher,
            guard_engaged: false,
        })
    }

    /// The configuration this engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Transport state tracker (last known speed and position estimate)
    pub fn transport(&self) -> &TransportTracker {
        &self.transport
    }

    /// Current end-to-end latency in samples: stretcher startup latency
    /// plus whatever backlog sits in the ring buffer
    pub fn latency(&self) -> usize {
        self.stretcher.latency() + self.ring.occupancy()
    }

    /// Reset all buffering state for a new, non-contiguous session
    ///
    /// Must be called before the first [`process_block`](Self::process_block)
    /// after any discontinuity in the input stream (transport relocation,
    /// stream restart), so no stale audio leaks across the gap.
    pub fn activate(&mut self) {
        self.ring.reset();
        self.scratch.fill(0.0);
        self.stretcher.reset();
        self.guard_engaged = false;
    }

    /// Process one fixed-size host block
    ///
    /// `events` is the callback's decoded control-event sequence (possibly
    /// empty); `input` and `output` must be the same length. Always fills
    /// `output` completely - underruns and out-of-range speeds become
    /// silence, never errors.
    pub fn process_block(
        &mut self,
        events: &[PositionReport],
        input: &[Sample],
        output: &mut [Sample],
    ) {
        debug_assert_eq!(input.len(), output.len());
        let n = output.len();
        debug_assert!(
            n <= self.config.max_block_size,
            "host block {} exceeds configured maximum {}",
            n,
            self.config.max_block_size
        );

        self.transport.apply_events(events.iter());
        let speed = self.transport.effective_speed();

        if speed >= MAX_SPEED || speed <= 1.0 / MAX_SPEED {
            if !self.guard_engaged {
                log::info!("speed {speed} outside stretch range, emitting silence");
                self.guard_engaged = true;
            }
            output.fill(0.0);
            self.transport.advance(n);
            return;
        }
        if self.guard_engaged {
            log::info!("speed {speed} back inside stretch range");
            self.guard_engaged = false;
        }

        // Pitch moves inversely to speed so perceived pitch stays put.
        self.stretcher.set_pitch_scale(1.0 / speed);

        self.pump(input);

        match self.config.shortfall_policy {
            ShortfallPolicy::Buffered => {
                self.ring.get(output);
            }
            ShortfallPolicy::Strict => {
                if self.stretcher.available() < n {
                    output.fill(0.0);
                } else {
                    let got = self.stretcher.retrieve(output);
                    debug_assert_eq!(got, n);
                }
            }
        }

        self.transport.advance(n);
    }

    /// Feed the callback's input to the stretcher in engine-dictated
    /// sub-chunks, draining ready output into the ring as it appears
    ///
    /// Bounded: every iteration feeds at least one sample and the total
    /// is capped at the block size.
    fn pump(&mut self, input: &[Sample]) {
        let mut fed = 0;
        while fed < input.len() {
            // A zero demand would stall the loop; force a minimum feed of
            // one sample so progress is always made.
            let want = self.stretcher.samples_required().max(1);
            let chunk = want.min(input.len() - fed);

            self.stretcher.process(&input[fed..fed + chunk], false);
            fed += chunk;

            if self.config.shortfall_policy == ShortfallPolicy::Buffered {
                let avail = self.stretcher.available();
                if avail > 0 {
                    let take = avail.min(self.scratch.len());
                    let got = self.stretcher.retrieve(&mut self.scratch[..take]);
                    self.ring.put(&self.scratch[..got]);
                }
            }
        }
    }
}
