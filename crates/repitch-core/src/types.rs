//! Common types and constants for repitch
//!
//! Fundamental audio types and the fixed sizing constants shared by the
//! ring buffer, the stretcher adapter and the bridge.

/// Audio sample type (32-bit float, mono processing path)
pub type Sample = f32;

/// Default sample rate (48kHz - standard professional audio rate)
/// This is the default; the actual rate is supplied by the host at
/// instantiation time.
pub const SAMPLE_RATE: u32 = 48000;

/// Ring buffer capacity in samples. Must be a power of two so that all
/// cursor arithmetic can wrap via bitmasking.
///
/// 8192 samples is ~170ms at 48kHz, comfortably above the largest output
/// burst a stretcher produces for one callback's worth of input.
pub const RING_CAPACITY: usize = 8192;

/// Speed guard band limit. Playback speeds at or beyond this factor (or
/// at or below its reciprocal) are outside the stretcher's reliable
/// operating range; the bridge degrades to silence instead of asking the
/// engine for an extreme pitch ratio.
pub const MAX_SPEED: f64 = 256.0;

/// Internal processing block of the signalsmith stretcher adapter, in
/// samples. Input is accumulated to this size before each engine pass.
pub const STRETCH_BLOCK: usize = 512;

/// Largest host period the engine is dimensioned for, in samples.
/// Pre-allocated queues are sized from this so the processing path never
/// allocates, whatever block size the host settles on.
pub const MAX_BLOCK_SIZE: usize = 4096;
